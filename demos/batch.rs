use protein_comparator::{CompareOptions, Comparator, EngineConfig};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let comparator = Comparator::new(EngineConfig::new().with_workers(4)?);

    // Globin fragments
    let sequences = [
        "MVLSPADKTNVKAAWGKVGAHAGEYGAEALERMFLSFPTTKTYFPHF",
        "MVHLTPEEKSAVTALWGKVNVDEVGGEALGRLLVVYPWTQRFFESFG",
        "MGLSDGEWQLVLNVWGKVEADIPGHGQEVLIRLFKGHPETLEKFDKF",
        "MVLSGEDKSNIKAAWGKIGGHGAEYGAEALERMFASFPTTKTYFPHF",
    ];
    let options = CompareOptions::new("blosum62", -11, -1, "global");

    for pair in comparator.compare_all(&sequences, &options) {
        match pair.result {
            Ok(report) => println!(
                "{} vs {}: score {}, identity {:.2}%, gaps {:.2}%",
                pair.first, pair.second, report.score, report.percent_identity, report.percent_gaps
            ),
            Err(e) => println!("{} vs {}: {}", pair.first, pair.second, e),
        }
    }

    Ok(())
}
