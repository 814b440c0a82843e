use protein_comparator::{
    align,
    summarize,
    AlignmentMode,
    ScoringPolicy,
    Sequence,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let seq1 = Sequence::parse("PPPPHEAGAWGHEEPPPP")?;
    let seq2 = Sequence::parse("GGGHEAGAWGHEGGG")?;

    for mode in [AlignmentMode::Global, AlignmentMode::Local] {
        let policy = ScoringPolicy::build("blosum62", -11, -1, mode.as_str())?;
        let alignment = align(&seq1, &seq2, &policy)?;
        let report = summarize(&alignment);

        println!("{report}");
        println!("Operations: {:?}", alignment.operations());
        println!();
    }

    Ok(())
}
