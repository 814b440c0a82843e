use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use protein_comparator::{CompareOptions, Comparator, EngineConfig, Sequence, DEFAULT_MAX_CELLS};

#[derive(Debug, Parser)]
#[command(
    name = "protcmp",
    version = env!("CARGO_PKG_VERSION"),
    about = "Compare two protein sequences"
)]
struct Cli {
    /// First sequence (one-letter amino-acid codes)
    seq_a: String,
    /// Second sequence
    seq_b: String,
    /// identity, blosum62, blosum45, blosum80 or pam250
    #[arg(long, default_value = "blosum62")]
    matrix: String,
    #[arg(long, default_value_t = -11, allow_negative_numbers = true)]
    gap_open: i32,
    #[arg(long, default_value_t = -1, allow_negative_numbers = true)]
    gap_extend: i32,
    /// global or local
    #[arg(long, default_value = "global")]
    mode: String,
    /// Upper bound on the product of the two sequence lengths
    #[arg(long, default_value_t = DEFAULT_MAX_CELLS)]
    max_cells: usize,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = EngineConfig::new()
        .with_max_cells(cli.max_cells)
        .context("invalid --max-cells")?;
    let options = CompareOptions::new(&cli.matrix, cli.gap_open, cli.gap_extend, &cli.mode);
    info!(
        "comparing with {} (open {}, extend {}, {})",
        options.matrix, options.gap_open, options.gap_extend, options.mode
    );

    let seq_a = Sequence::parse(&cli.seq_a).context("invalid sequence A")?;
    let seq_b = Sequence::parse(&cli.seq_b).context("invalid sequence B")?;
    let report = Comparator::new(config).compare_sequences(&seq_a, &seq_b, &options)?;

    for (label, seq) in [("A", &seq_a), ("B", &seq_b)] {
        println!("{label}: {} residues ({})", seq.len(), composition(seq));
    }
    println!();
    println!("{report}");
    Ok(())
}

fn composition(seq: &Sequence) -> String {
    seq.composition()
        .into_iter()
        .map(|(residue, count)| format!("{residue}{count}"))
        .collect::<Vec<_>>()
        .join(" ")
}
