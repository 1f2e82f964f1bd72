use std::path::PathBuf;

use clap::Args;

use crate::cli::{open_store, OutputFormat};
use crate::clustering::assign_representatives;
use crate::parsing::fasta::parse_fasta_file;

#[derive(Args)]
pub struct RepresentativesArgs {
    /// Pangenome database
    #[arg(long, required = true)]
    pub db: PathBuf,

    /// Representative sequences written by the clustering tool for the final cutoff
    #[arg(long, required = true)]
    pub fasta: PathBuf,
}

/// Execute representatives subcommand
///
/// # Errors
///
/// Returns an error if the FASTA cannot be read, a sequence matches no gene, or a
/// cluster already has a different representative.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: RepresentativesArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let records = parse_fasta_file(&args.fasta)?;
    if verbose {
        eprintln!("Read {} representative sequences", records.len());
    }

    let mut store = open_store(&args.db)?;
    let summary = assign_representatives(&mut store, &records)?;

    match format {
        OutputFormat::Text => {
            println!(
                "Assigned {} representatives, {} already present",
                summary.assigned, summary.unchanged
            );
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "assigned": summary.assigned,
                "unchanged": summary.unchanged,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("assigned\tunchanged");
            println!("{}\t{}", summary.assigned, summary.unchanged);
        }
    }
    Ok(())
}
