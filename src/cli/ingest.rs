use std::path::{Path, PathBuf};

use clap::Args;

use crate::cli::OutputFormat;
use crate::parsing::fasta::parse_fasta_file;
use crate::parsing::file_list::{parse_file_list, SequenceFileEntry};
use crate::store::PangenomeStore;

#[derive(Args)]
pub struct IngestArgs {
    /// Pangenome database, created if it does not exist
    #[arg(long, required = true)]
    pub db: PathBuf,

    /// Strain name of the genes in --fasta
    #[arg(long, requires = "fasta", conflicts_with = "file_list")]
    pub strain: Option<String>,

    /// Gene FASTA file of one strain (plain or gzipped)
    #[arg(long, requires = "strain")]
    pub fasta: Option<PathBuf>,

    /// Tab-separated list of gene FASTA files and their strain names
    #[arg(long)]
    pub file_list: Option<PathBuf>,
}

struct IngestedStrain {
    name: String,
    genes: usize,
    path: PathBuf,
}

/// Execute ingest subcommand
///
/// # Errors
///
/// Returns an error if an input cannot be read or a strain or gene already exists.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: IngestArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let entries = input_entries(&args)?;

    // All files are read before the database is opened
    let mut inputs = Vec::with_capacity(entries.len());
    for entry in entries {
        let genes = parse_fasta_file(&entry.path)?;
        if verbose {
            eprintln!("Read {} genes from {}", genes.len(), entry.path.display());
        }
        inputs.push((entry, genes));
    }

    let mut store = PangenomeStore::open_or_create(&args.db)?;
    let mut ingested = Vec::with_capacity(inputs.len());
    for (entry, genes) in inputs {
        store.add_strain_with_genes(&entry.strain_name, &genes)?;
        ingested.push(IngestedStrain {
            name: entry.strain_name,
            genes: genes.len(),
            path: entry.path,
        });
    }

    print_ingested(&ingested, format)
}

fn input_entries(args: &IngestArgs) -> anyhow::Result<Vec<SequenceFileEntry>> {
    match (&args.strain, &args.fasta, &args.file_list) {
        (Some(strain), Some(fasta), None) => Ok(vec![SequenceFileEntry {
            path: fasta.clone(),
            strain_name: strain.clone(),
        }]),
        (None, None, Some(list)) => {
            let base_dir = list.parent().unwrap_or_else(|| Path::new("."));
            Ok(parse_file_list(list, base_dir)?)
        }
        _ => anyhow::bail!("Give either --strain with --fasta, or --file-list"),
    }
}

fn print_ingested(ingested: &[IngestedStrain], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => {
            for strain in ingested {
                println!(
                    "Ingested {} genes for strain {} from {}",
                    strain.genes,
                    strain.name,
                    strain.path.display()
                );
            }
        }
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = ingested
                .iter()
                .map(|strain| {
                    serde_json::json!({
                        "strain": strain.name,
                        "genes": strain.genes,
                        "file": strain.path.display().to_string(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("strain\tgenes\tfile");
            for strain in ingested {
                println!("{}\t{}\t{}", strain.name, strain.genes, strain.path.display());
            }
        }
    }
    Ok(())
}
