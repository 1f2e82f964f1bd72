use std::path::{Path, PathBuf};

use clap::Args;

use crate::cli::{open_store, OutputFormat};
use crate::clustering::{build_hierarchy, ClusterLevel};
use crate::utils::validation::{parse_cutoff_list, validate_cutoff_sequence};

#[derive(Args)]
pub struct ClusterArgs {
    /// Pangenome database
    #[arg(long, required = true)]
    pub db: PathBuf,

    /// Directory holding one cluster file per cutoff
    #[arg(long, required = true)]
    pub clstr_dir: PathBuf,

    /// Cutoffs from tightest to loosest, separated by '-' or ','
    #[arg(long, default_value = "99-98-95-90-85")]
    pub cutoffs: String,

    /// Cluster files are named <PREFIX>-<CUTOFF>.clstr, optionally gzipped
    #[arg(long, default_value = "cdhit_clusters")]
    pub prefix: String,
}

/// Cluster file of one cutoff, preferring the uncompressed file
#[must_use]
pub fn cluster_file(dir: &Path, prefix: &str, cutoff: u8) -> Option<PathBuf> {
    let plain = dir.join(format!("{prefix}-{cutoff}.clstr"));
    let gzipped = dir.join(format!("{prefix}-{cutoff}.clstr.gz"));
    [plain, gzipped].into_iter().find(|path| path.is_file())
}

/// Execute cluster subcommand
///
/// # Errors
///
/// Returns an error if the cutoffs are invalid, a cluster file is missing or
/// malformed, or the hierarchy cannot be built.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: ClusterArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let cutoffs = parse_cutoff_list(&args.cutoffs).map_err(anyhow::Error::msg)?;
    validate_cutoff_sequence(&cutoffs)?;

    // All files are read before the database is opened
    let mut levels = Vec::with_capacity(cutoffs.len());
    for &cutoff in &cutoffs {
        let Some(path) = cluster_file(&args.clstr_dir, &args.prefix, cutoff) else {
            anyhow::bail!(
                "No cluster file for cutoff {cutoff} in {} (expected {}-{cutoff}.clstr)",
                args.clstr_dir.display(),
                args.prefix
            );
        };
        let level = ClusterLevel::from_file(cutoff, &path)?;
        if verbose {
            eprintln!("Read {} clusters from {}", level.records.len(), path.display());
        }
        levels.push(level);
    }

    let mut store = open_store(&args.db)?;
    let leaves = build_hierarchy(&mut store, &levels)?;
    let final_cutoff = cutoffs.last().copied().unwrap_or_default();
    let genes = store.gene_count()?;

    match format {
        OutputFormat::Text => {
            println!(
                "Built {} leaf clusters at cutoff {final_cutoff} from {genes} genes",
                leaves.len()
            );
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "cutoffs": cutoffs,
                "leaf_clusters": leaves.len(),
                "genes": genes,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("cutoff\tclusters");
            for level in &levels {
                println!("{}\t{}", level.cutoff, level.records.len());
            }
        }
    }

    Ok(())
}
