use std::path::PathBuf;

use clap::Args;

use crate::cli::{open_store, OutputFormat};
use crate::clustering::build_super_clusters;
use crate::core::ClusterKind;
use crate::parsing::clstr::parse_clstr_file;

#[derive(Args)]
pub struct SuperClusterArgs {
    /// Pangenome database
    #[arg(long, required = true)]
    pub db: PathBuf,

    /// Cluster file of the leaf representatives at the super-cluster cutoff
    #[arg(long, required = true)]
    pub clstr: PathBuf,

    /// Super-cluster cutoff, lower than the leaf cutoff
    #[arg(long, default_value = "65")]
    pub cutoff: u8,
}

/// Execute super-cluster subcommand
///
/// # Errors
///
/// Returns an error if the cluster file is malformed or names unknown leaves, or the
/// cutoff is not lower than the leaf cutoff.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: SuperClusterArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let records = parse_clstr_file(&args.clstr)?;
    if verbose {
        eprintln!("Read {} groups from {}", records.len(), args.clstr.display());
    }

    let mut store = open_store(&args.db)?;
    let parents = build_super_clusters(&mut store, args.cutoff, &records)?;
    let leaves = store.cluster_count(Some(ClusterKind::Leaf))?;

    match format {
        OutputFormat::Text => {
            println!(
                "Built {} super-clusters at cutoff {} over {leaves} leaf clusters",
                parents.len(),
                args.cutoff
            );
        }
        OutputFormat::Json => {
            let output = serde_json::json!({
                "cutoff": args.cutoff,
                "super_clusters": parents.len(),
                "leaf_clusters": leaves,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("cluster_id\tnumber_of_members\tnumber_of_strains");
            for id in parents {
                if let Some(cluster) = store.cluster(id)? {
                    println!(
                        "{}\t{}\t{}",
                        cluster.id, cluster.number_of_members, cluster.number_of_strains
                    );
                }
            }
        }
    }
    Ok(())
}
