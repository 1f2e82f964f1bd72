use std::collections::HashMap;
use std::path::PathBuf;

use clap::Args;

use crate::classification::StrainMembership;
use crate::cli::{open_store, OutputFormat};
use crate::core::{Cluster, ClusterId, StrainId};
use crate::store::PangenomeStore;

/// Which clusters to list
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ClusterClass {
    /// Clusters present in every strain
    Core,
    /// Clusters present only in the given strains
    Unique,
    /// Clusters shared by some of the given strains and some other strain
    PartiallyShared,
}

#[derive(Args)]
pub struct SearchArgs {
    /// Pangenome database
    #[arg(long, required = true)]
    pub db: PathBuf,

    /// Cluster class to list
    #[arg(long, value_enum)]
    pub class: ClusterClass,

    /// Strain names (repeat the option or separate with commas)
    #[arg(long = "strain", value_delimiter = ',')]
    pub strains: Vec<String>,
}

struct ClusterRow {
    cluster: Cluster,
    strains: Vec<String>,
}

/// Execute search subcommand
///
/// # Errors
///
/// Returns an error if a strain is unknown or no strains are given for a class
/// that needs them.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: SearchArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let store = open_store(&args.db)?;
    let membership = StrainMembership::load(&store)?;
    if verbose {
        eprintln!(
            "Classifying {} leaf clusters over {} strains",
            membership.cluster_count(),
            membership.strains().len()
        );
    }

    let clusters = match args.class {
        ClusterClass::Core => membership.core_clusters(),
        ClusterClass::Unique => membership.unique_clusters(args.strains.as_slice())?,
        ClusterClass::PartiallyShared => {
            membership.partially_shared_clusters(args.strains.as_slice())?
        }
    };
    let rows = cluster_rows(&store, &membership, &clusters)?;

    match format {
        OutputFormat::Text => {
            println!("Found {} {:?} clusters", rows.len(), args.class);
            for row in &rows {
                println!(
                    "  Cluster {:>6}  cutoff {:>3}  {} genes  {}",
                    row.cluster.id,
                    row.cluster.cutoff,
                    row.cluster.number_of_members,
                    row.strains.join(", ")
                );
            }
        }
        OutputFormat::Json => {
            let output: Vec<serde_json::Value> = rows
                .iter()
                .map(|row| {
                    serde_json::json!({
                        "cluster_id": row.cluster.id,
                        "cutoff": row.cluster.cutoff,
                        "is_parent_cluster": row.cluster.is_parent_cluster(),
                        "number_of_members": row.cluster.number_of_members,
                        "number_of_strains": row.cluster.number_of_strains,
                        "strains": row.strains,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!(
                "cluster_id\tcutoff\tis_parent_cluster\tnumber_of_members\t\
                 number_of_strains\tstrains"
            );
            for row in &rows {
                println!("{}", format_row(row));
            }
        }
    }
    Ok(())
}

fn cluster_rows(
    store: &PangenomeStore,
    membership: &StrainMembership,
    clusters: &[ClusterId],
) -> anyhow::Result<Vec<ClusterRow>> {
    let names: HashMap<StrainId, &str> = membership
        .strains()
        .iter()
        .map(|strain| (strain.id, strain.name.as_str()))
        .collect();

    let mut rows = Vec::with_capacity(clusters.len());
    for &id in clusters {
        let cluster = store
            .cluster(id)?
            .ok_or_else(|| anyhow::anyhow!("Cluster {id} disappeared from the database"))?;
        let strains = membership
            .strain_set(id)
            .into_iter()
            .flatten()
            .filter_map(|strain| names.get(strain).map(ToString::to_string))
            .collect();
        rows.push(ClusterRow { cluster, strains });
    }
    Ok(rows)
}

/// `id  cutoff  is_parent  members  strains  strain names...`, tab-separated
fn format_row(row: &ClusterRow) -> String {
    let mut fields = vec![
        row.cluster.id.to_string(),
        row.cluster.cutoff.to_string(),
        row.cluster.is_parent_cluster().to_string(),
        row.cluster.number_of_members.to_string(),
        row.cluster.number_of_strains.to_string(),
    ];
    fields.extend(row.strains.iter().cloned());
    fields.join("\t")
}
