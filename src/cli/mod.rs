//! Command-line interface for pancluster.
//!
//! This module implements the CLI using clap. Commands follow the order of the
//! pipeline:
//!
//! - **ingest**: Load strain gene sets from FASTA files
//! - **cluster**: Build the cluster hierarchy from per-cutoff `.clstr` files
//! - **representatives**: Record leaf representatives from a representative FASTA
//! - **super-cluster**: Group leaf clusters at a looser cutoff
//! - **search**: List core, unique or partially shared clusters
//! - **annotate**: Annotate cluster representatives by reciprocal best hits
//! - **output**: Write the presence/absence matrix or representative sequences
//!
//! ## Usage
//!
//! ```text
//! # Load two strains
//! pancluster ingest --db pan.sqlite --file-list strains.tsv
//!
//! # Build the hierarchy from cdhit_clusters-99.clstr ... cdhit_clusters-85.clstr
//! pancluster cluster --db pan.sqlite --clstr-dir clusters --cutoffs 99-98-95-90-85
//!
//! # Super-clusters at 65%
//! pancluster output representatives --db pan.sqlite -o leaf_reps.fasta
//! pancluster super-cluster --db pan.sqlite --clstr leaf_reps-65.clstr --cutoff 65
//!
//! # Clusters found only in strain1
//! pancluster search --db pan.sqlite --class unique --strain strain1 --format tsv
//!
//! # Presence/absence of non-core clusters
//! pancluster output presence-absence --db pan.sqlite --without-core-genes -o matrix.txt
//! ```

use std::path::Path;

use clap::{Parser, Subcommand};

use crate::store::PangenomeStore;

pub mod annotate;
pub mod cluster;
pub mod ingest;
pub mod output;
pub mod representatives;
pub mod search;
pub mod super_cluster;

#[derive(Parser)]
#[command(name = "pancluster")]
#[command(author = "Fulcrum Genomics")]
#[command(version)]
#[command(about = "Build, classify and annotate pan-genome gene clusters")]
#[command(
    long_about = "pancluster builds a pan-genome model across bacterial strains.\n\n\
        It reads the output of an external sequence clustering tool and provides:\n\
        - A cluster hierarchy over successively looser cutoffs, and super-clusters\n\
        - Core, unique and partially shared cluster sets\n\
        - Reciprocal best hit annotation of cluster representatives\n\
        - Gene presence/absence matrices"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load the genes of one or more strains
    Ingest(ingest::IngestArgs),

    /// Build the cluster hierarchy
    Cluster(cluster::ClusterArgs),

    /// Record leaf cluster representatives from a FASTA file
    Representatives(representatives::RepresentativesArgs),

    /// Group leaf clusters into super-clusters
    SuperCluster(super_cluster::SuperClusterArgs),

    /// Find core, unique or partially shared clusters
    Search(search::SearchArgs),

    /// Annotate cluster representatives
    Annotate(annotate::AnnotateArgs),

    /// Write reports
    Output(output::OutputArgs),
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
}

/// Open an existing database.
///
/// # Errors
///
/// Returns an error if the file does not exist or is not a pancluster database.
pub fn open_store(path: &Path) -> anyhow::Result<PangenomeStore> {
    if !path.exists() {
        anyhow::bail!("Database not found: {}", path.display());
    }
    Ok(PangenomeStore::open(path)?)
}
