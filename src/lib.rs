//! # pancluster
//!
//! A library for building and querying pan-genome gene clusters across bacterial
//! strains.
//!
//! Homologous genes are grouped by an external sequence clustering tool at a series
//! of successively looser identity cutoffs. `pancluster` turns that output into a
//! cluster hierarchy stored in SQLite, groups distant clusters into super-clusters,
//! classifies clusters by the strains they occur in, and annotates cluster
//! representatives by reciprocal best hits.
//!
//! ## Features
//!
//! - **Hierarchy building**: Merges per-cutoff cluster files into leaf clusters
//! - **Super-clusters**: Groups leaf clusters at a looser cutoff
//! - **Classification**: Core, unique and partially shared clusters
//! - **Annotation**: Reciprocal best hits against three tiers of sources
//! - **Reports**: Gene presence/absence matrices and representative FASTA
//!
//! ## Example
//!
//! ```rust
//! use pancluster::classification::core_clusters;
//! use pancluster::clustering::{build_hierarchy, ClusterLevel};
//! use pancluster::core::NewGene;
//! use pancluster::output::write_presence_absence;
//! use pancluster::parsing::clstr::parse_clstr_text;
//! use pancluster::store::PangenomeStore;
//!
//! let mut store = PangenomeStore::open_in_memory().unwrap();
//! let strain1 = store.add_strain("strain1").unwrap();
//! let strain2 = store.add_strain("strain2").unwrap();
//! store.add_genes(strain1, &[NewGene::new("s1_1", "MKVLA")]).unwrap();
//! store.add_genes(strain2, &[NewGene::new("s2_1", "MKVLT")]).unwrap();
//!
//! let records = parse_clstr_text(
//!     ">Cluster 0\n0\t5aa, >s1_1... *\n1\t5aa, >s2_1... at 80.00%\n",
//! ).unwrap();
//! build_hierarchy(&mut store, &[ClusterLevel::new(80, records)]).unwrap();
//! assert_eq!(core_clusters(&store).unwrap().len(), 1);
//!
//! let mut matrix = Vec::new();
//! write_presence_absence(&store, &mut matrix, false).unwrap();
//! assert_eq!(
//!     String::from_utf8(matrix).unwrap(),
//!     "cluster\tstrain1\tstrain2\n1: hypothetical protein\t1\t1\n",
//! );
//! ```
//!
//! ## Modules
//!
//! - [`core`]: Core data types for strains, genes, clusters and annotations
//! - [`store`]: The SQLite store shared by all stages
//! - [`parsing`]: Parsers for cluster files, FASTA, hit tables and file lists
//! - [`clustering`]: Hierarchy, representative and super-cluster building
//! - [`classification`]: Core / unique / partially shared clusters
//! - [`annotation`]: Reciprocal best hit annotation
//! - [`output`]: Presence/absence matrix and representative FASTA
//! - [`cli`]: Command-line interface implementation

pub mod annotation;
pub mod classification;
pub mod cli;
pub mod clustering;
pub mod core;
pub mod error;
pub mod output;
pub mod parsing;
pub mod store;
pub mod utils;

// Re-export commonly used types for convenience
pub use crate::core::types::*;
pub use crate::core::{Annotation, Cluster, Gene, NewGene, Strain};
pub use crate::error::PangenomeError;
pub use crate::store::PangenomeStore;
