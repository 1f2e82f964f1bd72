//! Building the cluster hierarchy.
//!
//! The pipeline runs in three steps, each reading the textual output of the external
//! clustering tool:
//!
//! 1. [`build_hierarchy`]: one `.clstr` file per cutoff, tightest first, produces the
//!    leaf clusters at the loosest cutoff
//! 2. [`assign_representatives`]: optional, records representatives from a
//!    representative FASTA when the hierarchy was built without them
//! 3. [`build_super_clusters`]: the leaf representatives re-clustered at a looser
//!    cutoff produce parent clusters
//!
//! ## Example
//!
//! ```rust
//! use pancluster::clustering::{build_hierarchy, ClusterLevel};
//! use pancluster::core::NewGene;
//! use pancluster::parsing::clstr::parse_clstr_text;
//! use pancluster::store::PangenomeStore;
//!
//! let mut store = PangenomeStore::open_in_memory().unwrap();
//! let strain = store.add_strain("strain1").unwrap();
//! store.add_genes(strain, &[NewGene::new("g1", "MKV"), NewGene::new("g2", "MKI")]).unwrap();
//!
//! let records = parse_clstr_text(
//!     ">Cluster 0\n0\t3aa, >g1... *\n1\t3aa, >g2... at 90.00%\n",
//! ).unwrap();
//! let leaves = build_hierarchy(&mut store, &[ClusterLevel::new(90, records)]).unwrap();
//! assert_eq!(leaves.len(), 1);
//! ```

pub mod hierarchy;
pub mod representative;
pub mod super_cluster;

pub use hierarchy::{build_hierarchy, ClusterLevel, Hierarchy};
pub use representative::{assign_representatives, RepresentativeAssignment, RepresentativeResolver};
pub use super_cluster::build_super_clusters;
