//! Core data types for the pan-genome model.
//!
//! - [`Strain`] and [`Gene`]: ingested once, never deleted
//! - [`Cluster`]: a leaf cluster owning genes, or a parent (super-)cluster owning leaves
//! - [`Annotation`]: an accepted reciprocal best hit for a cluster representative
//! - [`StrainId`], [`GeneId`], [`ClusterId`], [`ClusterKind`], [`AnnotationTier`]
//!
//! ## Cluster kinds
//!
//! | Kind   | Owns        | `number_of_members` |
//! |--------|-------------|---------------------|
//! | Leaf   | genes       | member genes        |
//! | Parent | leaf clusters | child clusters    |
//!
//! The genes of a parent are always derived from its children, never stored twice.

pub mod annotation;
pub mod cluster;
pub mod gene;
pub mod types;

pub use annotation::Annotation;
pub use cluster::Cluster;
pub use gene::{Gene, NewGene, Strain};
pub use types::{AnnotationTier, ClusterId, ClusterKind, GeneId, StrainId};
