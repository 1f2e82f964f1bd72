//! Reciprocal best hit annotation of cluster representatives.
//!
//! Each leaf cluster representative is searched against up to three sources, in
//! precedence order:
//!
//! | Tier        | Source                         | Default cutoffs (identity / length) |
//! |-------------|--------------------------------|-------------------------------------|
//! | `reference` | annotated reference genomes    | 90% / 85                            |
//! | `local_db`  | a local sequence database      | 80% / 80                            |
//! | `remote_db` | a remote sequence database     | 80% / 80                            |
//!
//! A forward hit is admissible when it meets the tier's identity and length cutoffs.
//! It becomes an annotation only if the reverse search of the hit comes back to the
//! representative, as decided by the [`ReciprocalPolicy`].
//!
//! Searches go through the [`SearchBackend`] trait. [`TabularSearchBackend`] serves
//! pre-computed BLAST tabular results.

pub mod config;
pub mod resolver;
pub mod search;

pub use config::{AnnotationConfig, ReciprocalPolicy, TierSettings};
pub use resolver::{annotate_clusters, AnnotationLookupError, AnnotationReport};
pub use search::{SearchBackend, SearchError, TabularSearchBackend};
