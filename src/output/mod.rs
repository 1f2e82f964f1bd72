//! Reports written from the store.
//!
//! - [`matrix`]: gene presence/absence per leaf cluster and strain
//! - [`fasta`]: representative sequences, the input of super-clustering and searches

pub mod fasta;
pub mod matrix;

pub use fasta::{write_representatives, write_representatives_file};
pub use matrix::{write_presence_absence, write_presence_absence_file};
