//! Parsers for the text output of external collaborators.
//!
//! This module provides parsers for:
//!
//! - **cd-hit `.clstr` files**: cluster membership for one cutoff level
//! - **FASTA files**: gene sequences per strain, and representative sequences
//! - **BLAST tabular hits**: `-outfmt 6` records, optionally with a trailing `stitle`
//! - **Sequence file lists**: tab-separated `<file>\t<strain name>` lines
//!
//! Every file reader accepts gzip-compressed input when the path ends in `.gz`.
//!
//! ## Example
//!
//! ```rust
//! use pancluster::parsing::clstr::parse_clstr_text;
//!
//! let text = ">Cluster 0\n0\t350aa, >strain1_00001... *\n1\t348aa, >strain2_00001... at 99.43%\n";
//! let records = parse_clstr_text(text).unwrap();
//! assert_eq!(records[0].representative, "strain1_00001");
//! assert_eq!(records[0].members.len(), 2);
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::GzDecoder;
use thiserror::Error;

use crate::utils::validation::is_gzipped;

pub mod clstr;
pub mod fasta;
pub mod file_list;
pub mod hits;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("noodles error: {0}")]
    Noodles(String),
}

/// Open a text file, decompressing it on the fly when it is gzipped
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be opened.
pub fn open_text(path: &Path) -> Result<Box<dyn BufRead>, ParseError> {
    let file = File::open(path)?;
    if is_gzipped(path) {
        Ok(Box::new(BufReader::new(GzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}
