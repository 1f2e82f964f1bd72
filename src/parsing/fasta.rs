//! Parser for FASTA files using noodles.
//!
//! Reads gene sequences (one file per strain) and representative sequence files
//! written by the clustering step. Supports plain and gzip compressed files.

use std::io::BufRead;
use std::path::Path;

use noodles::fasta;

use crate::core::gene::NewGene;
use crate::parsing::{open_text, ParseError};

/// Read every record of a FASTA file as a gene
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, `ParseError::Noodles` if
/// parsing fails, or `ParseError::InvalidFormat` if no sequences are found.
pub fn parse_fasta_file(path: &Path) -> Result<Vec<NewGene>, ParseError> {
    let mut reader = fasta::io::Reader::new(open_text(path)?);
    parse_fasta_reader(&mut reader)
}

/// Read every record of FASTA text as a gene
///
/// # Errors
///
/// Returns `ParseError::Noodles` if parsing fails, or `ParseError::InvalidFormat`
/// if no sequences are found.
pub fn parse_fasta_text(text: &str) -> Result<Vec<NewGene>, ParseError> {
    let mut reader = fasta::io::Reader::new(text.as_bytes());
    parse_fasta_reader(&mut reader)
}

fn parse_fasta_reader<R: BufRead>(
    reader: &mut fasta::io::Reader<R>,
) -> Result<Vec<NewGene>, ParseError> {
    let mut genes = Vec::new();

    for result in reader.records() {
        let record = result
            .map_err(|e| ParseError::Noodles(format!("Failed to parse FASTA record: {e}")))?;

        let name = String::from_utf8_lossy(record.name()).to_string();
        let sequence = String::from_utf8_lossy(record.sequence().as_ref()).to_string();
        let mut gene = NewGene::new(name, sequence);
        if let Some(description) = record.description() {
            let description = String::from_utf8_lossy(description).trim().to_string();
            if !description.is_empty() {
                gene = gene.with_description(description);
            }
        }
        genes.push(gene);
    }

    if genes.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No sequences found in FASTA file".to_string(),
        ));
    }

    Ok(genes)
}
