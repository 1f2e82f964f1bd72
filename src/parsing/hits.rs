//! Parser for BLAST tabular output (`-outfmt 6`).
//!
//! Columns: `qseqid sseqid pident length mismatch gapopen qstart qend sstart send
//! evalue bitscore`, optionally followed by `stitle`, which becomes the hit
//! description. The bit score is used as the hit score.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::parsing::{open_text, ParseError};

const QUERY_COLUMN: usize = 0;
const HIT_COLUMN: usize = 1;
const IDENTITY_COLUMN: usize = 2;
const LENGTH_COLUMN: usize = 3;
const SCORE_COLUMN: usize = 11;
const TITLE_COLUMN: usize = 12;

/// One search hit of a query sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub query_id: String,
    pub hit_id: String,
    pub percent_identity: f64,
    pub alignment_length: u32,
    pub score: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SearchHit {
    /// Text used when the hit becomes an annotation
    #[must_use]
    pub fn annotation_text(&self) -> &str {
        self.description.as_deref().unwrap_or(&self.hit_id)
    }
}

/// Hits grouped by query, in file order
#[derive(Debug, Clone, Default)]
pub struct HitTable {
    by_query: HashMap<String, Vec<SearchHit>>,
}

impl HitTable {
    /// Hits for a query, or `None` if the query was never searched
    #[must_use]
    pub fn get(&self, query_id: &str) -> Option<&[SearchHit]> {
        self.by_query.get(query_id).map(Vec::as_slice)
    }

    /// Number of distinct queries
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_query.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_query.is_empty()
    }

    pub fn push(&mut self, hit: SearchHit) {
        self.by_query
            .entry(hit.query_id.clone())
            .or_default()
            .push(hit);
    }
}

/// Parse a BLAST tabular file (optionally gzipped)
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or
/// `ParseError::InvalidFormat` if a line is malformed.
pub fn parse_hits_file(path: &Path) -> Result<HitTable, ParseError> {
    parse_hits_reader(open_text(path)?)
}

/// Parse BLAST tabular text
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if a line is malformed.
pub fn parse_hits_text(text: &str) -> Result<HitTable, ParseError> {
    parse_hits_reader(text.as_bytes())
}

fn parse_hits_reader<R: BufRead>(reader: R) -> Result<HitTable, ParseError> {
    let mut table = HitTable::default();

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }
        table.push(parse_hit_line(&line, i + 1)?);
    }

    Ok(table)
}

fn parse_hit_line(line: &str, line_num: usize) -> Result<SearchHit, ParseError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() <= SCORE_COLUMN {
        return Err(ParseError::InvalidFormat(format!(
            "Line {line_num} has {} fields, expected at least {}",
            fields.len(),
            SCORE_COLUMN + 1
        )));
    }

    let percent_identity: f64 = parse_field(&fields, IDENTITY_COLUMN, line_num)?;
    let alignment_length: u32 = parse_field(&fields, LENGTH_COLUMN, line_num)?;
    let score: f64 = parse_field(&fields, SCORE_COLUMN, line_num)?;
    let description = fields
        .get(TITLE_COLUMN)
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string);

    Ok(SearchHit {
        query_id: fields[QUERY_COLUMN].trim().to_string(),
        hit_id: fields[HIT_COLUMN].trim().to_string(),
        percent_identity,
        alignment_length,
        score,
        description,
    })
}

fn parse_field<T: std::str::FromStr>(
    fields: &[&str],
    column: usize,
    line_num: usize,
) -> Result<T, ParseError> {
    fields[column].trim().parse().map_err(|_| {
        ParseError::InvalidFormat(format!(
            "Invalid value on line {line_num}, column {}: '{}'",
            column + 1,
            fields[column]
        ))
    })
}
