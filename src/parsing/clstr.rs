//! Parser for cd-hit `.clstr` cluster files.
//!
//! ```text
//! >Cluster 0
//! 0	350aa, >strain1_00001... *
//! 1	348aa, >strain2_00001... at 99.43%
//! >Cluster 1
//! 0	120aa, >strain1_00002... *
//! ```
//!
//! The representative of each cluster is the line ending in `*`.

use std::io::BufRead;
use std::path::Path;

use crate::parsing::{open_text, ParseError};

/// Membership of one cluster at one cutoff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterRecord {
    /// Member sequence identifiers in file order
    pub members: Vec<String>,

    /// Identifier of the member flagged as representative
    pub representative: String,
}

/// Parse a `.clstr` file (optionally gzipped)
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or
/// `ParseError::InvalidFormat` if the content is not a valid cluster file.
pub fn parse_clstr_file(path: &Path) -> Result<Vec<ClusterRecord>, ParseError> {
    let reader = open_text(path)?;
    parse_clstr_reader(reader)
}

/// Parse `.clstr` text
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if the content is not a valid cluster file.
pub fn parse_clstr_text(text: &str) -> Result<Vec<ClusterRecord>, ParseError> {
    parse_clstr_reader(text.as_bytes())
}

/// Cluster being accumulated while reading
struct PendingCluster {
    name: String,
    members: Vec<String>,
    representative: Option<String>,
}

impl PendingCluster {
    fn finish(self) -> Result<ClusterRecord, ParseError> {
        if self.members.is_empty() {
            return Err(ParseError::InvalidFormat(format!(
                "{} has no members",
                self.name
            )));
        }
        let representative = self.representative.ok_or_else(|| {
            ParseError::InvalidFormat(format!("{} has no representative", self.name))
        })?;
        Ok(ClusterRecord {
            members: self.members,
            representative,
        })
    }
}

/// Parse `.clstr` records from any buffered reader
///
/// # Errors
///
/// Returns `ParseError::Io` on read failure, or `ParseError::InvalidFormat` for member
/// lines outside a cluster, malformed member lines, and clusters without exactly one
/// representative.
pub fn parse_clstr_reader<R: BufRead>(reader: R) -> Result<Vec<ClusterRecord>, ParseError> {
    let mut records = Vec::new();
    let mut pending: Option<PendingCluster> = None;

    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end();
        if line.trim().is_empty() {
            continue;
        }

        // Line numbers in errors are 1-based for user friendliness
        let line_num = i + 1;

        if let Some(name) = line.strip_prefix('>') {
            if let Some(cluster) = pending.take() {
                records.push(cluster.finish()?);
            }
            pending = Some(PendingCluster {
                name: name.trim().to_string(),
                members: Vec::new(),
                representative: None,
            });
            continue;
        }

        let cluster = pending.as_mut().ok_or_else(|| {
            ParseError::InvalidFormat(format!(
                "Line {line_num} appears before any cluster header"
            ))
        })?;
        let (identifier, is_representative) = parse_member_line(line, line_num)?;
        if is_representative {
            if cluster.representative.is_some() {
                return Err(ParseError::InvalidFormat(format!(
                    "{} has more than one representative (line {line_num})",
                    cluster.name
                )));
            }
            cluster.representative = Some(identifier.clone());
        }
        cluster.members.push(identifier);
    }

    if let Some(cluster) = pending {
        records.push(cluster.finish()?);
    }

    Ok(records)
}

/// Extract the identifier and representative flag from one member line
fn parse_member_line(line: &str, line_num: usize) -> Result<(String, bool), ParseError> {
    let start = line.find('>').ok_or_else(|| {
        ParseError::InvalidFormat(format!("Line {line_num} has no sequence identifier"))
    })?;
    let rest = &line[start + 1..];
    let end = rest.find("...").ok_or_else(|| {
        ParseError::InvalidFormat(format!(
            "Line {line_num} has an unterminated sequence identifier"
        ))
    })?;

    let identifier = rest[..end].trim();
    if identifier.is_empty() {
        return Err(ParseError::InvalidFormat(format!(
            "Line {line_num} has an empty sequence identifier"
        )));
    }

    let is_representative = rest[end + 3..].trim() == "*";
    Ok((identifier.to_string(), is_representative))
}
