//! Centralized validation and helper functions.

use std::path::Path;

use crate::error::PangenomeError;

/// Smallest accepted clustering cutoff (percent identity)
pub const MIN_CUTOFF: u8 = 1;

/// Largest accepted clustering cutoff (percent identity)
pub const MAX_CUTOFF: u8 = 100;

/// Check that a cutoff is a percent identity.
///
/// # Errors
///
/// Returns `PangenomeError::Configuration` if the cutoff is outside 1..=100.
pub fn validate_cutoff(cutoff: u8) -> Result<(), PangenomeError> {
    if (MIN_CUTOFF..=MAX_CUTOFF).contains(&cutoff) {
        Ok(())
    } else {
        Err(PangenomeError::configuration(format!(
            "Cutoff {cutoff} is outside {MIN_CUTOFF}..={MAX_CUTOFF}"
        )))
    }
}

/// Check that hierarchy cutoffs are non-empty, valid and strictly decreasing.
///
/// # Examples
///
/// ```
/// use pancluster::utils::validation::validate_cutoff_sequence;
///
/// assert!(validate_cutoff_sequence(&[99, 98, 95, 90, 85]).is_ok());
/// assert!(validate_cutoff_sequence(&[90, 95]).is_err());
/// assert!(validate_cutoff_sequence(&[90, 90]).is_err());
/// assert!(validate_cutoff_sequence(&[]).is_err());
/// ```
///
/// # Errors
///
/// Returns `PangenomeError::Configuration` describing the first problem found.
pub fn validate_cutoff_sequence(cutoffs: &[u8]) -> Result<(), PangenomeError> {
    if cutoffs.is_empty() {
        return Err(PangenomeError::configuration("No clustering cutoffs given"));
    }
    for &cutoff in cutoffs {
        validate_cutoff(cutoff)?;
    }
    if let Some(pair) = cutoffs.windows(2).find(|pair| pair[0] <= pair[1]) {
        return Err(PangenomeError::configuration(format!(
            "Clustering cutoffs must be strictly decreasing, but {} is followed by {}",
            pair[0], pair[1]
        )));
    }
    Ok(())
}

/// Parse a cutoff list written as `99-98-95-90-85` or `99,98,95,90,85`.
///
/// Only the syntax is checked here; ordering is checked by
/// [`validate_cutoff_sequence`] when the hierarchy is built.
///
/// # Errors
///
/// Returns a message naming the offending item.
pub fn parse_cutoff_list(s: &str) -> Result<Vec<u8>, String> {
    s.split(['-', ','])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| {
            item.parse::<u8>()
                .map_err(|_| format!("Invalid cutoff '{item}'"))
        })
        .collect()
}

/// MD5 digest of a normalized sequence, used to index genes by content
#[must_use]
pub fn sequence_digest(sequence: &str) -> String {
    format!("{:x}", md5::compute(sequence.as_bytes()))
}

/// Check if the path is a gzipped file
#[must_use]
#[allow(clippy::case_sensitive_file_extension_comparisons)] // Already lowercased
pub fn is_gzipped(path: &Path) -> bool {
    let path_str = path.to_string_lossy().to_lowercase();
    path_str.ends_with(".gz") || path_str.ends_with(".bgz")
}
