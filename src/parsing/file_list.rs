use std::path::{Path, PathBuf};

use crate::parsing::ParseError;

/// One line of a sequence file list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceFileEntry {
    pub path: PathBuf,
    pub strain_name: String,
}

/// Parse a sequence file list with columns: file, strain name.
/// Relative file paths are resolved against `base_dir`.
///
/// # Errors
///
/// Returns `ParseError::Io` if the file cannot be read, or other parse errors
/// if the content is invalid.
pub fn parse_file_list(path: &Path, base_dir: &Path) -> Result<Vec<SequenceFileEntry>, ParseError> {
    let content = std::fs::read_to_string(path)?;
    parse_file_list_text(&content, base_dir)
}

/// Parse sequence file list text with columns: file, strain name
///
/// # Errors
///
/// Returns `ParseError::InvalidFormat` if lines have fewer than 2 fields, a strain
/// name is repeated, or no entries are found.
pub fn parse_file_list_text(
    text: &str,
    base_dir: &Path,
) -> Result<Vec<SequenceFileEntry>, ParseError> {
    let mut entries: Vec<SequenceFileEntry> = Vec::new();
    let mut first_data_line = true;

    for (i, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let fields: Vec<&str> = line.split('\t').collect();

        // Check if first non-empty/non-comment line is a header
        if first_data_line {
            first_data_line = false;
            let first = fields.first().map(|s| s.to_lowercase()).unwrap_or_default();
            if first == "file" || first == "path" {
                continue;
            }
        }

        let line_num = i + 1;

        if fields.len() < 2 {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has fewer than 2 fields"
            )));
        }

        let file = fields[0].trim();
        let strain_name = fields[1].trim().to_string();
        if strain_name.is_empty() {
            return Err(ParseError::InvalidFormat(format!(
                "Line {line_num} has an empty strain name"
            )));
        }
        if entries.iter().any(|e| e.strain_name == strain_name) {
            return Err(ParseError::InvalidFormat(format!(
                "Strain '{strain_name}' is listed twice (line {line_num})"
            )));
        }

        entries.push(SequenceFileEntry {
            path: base_dir.join(file),
            strain_name,
        });
    }

    if entries.is_empty() {
        return Err(ParseError::InvalidFormat(
            "No sequence files found in file list".to_string(),
        ));
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_file_list_text() {
        let text = "# genomes\nfile\tstrain\nseq1.fas\tstrain1\n/data/seq2.fas\tstrain2\n";
        let entries = parse_file_list_text(text, Path::new("/input")).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].path, PathBuf::from("/input/seq1.fas"));
        assert_eq!(entries[0].strain_name, "strain1");
        // Absolute paths are kept as they are
        assert_eq!(entries[1].path, PathBuf::from("/data/seq2.fas"));
    }

    #[test]
    fn test_missing_strain_column() {
        let err = parse_file_list_text("seq1.fas\n", Path::new(".")).unwrap_err();
        assert!(err.to_string().contains("fewer than 2 fields"));
    }

    #[test]
    fn test_duplicate_strain() {
        let text = "a.fas\tstrain1\nb.fas\tstrain1\n";
        assert!(parse_file_list_text(text, Path::new(".")).is_err());
    }

    #[test]
    fn test_empty_list() {
        assert!(parse_file_list_text("# nothing\n", Path::new(".")).is_err());
    }
}
