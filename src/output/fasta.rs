use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::core::ClusterKind;
use crate::error::PangenomeError;
use crate::store::PangenomeStore;

/// Sequence residues per FASTA line
pub const LINE_WIDTH: usize = 60;

/// Write the representatives of all clusters of one kind as FASTA, in ascending
/// cluster id order. Returns the number of records written.
///
/// # Errors
///
/// Returns `PangenomeError::Io` if writing fails, and passes through database errors.
pub fn write_representatives<W: Write>(
    store: &PangenomeStore,
    writer: &mut W,
    kind: ClusterKind,
) -> Result<usize, PangenomeError> {
    let representatives = store.representatives(kind)?;
    for (_, gene) in &representatives {
        writeln!(writer, ">{}", gene.name)?;
        for line in gene.sequence.as_bytes().chunks(LINE_WIDTH) {
            writer.write_all(line)?;
            writeln!(writer)?;
        }
    }
    writer.flush()?;
    Ok(representatives.len())
}

/// Write representatives to a new FASTA file.
///
/// # Errors
///
/// See [`write_representatives`]; also fails if the file cannot be created.
pub fn write_representatives_file(
    store: &PangenomeStore,
    path: &Path,
    kind: ClusterKind,
) -> Result<usize, PangenomeError> {
    let mut writer = BufWriter::new(File::create(path)?);
    let records = write_representatives(store, &mut writer, kind)?;
    info!("Wrote {} representatives to {}", records, path.display());
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NewGene;
    use crate::parsing::fasta::parse_fasta_text;
    use crate::store::LeafClusterData;

    #[test]
    fn test_write_representatives() {
        let mut store = PangenomeStore::open_in_memory().unwrap();
        let strain = store.add_strain("strain1").unwrap();
        let long = "M".repeat(130);
        let genes = store
            .add_genes(
                strain,
                &[
                    NewGene::new("g1", &long),
                    NewGene::new("g2", "MKV"),
                    NewGene::new("g3", "MKI"),
                ],
            )
            .unwrap();
        store
            .insert_leaf_clusters(
                90,
                &[
                    LeafClusterData {
                        genes: vec![genes[0]],
                        representative: Some(genes[0]),
                    },
                    LeafClusterData {
                        genes: vec![genes[1], genes[2]],
                        representative: Some(genes[2]),
                    },
                ],
            )
            .unwrap();

        let mut out = Vec::new();
        let records = write_representatives(&store, &mut out, ClusterKind::Leaf).unwrap();
        assert_eq!(records, 2);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ">g1");
        assert_eq!(lines[1].len(), 60);
        assert_eq!(lines[3].len(), 10);
        assert_eq!(&lines[4..], &[">g3", "MKI"]);

        let parsed = parse_fasta_text(&text).unwrap();
        assert_eq!(parsed[0].sequence, long);

        let mut out = Vec::new();
        assert_eq!(write_representatives(&store, &mut out, ClusterKind::Parent).unwrap(), 0);
        assert!(out.is_empty());
    }
}
