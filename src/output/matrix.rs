use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::classification::StrainMembership;
use crate::core::annotation::HYPOTHETICAL_PROTEIN;
use crate::core::ClusterKind;
use crate::error::PangenomeError;
use crate::store::PangenomeStore;

/// Write the gene presence/absence matrix of the leaf clusters.
///
/// The header is `cluster` followed by the strain names in ingestion order. Each
/// following line is `<id>: <description>` and one `1`/`0` column per strain, where
/// the description is the best annotation of the cluster or `hypothetical protein`.
/// Returns the number of lines written, header included.
///
/// # Errors
///
/// Returns `PangenomeError::Io` if writing fails, and passes through database errors.
pub fn write_presence_absence<W: Write>(
    store: &PangenomeStore,
    writer: &mut W,
    without_core_genes: bool,
) -> Result<usize, PangenomeError> {
    let membership = StrainMembership::load(store)?;
    let annotations = store.best_annotations()?;

    write!(writer, "cluster")?;
    for strain in membership.strains() {
        write!(writer, "\t{}", strain.name)?;
    }
    writeln!(writer)?;
    let mut lines = 1;

    for cluster in store.clusters(Some(ClusterKind::Leaf))? {
        if without_core_genes && membership.is_core(cluster.id) {
            continue;
        }
        let description = annotations
            .get(&cluster.id)
            .map_or(HYPOTHETICAL_PROTEIN, |annotation| annotation.description.as_str());
        write!(writer, "{}: {}", cluster.id, description)?;
        for strain in membership.strains() {
            let present = u8::from(membership.contains(cluster.id, strain.id));
            write!(writer, "\t{present}")?;
        }
        writeln!(writer)?;
        lines += 1;
    }

    writer.flush()?;
    Ok(lines)
}

/// Write the presence/absence matrix to a new file.
///
/// # Errors
///
/// See [`write_presence_absence`]; also fails if the file cannot be created.
pub fn write_presence_absence_file(
    store: &PangenomeStore,
    path: &Path,
    without_core_genes: bool,
) -> Result<usize, PangenomeError> {
    let mut writer = BufWriter::new(File::create(path)?);
    let lines = write_presence_absence(store, &mut writer, without_core_genes)?;
    info!("Wrote {} lines to {}", lines, path.display());
    Ok(lines)
}
