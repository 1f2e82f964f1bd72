//! Matching representative sequences back to the genes they came from.
//!
//! Clustering tools report representatives by sequence identifier, and identifiers
//! may be truncated or renamed along the way. Sequence content is the reliable key:
//! a representative resolves to the gene with an identical sequence, and identical
//! sequences in several strains resolve to the lowest gene id.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::core::gene::normalize_sequence;
use crate::core::{ClusterId, Gene, GeneId, NewGene};
use crate::error::PangenomeError;
use crate::store::PangenomeStore;
use crate::utils::validation::sequence_digest;

/// Resolves sequences to genes through the store's sequence digest index
pub struct RepresentativeResolver<'a> {
    store: &'a PangenomeStore,
}

impl<'a> RepresentativeResolver<'a> {
    pub fn new(store: &'a PangenomeStore) -> Self {
        Self { store }
    }

    /// Resolve a sequence against every known gene.
    ///
    /// # Errors
    ///
    /// Returns `PangenomeError::RepresentativeNotFound` naming `identifier` if no gene
    /// has this sequence.
    pub fn resolve(&self, identifier: &str, sequence: &str) -> Result<Gene, PangenomeError> {
        self.candidates(sequence)?
            .into_iter()
            .next()
            .ok_or_else(|| not_found(identifier))
    }

    /// Resolve a sequence against the genes of one cluster only.
    ///
    /// # Errors
    ///
    /// Returns `PangenomeError::RepresentativeNotFound` naming `identifier` if no
    /// member has this sequence.
    pub fn resolve_within(
        &self,
        identifier: &str,
        sequence: &str,
        members: &HashSet<GeneId>,
    ) -> Result<Gene, PangenomeError> {
        self.candidates(sequence)?
            .into_iter()
            .find(|gene| members.contains(&gene.id))
            .ok_or_else(|| not_found(identifier))
    }

    // Genes with exactly this sequence, lowest id first.
    fn candidates(&self, sequence: &str) -> Result<Vec<Gene>, PangenomeError> {
        let sequence = normalize_sequence(sequence);
        let mut genes = self.store.genes_with_digest(&sequence_digest(&sequence))?;
        genes.retain(|gene| gene.sequence == sequence);
        Ok(genes)
    }
}

fn not_found(identifier: &str) -> PangenomeError {
    PangenomeError::RepresentativeNotFound {
        identifier: identifier.to_string(),
    }
}

/// Outcome of [`assign_representatives`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RepresentativeAssignment {
    /// Clusters that received a representative
    pub assigned: usize,
    /// Clusters whose existing representative already had the same sequence
    pub unchanged: usize,
}

/// Record leaf cluster representatives from representative sequences, such as the
/// representative FASTA written by the clustering tool for the final cutoff.
///
/// Every sequence is resolved before anything is written, so a failure leaves the
/// store untouched.
///
/// # Errors
///
/// Returns `PangenomeError::RepresentativeNotFound` for a sequence matching no gene,
/// and an invariant violation if the matched gene has no cluster or the cluster
/// already has a representative with a different sequence.
pub fn assign_representatives(
    store: &mut PangenomeStore,
    records: &[NewGene],
) -> Result<RepresentativeAssignment, PangenomeError> {
    let mut summary = RepresentativeAssignment::default();
    let mut planned: HashMap<ClusterId, Gene> = HashMap::new();

    {
        let resolver = RepresentativeResolver::new(store);
        for record in records {
            let gene = resolver.resolve(&record.name, &record.sequence)?;
            let cluster = store.gene_cluster(gene.id)?.ok_or_else(|| {
                PangenomeError::invariant(format!(
                    "Representative '{}' resolved to gene '{}', which is not in any cluster",
                    record.name, gene.name
                ))
            })?;

            let existing = match planned.get(&cluster) {
                Some(gene) => Some(gene.clone()),
                None => store.representative(cluster)?,
            };
            match existing {
                Some(existing) if existing.sequence == gene.sequence => {
                    debug!("Cluster {} keeps representative {}", cluster, existing.name);
                    summary.unchanged += 1;
                }
                Some(existing) => {
                    return Err(PangenomeError::invariant(format!(
                        "Cluster {cluster} already has representative '{}', cannot use '{}'",
                        existing.name, record.name
                    )));
                }
                None => {
                    planned.insert(cluster, gene);
                }
            }
        }
    }

    let mut planned: Vec<_> = planned.into_iter().collect();
    planned.sort_by_key(|(cluster, _)| *cluster);
    for (cluster, gene) in planned {
        store.set_representative(cluster, gene.id)?;
        summary.assigned += 1;
    }

    info!(
        "Assigned {} representatives ({} already present)",
        summary.assigned, summary.unchanged
    );
    Ok(summary)
}
