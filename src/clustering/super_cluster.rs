//! Super-clusters: leaf representatives re-clustered at a looser cutoff.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::core::{ClusterId, ClusterKind, GeneId};
use crate::error::PangenomeError;
use crate::parsing::clstr::ClusterRecord;
use crate::store::{PangenomeStore, ParentClusterData};
use crate::utils::validation::validate_cutoff;

/// Group leaf clusters into parent clusters.
///
/// `records` is the clustering of the leaf representatives at `cutoff`, naming leaves
/// by the gene name of their representative. Every record becomes one parent cluster,
/// singletons included, and the parent's representative is the representative of the
/// flagged leaf. Leaves not named by any record stay without a parent.
///
/// # Errors
///
/// Returns `PangenomeError::Configuration` if `cutoff` is invalid or not lower than the
/// leaf cutoff, `PangenomeError::MissingClusterData` for an identifier that is not a
/// leaf representative, and an invariant violation if a leaf is listed twice or
/// already has a parent.
pub fn build_super_clusters(
    store: &mut PangenomeStore,
    cutoff: u8,
    records: &[ClusterRecord],
) -> Result<Vec<ClusterId>, PangenomeError> {
    validate_cutoff(cutoff)?;

    let leaves = store.clusters(Some(ClusterKind::Leaf))?;
    let Some(leaf_cutoff) = leaves.iter().map(|cluster| cluster.cutoff).min() else {
        return Err(PangenomeError::invariant(
            "Super-clusters need leaf clusters, but the store has none",
        ));
    };
    if cutoff >= leaf_cutoff {
        return Err(PangenomeError::configuration(format!(
            "Super-cluster cutoff {cutoff} must be lower than the leaf cutoff {leaf_cutoff}"
        )));
    }

    let mut by_name: HashMap<String, (ClusterId, GeneId)> = HashMap::with_capacity(leaves.len());
    for (cluster, gene) in store.representatives(ClusterKind::Leaf)? {
        if by_name.insert(gene.name.clone(), (cluster, gene.id)).is_some() {
            return Err(PangenomeError::invariant(format!(
                "Gene '{}' represents more than one leaf cluster",
                gene.name
            )));
        }
    }
    let lookup = |identifier: &str| {
        by_name
            .get(identifier)
            .copied()
            .ok_or_else(|| PangenomeError::MissingClusterData {
                cutoff,
                identifier: identifier.to_string(),
            })
    };

    let mut seen: HashSet<ClusterId> = HashSet::new();
    let mut parents = Vec::with_capacity(records.len());
    for record in records {
        if !record.members.contains(&record.representative) {
            return Err(PangenomeError::invariant(format!(
                "Representative '{}' is not a member of its own super-cluster",
                record.representative
            )));
        }

        let mut children = Vec::with_capacity(record.members.len());
        for identifier in &record.members {
            let (leaf, _) = lookup(identifier)?;
            if !seen.insert(leaf) {
                return Err(PangenomeError::invariant(format!(
                    "Leaf cluster {leaf} ('{identifier}') is listed in more than one super-cluster"
                )));
            }
            children.push(leaf);
        }
        let (_, representative) = lookup(&record.representative)?;
        debug!(
            "Super-cluster of {} leaves represented by '{}'",
            children.len(),
            record.representative
        );
        parents.push(ParentClusterData {
            children,
            representative: Some(representative),
        });
    }

    let ids = store.insert_parent_clusters(cutoff, &parents)?;
    info!(
        "Grouped {} of {} leaf clusters into {} super-clusters at cutoff {}",
        seen.len(),
        leaves.len(),
        ids.len(),
        cutoff
    );
    Ok(ids)
}
