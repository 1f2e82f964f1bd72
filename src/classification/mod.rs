//! Classifying leaf clusters by the strains they occur in.
//!
//! | Class            | Leaf clusters whose strain set is                                |
//! |------------------|------------------------------------------------------------------|
//! | core             | every strain                                                     |
//! | unique           | a non-empty subset of the given strains, and not core            |
//! | partially shared | overlapping the given strains and some other strain, not core    |
//!
//! The three classes are pairwise disjoint for any strain list. All queries read the
//! store once through [`StrainMembership`] and return cluster ids in ascending order.

mod membership;

pub use membership::StrainMembership;

use crate::core::ClusterId;
use crate::error::PangenomeError;
use crate::store::PangenomeStore;

/// Leaf clusters present in every strain.
///
/// # Errors
///
/// Passes through any database errors.
pub fn core_clusters(store: &PangenomeStore) -> Result<Vec<ClusterId>, PangenomeError> {
    Ok(StrainMembership::load(store)?.core_clusters())
}

/// Leaf clusters present only in the given strains.
///
/// # Errors
///
/// Returns `PangenomeError::Configuration` for an empty list or an unknown strain.
pub fn unique_clusters<S: AsRef<str>>(
    store: &PangenomeStore,
    strains: &[S],
) -> Result<Vec<ClusterId>, PangenomeError> {
    StrainMembership::load(store)?.unique_clusters(strains)
}

/// Leaf clusters shared between some of the given strains and some other strain.
///
/// # Errors
///
/// Returns `PangenomeError::Configuration` for an empty list or an unknown strain.
pub fn partially_shared_clusters<S: AsRef<str>>(
    store: &PangenomeStore,
    strains: &[S],
) -> Result<Vec<ClusterId>, PangenomeError> {
    StrainMembership::load(store)?.partially_shared_clusters(strains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NewGene;
    use crate::store::LeafClusterData;

    #[test]
    fn test_classify_from_store() {
        let mut store = PangenomeStore::open_in_memory().unwrap();
        let s1 = store.add_strain("strain1").unwrap();
        let s2 = store.add_strain("strain2").unwrap();
        let g1 = store
            .add_genes(s1, &[NewGene::new("s1_a", "MKV"), NewGene::new("s1_b", "MAA")])
            .unwrap();
        let g2 = store
            .add_genes(s2, &[NewGene::new("s2_a", "MKV"), NewGene::new("s2_c", "MTT")])
            .unwrap();
        let leaves = store
            .insert_leaf_clusters(
                85,
                &[
                    LeafClusterData {
                        genes: vec![g1[0], g2[0]],
                        representative: Some(g1[0]),
                    },
                    LeafClusterData {
                        genes: vec![g1[1]],
                        representative: Some(g1[1]),
                    },
                    LeafClusterData {
                        genes: vec![g2[1]],
                        representative: Some(g2[1]),
                    },
                ],
            )
            .unwrap();

        assert_eq!(core_clusters(&store).unwrap(), vec![leaves[0]]);
        assert_eq!(unique_clusters(&store, &["strain1"]).unwrap(), vec![leaves[1]]);
        assert_eq!(unique_clusters(&store, &["strain2"]).unwrap(), vec![leaves[2]]);
        assert!(partially_shared_clusters(&store, &["strain1"]).unwrap().is_empty());
        assert!(unique_clusters(&store, &["strain9"]).is_err());
    }

    #[test]
    fn test_parents_are_not_classified() {
        let mut store = PangenomeStore::open_in_memory().unwrap();
        let s1 = store.add_strain("strain1").unwrap();
        let genes = store.add_genes(s1, &[NewGene::new("g1", "MKV")]).unwrap();
        let leaves = store
            .insert_leaf_clusters(
                90,
                &[LeafClusterData {
                    genes: genes.clone(),
                    representative: Some(genes[0]),
                }],
            )
            .unwrap();
        store
            .insert_parent_clusters(
                65,
                &[crate::store::ParentClusterData {
                    children: leaves.clone(),
                    representative: Some(genes[0]),
                }],
            )
            .unwrap();
        assert_eq!(core_clusters(&store).unwrap(), leaves);
    }
}
