use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::core::{ClusterId, ClusterKind, Strain, StrainId};
use crate::error::PangenomeError;
use crate::store::PangenomeStore;

/// Strain sets of all leaf clusters, loaded once and queried in memory
#[derive(Debug, Clone, Default)]
pub struct StrainMembership {
    strains: Vec<Strain>,
    by_name: HashMap<String, StrainId>,
    /// Every leaf cluster, including any without genes
    clusters: BTreeMap<ClusterId, BTreeSet<StrainId>>,
}

impl StrainMembership {
    /// Build the index from the leaf clusters of a store.
    ///
    /// # Errors
    ///
    /// Passes through any database errors.
    pub fn load(store: &PangenomeStore) -> Result<Self, PangenomeError> {
        let mut clusters: BTreeMap<ClusterId, BTreeSet<StrainId>> = store
            .clusters(Some(ClusterKind::Leaf))?
            .into_iter()
            .map(|cluster| (cluster.id, BTreeSet::new()))
            .collect();
        for (cluster, strain) in store.leaf_strain_pairs()? {
            clusters.entry(cluster).or_default().insert(strain);
        }

        let strains = store.strains()?;
        let by_name = strains
            .iter()
            .map(|strain| (strain.name.clone(), strain.id))
            .collect();

        Ok(Self {
            strains,
            by_name,
            clusters,
        })
    }

    /// Build the index directly from strains and (cluster, strain) pairs
    #[must_use]
    pub fn from_parts(
        strains: Vec<Strain>,
        pairs: impl IntoIterator<Item = (ClusterId, StrainId)>,
    ) -> Self {
        let mut clusters: BTreeMap<ClusterId, BTreeSet<StrainId>> = BTreeMap::new();
        for (cluster, strain) in pairs {
            clusters.entry(cluster).or_default().insert(strain);
        }
        let by_name = strains
            .iter()
            .map(|strain| (strain.name.clone(), strain.id))
            .collect();
        Self {
            strains,
            by_name,
            clusters,
        }
    }

    /// All strains in ingestion order
    #[must_use]
    pub fn strains(&self) -> &[Strain] {
        &self.strains
    }

    #[must_use]
    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    /// Strains present in a leaf cluster
    #[must_use]
    pub fn strain_set(&self, cluster: ClusterId) -> Option<&BTreeSet<StrainId>> {
        self.clusters.get(&cluster)
    }

    /// Whether a strain contributes a gene to a leaf cluster
    #[must_use]
    pub fn contains(&self, cluster: ClusterId, strain: StrainId) -> bool {
        self.clusters
            .get(&cluster)
            .is_some_and(|strains| strains.contains(&strain))
    }

    /// Map strain names to ids.
    ///
    /// # Errors
    ///
    /// Returns `PangenomeError::Configuration` for an empty list or an unknown name.
    pub fn resolve_strains<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<BTreeSet<StrainId>, PangenomeError> {
        if names.is_empty() {
            return Err(PangenomeError::configuration("No strains given"));
        }
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                self.by_name.get(name).copied().ok_or_else(|| {
                    PangenomeError::configuration(format!("Unknown strain '{name}'"))
                })
            })
            .collect()
    }

    fn is_core_set(&self, strains: &BTreeSet<StrainId>) -> bool {
        !strains.is_empty() && strains.len() == self.strains.len()
    }

    /// Whether every strain contributes a gene to a leaf cluster
    #[must_use]
    pub fn is_core(&self, cluster: ClusterId) -> bool {
        self.clusters
            .get(&cluster)
            .is_some_and(|strains| self.is_core_set(strains))
    }

    /// Leaf clusters with a gene from every strain
    #[must_use]
    pub fn core_clusters(&self) -> Vec<ClusterId> {
        self.clusters
            .iter()
            .filter(|(_, strains)| self.is_core_set(strains))
            .map(|(&cluster, _)| cluster)
            .collect()
    }

    /// Leaf clusters found only in the given strains.
    ///
    /// A core cluster is never unique, even when the list names every strain.
    ///
    /// # Errors
    ///
    /// Returns `PangenomeError::Configuration` for an empty list or an unknown name.
    pub fn unique_clusters<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<ClusterId>, PangenomeError> {
        let selected = self.resolve_strains(names)?;
        Ok(self
            .clusters
            .iter()
            .filter(|(_, strains)| {
                !strains.is_empty() && strains.is_subset(&selected) && !self.is_core_set(strains)
            })
            .map(|(&cluster, _)| cluster)
            .collect())
    }

    /// Leaf clusters found in some of the given strains and in some other strain, but
    /// not in every strain.
    ///
    /// # Errors
    ///
    /// Returns `PangenomeError::Configuration` for an empty list or an unknown name.
    pub fn partially_shared_clusters<S: AsRef<str>>(
        &self,
        names: &[S],
    ) -> Result<Vec<ClusterId>, PangenomeError> {
        let selected = self.resolve_strains(names)?;
        Ok(self
            .clusters
            .iter()
            .filter(|(_, strains)| {
                !strains.is_disjoint(&selected)
                    && !strains.is_subset(&selected)
                    && !self.is_core_set(strains)
            })
            .map(|(&cluster, _)| cluster)
            .collect())
    }
}
