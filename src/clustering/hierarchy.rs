//! Multi-level cluster hierarchy.
//!
//! The first level groups genes. Every following level groups the representatives of
//! the previous level, so a cluster at level `k` absorbs whole clusters of level
//! `k - 1`. Levels are kept as immutable snapshots whose clusters refer to the previous
//! level by index; the genes of a cluster are always derived by walking down to the
//! first level.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, info};

use crate::core::{ClusterId, GeneId};
use crate::error::PangenomeError;
use crate::parsing::clstr::{parse_clstr_file, ClusterRecord};
use crate::store::{LeafClusterData, PangenomeStore};
use crate::utils::validation::validate_cutoff_sequence;

/// Cluster membership reported by the clustering tool for one cutoff
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterLevel {
    pub cutoff: u8,
    pub records: Vec<ClusterRecord>,
}

impl ClusterLevel {
    pub fn new(cutoff: u8, records: Vec<ClusterRecord>) -> Self {
        Self { cutoff, records }
    }

    /// Read the `.clstr` file of one cutoff
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(cutoff: u8, path: &Path) -> Result<Self, PangenomeError> {
        Ok(Self::new(cutoff, parse_clstr_file(path)?))
    }
}

#[derive(Debug, Clone)]
enum Members {
    /// First level: genes
    Genes(Vec<GeneId>),
    /// Later levels: indices into the previous level
    Children(Vec<usize>),
}

#[derive(Debug, Clone)]
struct LevelCluster {
    /// Sequence identifier of the representative, as the next level refers to it
    representative: String,
    representative_gene: GeneId,
    members: Members,
}

#[derive(Debug, Clone)]
struct Level {
    cutoff: u8,
    clusters: Vec<LevelCluster>,
}

/// A fully resolved cluster hierarchy, not yet stored
#[derive(Debug, Clone)]
pub struct Hierarchy {
    levels: Vec<Level>,
}

impl Hierarchy {
    /// Resolve every level against the known genes.
    ///
    /// # Errors
    ///
    /// Returns `PangenomeError::Configuration` for a bad cutoff sequence,
    /// `PangenomeError::MissingClusterData` when a record names an unknown gene or
    /// representative, and an invariant violation when a gene or cluster is absorbed
    /// twice or not at all.
    pub fn build(
        levels: &[ClusterLevel],
        genes: &HashMap<String, GeneId>,
    ) -> Result<Self, PangenomeError> {
        let cutoffs: Vec<u8> = levels.iter().map(|level| level.cutoff).collect();
        validate_cutoff_sequence(&cutoffs)?;

        let mut resolved: Vec<Level> = Vec::with_capacity(levels.len());
        for level in levels {
            let next = match resolved.last() {
                None => gene_level(level, genes)?,
                Some(previous) => merged_level(level, previous)?,
            };
            info!("Cutoff {}: {} clusters", next.cutoff, next.clusters.len());
            resolved.push(next);
        }

        Ok(Self { levels: resolved })
    }

    /// Cutoff of the final (leaf) level
    #[must_use]
    pub fn leaf_cutoff(&self) -> u8 {
        self.levels.last().map_or(0, |level| level.cutoff)
    }

    /// Number of clusters at each cutoff, tightest first
    #[must_use]
    pub fn level_sizes(&self) -> Vec<(u8, usize)> {
        self.levels
            .iter()
            .map(|level| (level.cutoff, level.clusters.len()))
            .collect()
    }

    /// Genes of a cluster at some level, in ascending id order
    #[must_use]
    pub fn genes(&self, level: usize, index: usize) -> Vec<GeneId> {
        let mut genes = Vec::new();
        self.collect_genes(level, index, &mut genes);
        genes.sort_unstable();
        genes
    }

    fn collect_genes(&self, level: usize, index: usize, genes: &mut Vec<GeneId>) {
        match &self.levels[level].clusters[index].members {
            Members::Genes(ids) => genes.extend_from_slice(ids),
            Members::Children(children) => {
                for &child in children {
                    self.collect_genes(level - 1, child, genes);
                }
            }
        }
    }

    /// The final level, ready to be stored
    #[must_use]
    pub fn leaf_clusters(&self) -> Vec<LeafClusterData> {
        let Some(last) = self.levels.len().checked_sub(1) else {
            return Vec::new();
        };
        self.levels[last]
            .clusters
            .iter()
            .enumerate()
            .map(|(index, cluster)| LeafClusterData {
                genes: self.genes(last, index),
                representative: Some(cluster.representative_gene),
            })
            .collect()
    }
}

fn gene_level(
    level: &ClusterLevel,
    genes: &HashMap<String, GeneId>,
) -> Result<Level, PangenomeError> {
    let lookup = |identifier: &str| {
        genes
            .get(identifier)
            .copied()
            .ok_or_else(|| missing(level.cutoff, identifier))
    };

    let mut assigned: HashSet<GeneId> = HashSet::with_capacity(genes.len());
    let mut clusters = Vec::with_capacity(level.records.len());
    for record in &level.records {
        check_representative_is_member(level.cutoff, record)?;

        let mut members = Vec::with_capacity(record.members.len());
        for identifier in &record.members {
            let gene = lookup(identifier)?;
            if !assigned.insert(gene) {
                return Err(PangenomeError::invariant(format!(
                    "Gene '{identifier}' is listed in more than one cluster at cutoff {}",
                    level.cutoff
                )));
            }
            members.push(gene);
        }

        clusters.push(LevelCluster {
            representative: record.representative.clone(),
            representative_gene: lookup(&record.representative)?,
            members: Members::Genes(members),
        });
    }

    if assigned.len() != genes.len() {
        return Err(PangenomeError::invariant(format!(
            "{} genes are not in any cluster at cutoff {}",
            genes.len() - assigned.len(),
            level.cutoff
        )));
    }

    Ok(Level {
        cutoff: level.cutoff,
        clusters,
    })
}

fn merged_level(level: &ClusterLevel, previous: &Level) -> Result<Level, PangenomeError> {
    let by_representative: HashMap<&str, usize> = previous
        .clusters
        .iter()
        .enumerate()
        .map(|(index, cluster)| (cluster.representative.as_str(), index))
        .collect();
    let lookup = |identifier: &str| {
        by_representative
            .get(identifier)
            .copied()
            .ok_or_else(|| missing(level.cutoff, identifier))
    };

    let mut absorbed = vec![false; previous.clusters.len()];
    let mut clusters = Vec::with_capacity(level.records.len());
    for record in &level.records {
        check_representative_is_member(level.cutoff, record)?;

        let mut children = Vec::with_capacity(record.members.len());
        for identifier in &record.members {
            let child = lookup(identifier)?;
            if std::mem::replace(&mut absorbed[child], true) {
                return Err(PangenomeError::invariant(format!(
                    "Cluster represented by '{identifier}' is absorbed twice at cutoff {}",
                    level.cutoff
                )));
            }
            children.push(child);
        }

        let representative = lookup(&record.representative)?;
        if children.len() > 1 {
            debug!(
                "Cutoff {}: '{}' absorbs {} clusters",
                level.cutoff,
                record.representative,
                children.len()
            );
        }
        clusters.push(LevelCluster {
            representative: record.representative.clone(),
            representative_gene: previous.clusters[representative].representative_gene,
            members: Members::Children(children),
        });
    }

    let orphans = absorbed.iter().filter(|&&absorbed| !absorbed).count();
    if orphans > 0 {
        return Err(PangenomeError::invariant(format!(
            "{orphans} clusters of cutoff {} are missing at cutoff {}",
            previous.cutoff, level.cutoff
        )));
    }

    Ok(Level {
        cutoff: level.cutoff,
        clusters,
    })
}

fn check_representative_is_member(
    cutoff: u8,
    record: &ClusterRecord,
) -> Result<(), PangenomeError> {
    if record.members.contains(&record.representative) {
        Ok(())
    } else {
        Err(PangenomeError::invariant(format!(
            "Representative '{}' is not a member of its own cluster at cutoff {cutoff}",
            record.representative
        )))
    }
}

fn missing(cutoff: u8, identifier: &str) -> PangenomeError {
    PangenomeError::MissingClusterData {
        cutoff,
        identifier: identifier.to_string(),
    }
}

/// Build the cluster hierarchy and store its final level as leaf clusters.
///
/// Every level is resolved before the store is written, and the leaf clusters are
/// written in one transaction.
///
/// # Errors
///
/// See [`Hierarchy::build`]. Additionally returns an invariant violation if the store
/// already contains clusters.
pub fn build_hierarchy(
    store: &mut PangenomeStore,
    levels: &[ClusterLevel],
) -> Result<Vec<ClusterId>, PangenomeError> {
    let cutoffs: Vec<u8> = levels.iter().map(|level| level.cutoff).collect();
    validate_cutoff_sequence(&cutoffs)?;

    let existing = store.cluster_count(None)?;
    if existing > 0 {
        return Err(PangenomeError::invariant(format!(
            "The store already contains {existing} clusters"
        )));
    }

    let genes = store.gene_ids_by_name()?;
    let hierarchy = Hierarchy::build(levels, &genes)?;
    store.insert_leaf_clusters(hierarchy.leaf_cutoff(), &hierarchy.leaf_clusters())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::NewGene;
    use crate::parsing::clstr::parse_clstr_text;

    fn record(members: &[&str], representative: &str) -> ClusterRecord {
        ClusterRecord {
            members: members.iter().map(ToString::to_string).collect(),
            representative: representative.to_string(),
        }
    }

    fn gene_map(names: &[&str]) -> HashMap<String, GeneId> {
        names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_string(), GeneId(i as i64 + 1)))
            .collect()
    }

    #[test]
    fn test_single_level() {
        let genes = gene_map(&["a", "b", "c"]);
        let levels = vec![ClusterLevel::new(
            90,
            vec![record(&["a", "c"], "c"), record(&["b"], "b")],
        )];
        let hierarchy = Hierarchy::build(&levels, &genes).unwrap();
        let leaves = hierarchy.leaf_clusters();
        assert_eq!(leaves.len(), 2);
        assert_eq!(leaves[0].genes, vec![GeneId(1), GeneId(3)]);
        assert_eq!(leaves[0].representative, Some(GeneId(3)));
        assert_eq!(hierarchy.leaf_cutoff(), 90);
    }

    #[test]
    fn test_levels_merge_gene_sets() {
        let genes = gene_map(&["a", "b", "c", "d"]);
        let levels = vec![
            ClusterLevel::new(
                99,
                vec![record(&["a"], "a"), record(&["b", "c"], "b"), record(&["d"], "d")],
            ),
            // 'b' stands for the cluster {b, c}
            ClusterLevel::new(95, vec![record(&["b", "a"], "b"), record(&["d"], "d")]),
            ClusterLevel::new(90, vec![record(&["d"], "d"), record(&["b"], "b")]),
        ];
        let hierarchy = Hierarchy::build(&levels, &genes).unwrap();
        assert_eq!(hierarchy.level_sizes(), vec![(99, 3), (95, 2), (90, 2)]);

        let leaves = hierarchy.leaf_clusters();
        assert_eq!(leaves[0].genes, vec![GeneId(4)]);
        assert_eq!(leaves[1].genes, vec![GeneId(1), GeneId(2), GeneId(3)]);
        assert_eq!(leaves[1].representative, Some(GeneId(2)));
    }

    #[test]
    fn test_cutoffs_must_decrease() {
        let genes = gene_map(&["a"]);
        let levels = vec![
            ClusterLevel::new(90, vec![record(&["a"], "a")]),
            ClusterLevel::new(95, vec![record(&["a"], "a")]),
        ];
        let err = Hierarchy::build(&levels, &genes).unwrap_err();
        assert!(matches!(err, PangenomeError::Configuration(_)));
    }

    #[test]
    fn test_unknown_representative_at_later_level() {
        let genes = gene_map(&["a", "b"]);
        let levels = vec![
            ClusterLevel::new(99, vec![record(&["a"], "a"), record(&["b"], "b")]),
            ClusterLevel::new(95, vec![record(&["a", "x"], "a"), record(&["b"], "b")]),
        ];
        let err = Hierarchy::build(&levels, &genes).unwrap_err();
        match err {
            PangenomeError::MissingClusterData { cutoff, identifier } => {
                assert_eq!(cutoff, 95);
                assert_eq!(identifier, "x");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unknown_gene_at_first_level() {
        let genes = gene_map(&["a"]);
        let levels = vec![ClusterLevel::new(99, vec![record(&["a", "zz"], "a")])];
        let err = Hierarchy::build(&levels, &genes).unwrap_err();
        assert!(matches!(err, PangenomeError::MissingClusterData { cutoff: 99, .. }));
    }

    #[test]
    fn test_gene_in_two_clusters() {
        let genes = gene_map(&["a", "b"]);
        let levels = vec![ClusterLevel::new(
            99,
            vec![record(&["a", "b"], "a"), record(&["b"], "b")],
        )];
        let err = Hierarchy::build(&levels, &genes).unwrap_err();
        assert!(matches!(err, PangenomeError::InvariantViolation(_)));
    }

    #[test]
    fn test_orphan_gene() {
        let genes = gene_map(&["a", "b"]);
        let levels = vec![ClusterLevel::new(99, vec![record(&["a"], "a")])];
        let err = Hierarchy::build(&levels, &genes).unwrap_err();
        assert!(err.to_string().contains("1 genes are not in any cluster"));
    }

    #[test]
    fn test_dropped_cluster_between_levels() {
        let genes = gene_map(&["a", "b"]);
        let levels = vec![
            ClusterLevel::new(99, vec![record(&["a"], "a"), record(&["b"], "b")]),
            ClusterLevel::new(95, vec![record(&["a"], "a")]),
        ];
        let err = Hierarchy::build(&levels, &genes).unwrap_err();
        assert!(matches!(err, PangenomeError::InvariantViolation(_)));
    }

    #[test]
    fn test_build_hierarchy_into_store() {
        let mut store = PangenomeStore::open_in_memory().unwrap();
        let strain1 = store.add_strain("strain1").unwrap();
        let strain2 = store.add_strain("strain2").unwrap();
        store
            .add_genes(strain1, &[NewGene::new("s1_1", "MKV"), NewGene::new("s1_2", "MAA")])
            .unwrap();
        store.add_genes(strain2, &[NewGene::new("s2_1", "MKI")]).unwrap();

        let level99 = parse_clstr_text(
            ">Cluster 0\n0\t3aa, >s1_1... *\n\
             >Cluster 1\n0\t3aa, >s1_2... *\n\
             >Cluster 2\n0\t3aa, >s2_1... *\n",
        )
        .unwrap();
        let level90 = parse_clstr_text(
            ">Cluster 0\n0\t3aa, >s1_2... *\n\
             >Cluster 1\n0\t3aa, >s1_1... *\n1\t3aa, >s2_1... at 90.00%\n",
        )
        .unwrap();

        let ids = build_hierarchy(
            &mut store,
            &[ClusterLevel::new(99, level99), ClusterLevel::new(90, level90)],
        )
        .unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(store.cluster_genes(ids[0]).unwrap().len(), 1);
        assert_eq!(store.cluster_genes(ids[1]).unwrap().len(), 2);
        assert_eq!(store.cluster(ids[1]).unwrap().unwrap().number_of_strains, 2);
        assert_eq!(store.cluster(ids[1]).unwrap().unwrap().cutoff, 90);

        // A second build is refused
        let again = build_hierarchy(&mut store, &[ClusterLevel::new(90, Vec::new())]);
        assert!(matches!(again, Err(PangenomeError::InvariantViolation(_))));
    }
}
