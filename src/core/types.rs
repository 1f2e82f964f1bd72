use serde::{Deserialize, Serialize};

/// Row id of a strain in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StrainId(pub i64);

/// Row id of a gene in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GeneId(pub i64);

/// Row id of a cluster in the store.
/// Ids are assigned in insertion order, so leaf clusters always precede parents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClusterId(pub i64);

impl std::fmt::Display for StrainId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for GeneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for ClusterId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a cluster owns genes directly or groups other clusters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClusterKind {
    /// Formed at the loosest cutoff of the base hierarchy; owns genes
    Leaf,
    /// Super-cluster grouping leaf clusters at a separate cutoff
    Parent,
}

impl ClusterKind {
    #[must_use]
    pub fn from_parent_flag(is_parent_cluster: bool) -> Self {
        if is_parent_cluster {
            Self::Parent
        } else {
            Self::Leaf
        }
    }

    #[must_use]
    pub fn is_parent(self) -> bool {
        matches!(self, Self::Parent)
    }
}

/// Source tier an annotation was taken from.
///
/// Variants are declared in precedence order: when a cluster is annotated by
/// several tiers, the first one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationTier {
    /// Reference genomes supplied for the run
    Reference,
    /// Local sequence database
    LocalDb,
    /// Public remote database
    RemoteDb,
}

impl AnnotationTier {
    /// All tiers, highest precedence first
    pub const ALL: [AnnotationTier; 3] = [Self::Reference, Self::LocalDb, Self::RemoteDb];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::LocalDb => "local_db",
            Self::RemoteDb => "remote_db",
        }
    }

    /// Parse the name stored in the database
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "reference" => Some(Self::Reference),
            "local_db" => Some(Self::LocalDb),
            "remote_db" => Some(Self::RemoteDb),
            _ => None,
        }
    }
}

impl std::fmt::Display for AnnotationTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reference => write!(f, "reference genomes"),
            Self::LocalDb => write!(f, "local database"),
            Self::RemoteDb => write!(f, "remote database"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_precedence_order() {
        let mut tiers = vec![
            AnnotationTier::RemoteDb,
            AnnotationTier::Reference,
            AnnotationTier::LocalDb,
        ];
        tiers.sort();
        assert_eq!(tiers, AnnotationTier::ALL.to_vec());
    }

    #[test]
    fn test_tier_names_round_trip() {
        for tier in AnnotationTier::ALL {
            assert_eq!(AnnotationTier::parse(tier.as_str()), Some(tier));
        }
        assert_eq!(AnnotationTier::parse("genbank"), None);
    }

    #[test]
    fn test_cluster_kind_flag() {
        assert!(ClusterKind::from_parent_flag(true).is_parent());
        assert!(!ClusterKind::from_parent_flag(false).is_parent());
    }
}
