use serde::{Deserialize, Serialize};

use crate::core::types::{ClusterId, ClusterKind};

/// A group of homologous genes found at one similarity cutoff
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: ClusterId,

    /// Percent identity threshold that produced the cluster
    pub cutoff: u8,

    pub kind: ClusterKind,

    /// Child clusters for a parent, member genes for a leaf
    pub number_of_members: u32,

    /// Distinct strains among the (transitive) member genes
    pub number_of_strains: u32,

    /// Super-cluster this leaf was absorbed into
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<ClusterId>,
}

impl Cluster {
    #[must_use]
    pub fn is_parent_cluster(&self) -> bool {
        self.kind.is_parent()
    }
}
