use serde::{Deserialize, Serialize};

use crate::core::types::{AnnotationTier, ClusterId};

/// Description shown for clusters without any accepted annotation
pub const HYPOTHETICAL_PROTEIN: &str = "hypothetical protein";

/// An accepted reciprocal best hit attached to a cluster's representative
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub cluster_id: ClusterId,
    pub tier: AnnotationTier,
    pub description: String,

    /// Identifier of the source sequence that was hit
    pub hit_id: String,

    pub percent_identity: f64,
    pub hit_length: u32,
}

/// Pick the annotation from the highest-precedence tier
#[must_use]
pub fn best_annotation(annotations: &[Annotation]) -> Option<&Annotation> {
    annotations.iter().min_by_key(|a| a.tier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn annotation(tier: AnnotationTier, description: &str) -> Annotation {
        Annotation {
            cluster_id: ClusterId(1),
            tier,
            description: description.to_string(),
            hit_id: "hit".to_string(),
            percent_identity: 95.0,
            hit_length: 300,
        }
    }

    #[test]
    fn test_best_annotation_prefers_reference() {
        let annotations = vec![
            annotation(AnnotationTier::RemoteDb, "remote"),
            annotation(AnnotationTier::Reference, "reference"),
            annotation(AnnotationTier::LocalDb, "local"),
        ];
        assert_eq!(best_annotation(&annotations).unwrap().description, "reference");
    }

    #[test]
    fn test_best_annotation_local_over_remote() {
        let annotations = vec![
            annotation(AnnotationTier::RemoteDb, "remote"),
            annotation(AnnotationTier::LocalDb, "local"),
        ];
        assert_eq!(best_annotation(&annotations).unwrap().description, "local");
    }

    #[test]
    fn test_best_annotation_empty() {
        assert!(best_annotation(&[]).is_none());
    }
}
