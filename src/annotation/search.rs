use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::annotation::config::AnnotationConfig;
use crate::core::{AnnotationTier, Gene};
use crate::error::PangenomeError;
use crate::parsing::hits::{parse_hits_file, HitTable, SearchHit};

/// Failures of a sequence search
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("No {tier} search results are available")]
    SourceUnavailable { tier: AnnotationTier },

    #[error("No reverse {tier} search results for hit '{hit_id}'")]
    MissingReverseHits { tier: AnnotationTier, hit_id: String },
}

/// Forward and reverse sequence searches against the annotation sources.
///
/// Searches for different clusters run concurrently, so implementations must be
/// shareable between threads.
pub trait SearchBackend: Sync {
    /// Search a cluster representative against one source
    ///
    /// # Errors
    ///
    /// Returns a `SearchError` if the search could not be run.
    fn forward(&self, tier: AnnotationTier, query: &Gene) -> Result<Vec<SearchHit>, SearchError>;

    /// Search a source sequence that was hit back against all genes
    ///
    /// # Errors
    ///
    /// Returns a `SearchError` if the search could not be run.
    fn reverse(&self, tier: AnnotationTier, hit: &SearchHit)
        -> Result<Vec<SearchHit>, SearchError>;
}

#[derive(Debug, Clone, Default)]
struct TierHits {
    forward: HitTable,
    reverse: HitTable,
}

/// Serves searches from pre-computed BLAST tabular files.
///
/// Forward hits are keyed by representative gene name, reverse hits by the source
/// sequence id. A representative missing from the forward table simply has no hits,
/// but a forward hit without reverse hits means the reverse search is incomplete.
#[derive(Debug, Clone, Default)]
pub struct TabularSearchBackend {
    tiers: HashMap<AnnotationTier, TierHits>,
}

impl TabularSearchBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_tier(mut self, tier: AnnotationTier, forward: HitTable, reverse: HitTable) -> Self {
        self.tiers.insert(tier, TierHits { forward, reverse });
        self
    }

    /// Load the hit files of every enabled tier.
    ///
    /// # Errors
    ///
    /// Returns `PangenomeError::Configuration` if an enabled tier lacks a hit file,
    /// or a parse error if a file cannot be read.
    pub fn from_config(config: &AnnotationConfig) -> Result<Self, PangenomeError> {
        let mut backend = Self::new();
        for tier in config.enabled_tiers() {
            let settings = config.tier(tier);
            let (Some(forward), Some(reverse)) = (&settings.forward_hits, &settings.reverse_hits)
            else {
                return Err(PangenomeError::configuration(format!(
                    "The {tier} source is enabled but has no forward_hits and reverse_hits files"
                )));
            };
            let forward = parse_hits_file(forward)?;
            let reverse = parse_hits_file(reverse)?;
            debug!(
                "Loaded {tier} hits for {} queries and {} source sequences",
                forward.len(),
                reverse.len()
            );
            backend = backend.with_tier(tier, forward, reverse);
        }
        Ok(backend)
    }

    fn hits(&self, tier: AnnotationTier) -> Result<&TierHits, SearchError> {
        self.tiers
            .get(&tier)
            .ok_or(SearchError::SourceUnavailable { tier })
    }
}

impl SearchBackend for TabularSearchBackend {
    fn forward(&self, tier: AnnotationTier, query: &Gene) -> Result<Vec<SearchHit>, SearchError> {
        Ok(self
            .hits(tier)?
            .forward
            .get(&query.name)
            .map(<[SearchHit]>::to_vec)
            .unwrap_or_default())
    }

    fn reverse(
        &self,
        tier: AnnotationTier,
        hit: &SearchHit,
    ) -> Result<Vec<SearchHit>, SearchError> {
        self.hits(tier)?
            .reverse
            .get(&hit.hit_id)
            .map(<[SearchHit]>::to_vec)
            .ok_or_else(|| SearchError::MissingReverseHits {
                tier,
                hit_id: hit.hit_id.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{GeneId, StrainId};
    use crate::parsing::hits::parse_hits_text;

    fn gene(name: &str) -> Gene {
        Gene {
            id: GeneId(1),
            name: name.to_string(),
            strain_id: StrainId(1),
            sequence: "MKV".to_string(),
            description: None,
        }
    }

    fn backend() -> TabularSearchBackend {
        let forward = parse_hits_text(
            "g1\tref_1\t98.5\t300\t4\t0\t1\t300\t1\t300\t1e-100\t550\tDNA gyrase subunit A\n",
        )
        .unwrap();
        let reverse =
            parse_hits_text("ref_1\tg1\t98.5\t300\t4\t0\t1\t300\t1\t300\t1e-100\t550\n").unwrap();
        TabularSearchBackend::new().with_tier(AnnotationTier::Reference, forward, reverse)
    }

    #[test]
    fn test_forward_and_reverse() {
        let backend = backend();
        let hits = backend.forward(AnnotationTier::Reference, &gene("g1")).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].annotation_text(), "DNA gyrase subunit A");

        let reverse = backend.reverse(AnnotationTier::Reference, &hits[0]).unwrap();
        assert_eq!(reverse[0].hit_id, "g1");
    }

    #[test]
    fn test_unsearched_query_has_no_hits() {
        let backend = backend();
        assert!(backend.forward(AnnotationTier::Reference, &gene("g2")).unwrap().is_empty());
    }

    #[test]
    fn test_missing_reverse_hits() {
        let backend = backend();
        let mut hit = backend.forward(AnnotationTier::Reference, &gene("g1")).unwrap().remove(0);
        hit.hit_id = "ref_9".to_string();
        let err = backend.reverse(AnnotationTier::Reference, &hit).unwrap_err();
        assert!(matches!(
            err,
            SearchError::MissingReverseHits { ref hit_id, .. } if hit_id == "ref_9"
        ));
    }

    #[test]
    fn test_unconfigured_tier() {
        let backend = backend();
        let err = backend.forward(AnnotationTier::LocalDb, &gene("g1")).unwrap_err();
        assert!(matches!(err, SearchError::SourceUnavailable { tier: AnnotationTier::LocalDb }));
    }

    #[test]
    fn test_from_config_requires_files() {
        let config = AnnotationConfig::default();
        assert!(matches!(
            TabularSearchBackend::from_config(&config),
            Err(PangenomeError::Configuration(_))
        ));
    }
}
