use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::AnnotationTier;
use crate::error::PangenomeError;
use crate::parsing::hits::SearchHit;

/// Default number of annotation workers
pub const DEFAULT_WORKERS: usize = 4;

/// How a forward hit is confirmed by its reverse search
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReciprocalPolicy {
    /// Take the best admissible forward hit; accept it if the representative is among
    /// the top-scoring reverse hits, ties included.
    MultipleHitsIncludingQuery,
    /// Walk admissible forward hits from the best down; accept the first one whose
    /// top-scoring reverse hit is the representative alone.
    FirstReciprocalHitContainingQuery,
}

impl ReciprocalPolicy {
    /// Pick the policy from the two command-line switches.
    ///
    /// # Errors
    ///
    /// Returns `PangenomeError::Configuration` unless exactly one switch is set.
    pub fn from_flags(
        multiple_hits_including_query: bool,
        first_reciprocal_hit: bool,
    ) -> Result<Self, PangenomeError> {
        match (multiple_hits_including_query, first_reciprocal_hit) {
            (true, false) => Ok(Self::MultipleHitsIncludingQuery),
            (false, true) => Ok(Self::FirstReciprocalHitContainingQuery),
            (true, true) => Err(PangenomeError::configuration(
                "Choose only one reciprocal hit policy",
            )),
            (false, false) => Err(PangenomeError::configuration(
                "A reciprocal hit policy is required",
            )),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MultipleHitsIncludingQuery => "multiple-hits-including-query",
            Self::FirstReciprocalHitContainingQuery => "first-reciprocal-hit-containing-query",
        }
    }
}

/// Search settings of one annotation source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierSettings {
    pub enabled: bool,

    /// Minimum percent identity of an admissible forward hit
    pub percent_identity_cutoff: f64,

    /// Minimum alignment length of an admissible forward hit
    pub minimum_hit_length: u32,

    /// Tabular hits of the representatives against this source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_hits: Option<PathBuf>,

    /// Tabular hits of the source sequences against all genes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reverse_hits: Option<PathBuf>,
}

impl Default for TierSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            percent_identity_cutoff: 80.0,
            minimum_hit_length: 80,
            forward_hits: None,
            reverse_hits: None,
        }
    }
}

impl TierSettings {
    /// Whether a forward hit passes the identity and length thresholds
    #[must_use]
    pub fn is_admissible(&self, hit: &SearchHit) -> bool {
        hit.percent_identity >= self.percent_identity_cutoff
            && hit.alignment_length >= self.minimum_hit_length
    }
}

/// Settings of an annotation run, usually read from a JSON file
///
/// ```json
/// {
///   "reference": { "enabled": true, "percent_identity_cutoff": 90, "minimum_hit_length": 85,
///                  "forward_hits": "ref.fwd.tsv", "reverse_hits": "ref.rev.tsv" },
///   "policy": "multiple-hits-including-query",
///   "workers": 6
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotationConfig {
    pub reference: TierSettings,
    pub local_db: TierSettings,
    pub remote_db: TierSettings,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<ReciprocalPolicy>,

    pub workers: usize,
}

impl Default for AnnotationConfig {
    fn default() -> Self {
        Self {
            reference: TierSettings {
                enabled: true,
                percent_identity_cutoff: 90.0,
                minimum_hit_length: 85,
                ..TierSettings::default()
            },
            local_db: TierSettings::default(),
            remote_db: TierSettings::default(),
            policy: None,
            workers: DEFAULT_WORKERS,
        }
    }
}

impl AnnotationConfig {
    /// Read a JSON configuration file; missing fields take their defaults.
    ///
    /// Relative hit file paths are resolved against the directory of the file.
    ///
    /// # Errors
    ///
    /// Returns `PangenomeError::Io` if the file cannot be read, or
    /// `PangenomeError::Configuration` if it is not a valid configuration.
    pub fn load(path: &Path) -> Result<Self, PangenomeError> {
        let text = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&text).map_err(|e| {
            PangenomeError::configuration(format!(
                "Invalid annotation configuration {}: {e}",
                path.display()
            ))
        })?;

        if let Some(base) = path.parent() {
            for tier in AnnotationTier::ALL {
                let settings = config.tier_mut(tier);
                for hits in [&mut settings.forward_hits, &mut settings.reverse_hits]
                    .into_iter()
                    .flatten()
                {
                    if hits.is_relative() {
                        *hits = base.join(&*hits);
                    }
                }
            }
        }
        Ok(config)
    }

    #[must_use]
    pub fn tier(&self, tier: AnnotationTier) -> &TierSettings {
        match tier {
            AnnotationTier::Reference => &self.reference,
            AnnotationTier::LocalDb => &self.local_db,
            AnnotationTier::RemoteDb => &self.remote_db,
        }
    }

    pub fn tier_mut(&mut self, tier: AnnotationTier) -> &mut TierSettings {
        match tier {
            AnnotationTier::Reference => &mut self.reference,
            AnnotationTier::LocalDb => &mut self.local_db,
            AnnotationTier::RemoteDb => &mut self.remote_db,
        }
    }

    /// Enabled tiers in precedence order
    #[must_use]
    pub fn enabled_tiers(&self) -> Vec<AnnotationTier> {
        AnnotationTier::ALL
            .into_iter()
            .filter(|&tier| self.tier(tier).enabled)
            .collect()
    }

    /// Check the settings and return the policy to use.
    ///
    /// # Errors
    ///
    /// Returns `PangenomeError::Configuration` if no policy is set, no tier is enabled,
    /// there are no workers, or a percent identity cutoff is outside 0..=100.
    pub fn validate(&self) -> Result<ReciprocalPolicy, PangenomeError> {
        let policy = self
            .policy
            .ok_or_else(|| PangenomeError::configuration("A reciprocal hit policy is required"))?;
        if self.enabled_tiers().is_empty() {
            return Err(PangenomeError::configuration("No annotation source is enabled"));
        }
        if self.workers == 0 {
            return Err(PangenomeError::configuration("At least one worker is required"));
        }
        for tier in AnnotationTier::ALL {
            let cutoff = self.tier(tier).percent_identity_cutoff;
            if !(0.0..=100.0).contains(&cutoff) {
                return Err(PangenomeError::configuration(format!(
                    "{tier} percent identity cutoff {cutoff} is outside 0..=100"
                )));
            }
        }
        Ok(policy)
    }
}
