use std::collections::BTreeSet;

use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::annotation::config::{AnnotationConfig, ReciprocalPolicy, TierSettings};
use crate::annotation::search::{SearchBackend, SearchError};
use crate::core::{Annotation, AnnotationTier, ClusterId, ClusterKind, Gene};
use crate::error::PangenomeError;
use crate::parsing::hits::SearchHit;
use crate::store::PangenomeStore;

/// A search that failed for one cluster and tier
#[derive(Error, Debug)]
#[error("Annotation lookup for cluster {cluster} against {tier} failed: {source}")]
pub struct AnnotationLookupError {
    pub cluster: ClusterId,
    pub tier: AnnotationTier,
    pub source: SearchError,
}

/// Summary of an annotation run
#[derive(Debug, Default)]
pub struct AnnotationReport {
    /// Leaf clusters with a representative and at least one tier left to try
    pub clusters_searched: usize,
    /// Clusters that gained at least one annotation
    pub clusters_annotated: usize,
    pub annotations_added: usize,
    pub failures: Vec<AnnotationLookupError>,
}

// Hits of the reverse search sharing the best score.
fn reverse_top_set(reverse: &[SearchHit]) -> BTreeSet<&str> {
    let Some(best) = reverse.iter().map(|hit| hit.score).max_by(f64::total_cmp) else {
        return BTreeSet::new();
    };
    reverse
        .iter()
        .filter(|hit| hit.score.total_cmp(&best).is_eq())
        .map(|hit| hit.hit_id.as_str())
        .collect()
}

/// Pick the forward hit confirmed by its reverse search, if any.
///
/// # Errors
///
/// Returns the first `SearchError` of a reverse search.
pub fn select_reciprocal_hit<B: SearchBackend + ?Sized>(
    backend: &B,
    tier: AnnotationTier,
    settings: &TierSettings,
    policy: ReciprocalPolicy,
    representative: &Gene,
    forward: Vec<SearchHit>,
) -> Result<Option<SearchHit>, SearchError> {
    let mut admissible: Vec<SearchHit> = forward
        .into_iter()
        .filter(|hit| settings.is_admissible(hit))
        .collect();
    // Stable, so equal scores keep search order
    admissible.sort_by(|a, b| b.score.total_cmp(&a.score));

    match policy {
        ReciprocalPolicy::MultipleHitsIncludingQuery => {
            let Some(best) = admissible.into_iter().next() else {
                return Ok(None);
            };
            let reverse = backend.reverse(tier, &best)?;
            let accepted = reverse_top_set(&reverse).contains(representative.name.as_str());
            Ok(accepted.then_some(best))
        }
        ReciprocalPolicy::FirstReciprocalHitContainingQuery => {
            for candidate in admissible {
                let reverse = backend.reverse(tier, &candidate)?;
                let top = reverse_top_set(&reverse);
                if top.len() == 1 && top.contains(representative.name.as_str()) {
                    return Ok(Some(candidate));
                }
                debug!(
                    "{}: {} hit '{}' is not reciprocal",
                    representative.name, tier, candidate.hit_id
                );
            }
            Ok(None)
        }
    }
}

#[derive(Debug)]
struct ClusterOutcome {
    annotations: Vec<Annotation>,
    failures: Vec<AnnotationLookupError>,
}

fn annotate_cluster<B: SearchBackend + ?Sized>(
    backend: &B,
    config: &AnnotationConfig,
    policy: ReciprocalPolicy,
    cluster: ClusterId,
    representative: &Gene,
    tiers: &[AnnotationTier],
) -> ClusterOutcome {
    let mut outcome = ClusterOutcome {
        annotations: Vec::new(),
        failures: Vec::new(),
    };

    for &tier in tiers {
        let settings = config.tier(tier);
        let accepted = backend.forward(tier, representative).and_then(|forward| {
            select_reciprocal_hit(backend, tier, settings, policy, representative, forward)
        });
        match accepted {
            Ok(Some(hit)) => outcome.annotations.push(Annotation {
                cluster_id: cluster,
                tier,
                description: hit.annotation_text().to_string(),
                hit_id: hit.hit_id,
                percent_identity: hit.percent_identity,
                hit_length: hit.alignment_length,
            }),
            Ok(None) => {}
            Err(source) => outcome.failures.push(AnnotationLookupError {
                cluster,
                tier,
                source,
            }),
        }
    }

    outcome
}

/// Annotate the representatives of all leaf clusters.
///
/// Every enabled tier is tried for every cluster, skipping tiers the cluster already
/// has an annotation from. Searches run on `config.workers` threads; the annotations
/// of each cluster are then stored in one transaction. A failed search is logged and
/// reported but does not stop the run.
///
/// # Errors
///
/// Returns `PangenomeError::Configuration` for invalid settings, before anything is
/// searched, and passes through database errors.
pub fn annotate_clusters<B: SearchBackend + ?Sized>(
    store: &mut PangenomeStore,
    backend: &B,
    config: &AnnotationConfig,
) -> Result<AnnotationReport, PangenomeError> {
    let policy = config.validate()?;
    let tiers = config.enabled_tiers();
    let done = store.annotated_tiers()?;

    let work: Vec<(ClusterId, Gene, Vec<AnnotationTier>)> = store
        .representatives(ClusterKind::Leaf)?
        .into_iter()
        .filter_map(|(cluster, gene)| {
            let pending: Vec<AnnotationTier> = tiers
                .iter()
                .copied()
                .filter(|&tier| !done.contains(&(cluster, tier)))
                .collect();
            (!pending.is_empty()).then_some((cluster, gene, pending))
        })
        .collect();
    info!(
        "Annotating {} clusters with {} workers ({})",
        work.len(),
        config.workers,
        policy.as_str()
    );

    let pool = ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
        .map_err(|e| PangenomeError::configuration(format!("Cannot start workers: {e}")))?;
    let outcomes: Vec<(ClusterId, ClusterOutcome)> = pool.install(|| {
        work.par_iter()
            .map(|(cluster, gene, pending)| {
                let outcome = annotate_cluster(backend, config, policy, *cluster, gene, pending);
                (*cluster, outcome)
            })
            .collect()
    });

    let mut report = AnnotationReport {
        clusters_searched: work.len(),
        ..AnnotationReport::default()
    };
    for (cluster, outcome) in outcomes {
        if !outcome.annotations.is_empty() {
            store.insert_annotations(&outcome.annotations)?;
            debug!("Cluster {cluster}: {} annotations", outcome.annotations.len());
            report.clusters_annotated += 1;
            report.annotations_added += outcome.annotations.len();
        }
        for failure in outcome.failures {
            warn!("{failure}");
            report.failures.push(failure);
        }
    }

    info!(
        "Annotated {} of {} clusters ({} annotations, {} failed lookups)",
        report.clusters_annotated,
        report.clusters_searched,
        report.annotations_added,
        report.failures.len()
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::search::TabularSearchBackend;
    use crate::core::{GeneId, NewGene, StrainId};
    use crate::parsing::hits::parse_hits_text;
    use crate::store::LeafClusterData;

    fn hit(query: &str, target: &str, identity: f64, length: u32, score: f64) -> String {
        format!(
            "{query}\t{target}\t{identity}\t{length}\t0\t0\t1\t{length}\t1\t{length}\t\
             1e-50\t{score}\n"
        )
    }

    fn gene(name: &str) -> Gene {
        Gene {
            id: GeneId(1),
            name: name.to_string(),
            strain_id: StrainId(1),
            sequence: "MKV".to_string(),
            description: None,
        }
    }

    fn settings() -> TierSettings {
        TierSettings {
            enabled: true,
            percent_identity_cutoff: 90.0,
            minimum_hit_length: 85,
            ..TierSettings::default()
        }
    }

    // ref_a: best forward hit, reverse tie between g1 and g2
    // ref_b: second forward hit, reverse top is g1 alone
    // ref_c: highest score but too short
    fn backend() -> TabularSearchBackend {
        let forward = [
            hit("g1", "ref_c", 99.0, 40, 900.0),
            hit("g1", "ref_a", 97.0, 300, 500.0),
            hit("g1", "ref_b", 95.0, 300, 450.0),
        ]
        .concat();
        let reverse = [
            hit("ref_a", "g1", 97.0, 300, 500.0),
            hit("ref_a", "g2", 97.0, 300, 500.0),
            hit("ref_b", "g1", 95.0, 300, 450.0),
            hit("ref_b", "g2", 80.0, 300, 300.0),
            hit("ref_c", "g1", 99.0, 40, 900.0),
        ]
        .concat();
        TabularSearchBackend::new().with_tier(
            AnnotationTier::Reference,
            parse_hits_text(&forward).unwrap(),
            parse_hits_text(&reverse).unwrap(),
        )
    }

    fn select(policy: ReciprocalPolicy, query: &str) -> Option<SearchHit> {
        let backend = backend();
        let representative = gene(query);
        let forward = backend.forward(AnnotationTier::Reference, &representative).unwrap();
        select_reciprocal_hit(
            &backend,
            AnnotationTier::Reference,
            &settings(),
            policy,
            &representative,
            forward,
        )
        .unwrap()
    }

    #[test]
    fn test_multiple_hits_policy_accepts_tied_reverse() {
        let accepted = select(ReciprocalPolicy::MultipleHitsIncludingQuery, "g1").unwrap();
        assert_eq!(accepted.hit_id, "ref_a");
    }

    #[test]
    fn test_first_reciprocal_policy_skips_tied_reverse() {
        let accepted = select(ReciprocalPolicy::FirstReciprocalHitContainingQuery, "g1").unwrap();
        assert_eq!(accepted.hit_id, "ref_b");
    }

    #[test]
    fn test_no_forward_hits() {
        assert!(select(ReciprocalPolicy::MultipleHitsIncludingQuery, "g9").is_none());
        assert!(select(ReciprocalPolicy::FirstReciprocalHitContainingQuery, "g9").is_none());
    }

    #[test]
    fn test_reverse_top_set() {
        let reverse = parse_hits_text(
            &[
                hit("r", "g1", 99.0, 100, 50.0),
                hit("r", "g2", 99.0, 100, 50.0),
                hit("r", "g3", 99.0, 100, 20.0),
            ]
            .concat(),
        )
        .unwrap();
        let top = reverse_top_set(reverse.get("r").unwrap());
        assert_eq!(top.into_iter().collect::<Vec<_>>(), vec!["g1", "g2"]);
        assert!(reverse_top_set(&[]).is_empty());
    }

    fn annotated_store() -> PangenomeStore {
        let mut store = PangenomeStore::open_in_memory().unwrap();
        let strain = store.add_strain("strain1").unwrap();
        let genes = store
            .add_genes(
                strain,
                &[
                    NewGene::new("g1", "MKV"),
                    NewGene::new("g2", "MAA"),
                    NewGene::new("g3", "MTT"),
                ],
            )
            .unwrap();
        let leaves: Vec<LeafClusterData> = genes
            .iter()
            .map(|&gene| LeafClusterData {
                genes: vec![gene],
                representative: Some(gene),
            })
            .collect();
        store.insert_leaf_clusters(85, &leaves).unwrap();
        store
    }

    #[test]
    fn test_annotate_clusters() {
        let mut store = annotated_store();
        // g2's forward hit ref_x has no reverse record
        let forward = [
            hit("g1", "ref_b", 95.0, 300, 450.0),
            hit("g2", "ref_x", 95.0, 300, 450.0),
        ]
        .concat();
        let reverse = hit("ref_b", "g1", 95.0, 300, 450.0);
        let backend = TabularSearchBackend::new().with_tier(
            AnnotationTier::Reference,
            parse_hits_text(&forward).unwrap(),
            parse_hits_text(&reverse).unwrap(),
        );
        let config = AnnotationConfig {
            reference: settings(),
            policy: Some(ReciprocalPolicy::MultipleHitsIncludingQuery),
            workers: 2,
            ..AnnotationConfig::default()
        };

        assert_eq!(store.annotation_count().unwrap(), 0);
        let report = annotate_clusters(&mut store, &backend, &config).unwrap();
        assert_eq!(report.clusters_searched, 3);
        assert_eq!(report.clusters_annotated, 1);
        assert_eq!(report.annotations_added, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].tier, AnnotationTier::Reference);
        assert_eq!(store.annotation_count().unwrap(), 1);

        let best = store.best_annotations().unwrap();
        let annotation = best.values().next().unwrap();
        assert_eq!(annotation.hit_id, "ref_b");
        assert_eq!(annotation.description, "ref_b");

        // Already annotated tiers are skipped on a second run
        let report = annotate_clusters(&mut store, &backend, &config).unwrap();
        assert_eq!(report.clusters_searched, 2);
        assert_eq!(report.annotations_added, 0);
        assert_eq!(store.annotation_count().unwrap(), 1);
    }

    #[test]
    fn test_annotate_requires_policy() {
        let mut store = annotated_store();
        let config = AnnotationConfig::default();
        let result = annotate_clusters(&mut store, &TabularSearchBackend::new(), &config);
        assert!(matches!(result, Err(PangenomeError::Configuration(_))));
    }
}
