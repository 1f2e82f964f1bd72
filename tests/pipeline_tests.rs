//! End-to-end pipeline tests
//!
//! These tests drive the library from ingestion to reports against in-memory stores,
//! using cluster and hit files shaped like the output of the external tools.

use std::fmt::Write as _;

use pancluster::annotation::{
    annotate_clusters, AnnotationConfig, ReciprocalPolicy, TabularSearchBackend,
};
use pancluster::classification::{core_clusters, partially_shared_clusters, unique_clusters};
use pancluster::clustering::{build_hierarchy, build_super_clusters, ClusterLevel};
use pancluster::core::{ClusterId, ClusterKind, NewGene};
use pancluster::output::write_presence_absence;
use pancluster::parsing::clstr::parse_clstr_text;
use pancluster::store::PangenomeStore;
use pancluster::PangenomeError;
use tempfile::TempDir;

/// One `.clstr` block; the first member is the representative
fn clstr_block(out: &mut String, index: usize, members: &[String]) {
    writeln!(out, ">Cluster {index}").unwrap();
    for (i, member) in members.iter().enumerate() {
        if i == 0 {
            writeln!(out, "{i}\t300aa, >{member}... *").unwrap();
        } else {
            writeln!(out, "{i}\t300aa, >{member}... at 95.00%").unwrap();
        }
    }
}

fn names(names: &[&str]) -> Vec<String> {
    names.iter().map(ToString::to_string).collect()
}

// ============================================================================
// Hierarchy over five cutoffs
// ============================================================================

/// Two strains, three genes; only the loosest cutoff merges s1_2 and s2_1
fn five_cutoff_store() -> PangenomeStore {
    let mut store = PangenomeStore::open_in_memory().unwrap();
    let strain1 = store.add_strain("strain1").unwrap();
    let strain2 = store.add_strain("strain2").unwrap();
    store
        .add_genes(strain1, &[NewGene::new("s1_1", "MKVLAAGI"), NewGene::new("s1_2", "MTTPPQRS")])
        .unwrap();
    store.add_genes(strain2, &[NewGene::new("s2_1", "MTTPPQRT")]).unwrap();

    let mut levels = Vec::new();
    for cutoff in [99, 98, 95, 90] {
        let mut text = String::new();
        clstr_block(&mut text, 0, &names(&["s1_1"]));
        clstr_block(&mut text, 1, &names(&["s1_2"]));
        clstr_block(&mut text, 2, &names(&["s2_1"]));
        levels.push(ClusterLevel::new(cutoff, parse_clstr_text(&text).unwrap()));
    }
    let mut text = String::new();
    clstr_block(&mut text, 0, &names(&["s1_1"]));
    clstr_block(&mut text, 1, &names(&["s1_2", "s2_1"]));
    levels.push(ClusterLevel::new(85, parse_clstr_text(&text).unwrap()));

    build_hierarchy(&mut store, &levels).unwrap();
    store
}

#[test]
fn test_five_cutoff_hierarchy() {
    let store = five_cutoff_store();
    let leaves = store.clusters(Some(ClusterKind::Leaf)).unwrap();
    assert_eq!(leaves.len(), 2);

    let first = &leaves[0];
    assert_eq!(first.id, ClusterId(1));
    assert_eq!(first.cutoff, 85);
    assert_eq!(store.cluster_genes(first.id).unwrap().len(), 1);

    let last = leaves.last().unwrap();
    let genes = store.cluster_genes(last.id).unwrap();
    assert_eq!(genes.len(), 2);
    assert_ne!(genes[0].strain_id, genes[1].strain_id);
    assert_eq!(last.number_of_strains, 2);
    assert_eq!(store.representative(last.id).unwrap().unwrap().name, "s1_2");
}

#[test]
fn test_every_gene_in_exactly_one_leaf() {
    let store = five_cutoff_store();
    assert_eq!(store.unclustered_gene_count().unwrap(), 0);

    let mut seen = Vec::new();
    for cluster in store.clusters(Some(ClusterKind::Leaf)).unwrap() {
        for gene in store.cluster_genes(cluster.id).unwrap() {
            assert_eq!(store.gene_cluster(gene.id).unwrap(), Some(cluster.id));
            seen.push(gene.id);
        }
        assert_eq!(
            cluster.number_of_strains as usize,
            store.cluster_strains(cluster.id).unwrap().len()
        );
    }
    seen.sort_unstable();
    seen.dedup();
    assert_eq!(seen.len(), store.gene_count().unwrap());
}

#[test]
fn test_bad_cutoffs_leave_store_untouched() {
    let mut store = PangenomeStore::open_in_memory().unwrap();
    let strain = store.add_strain("strain1").unwrap();
    store.add_genes(strain, &[NewGene::new("g1", "MKV")]).unwrap();
    let records = parse_clstr_text(">Cluster 0\n0\t3aa, >g1... *\n").unwrap();

    let result = build_hierarchy(
        &mut store,
        &[ClusterLevel::new(85, records.clone()), ClusterLevel::new(90, records)],
    );
    assert!(matches!(result, Err(PangenomeError::Configuration(_))));
    assert_eq!(store.cluster_count(None).unwrap(), 0);
    assert_eq!(store.unclustered_gene_count().unwrap(), 1);
}

// ============================================================================
// Super-clusters
// ============================================================================

#[test]
fn test_super_cluster_at_65() {
    let mut store = PangenomeStore::open_in_memory().unwrap();
    let strain1 = store.add_strain("strain1").unwrap();
    let strain2 = store.add_strain("strain2").unwrap();
    store
        .add_genes(strain1, &[NewGene::new("s1_1", "MKVLAAGI"), NewGene::new("s1_2", "MKVLSSGI")])
        .unwrap();
    store.add_genes(strain2, &[NewGene::new("s2_1", "MTTPPQRT")]).unwrap();

    let mut text = String::new();
    clstr_block(&mut text, 0, &names(&["s1_1"]));
    clstr_block(&mut text, 1, &names(&["s1_2"]));
    clstr_block(&mut text, 2, &names(&["s2_1"]));
    let leaves =
        build_hierarchy(&mut store, &[ClusterLevel::new(85, parse_clstr_text(&text).unwrap())])
            .unwrap();

    let mut text = String::new();
    clstr_block(&mut text, 0, &names(&["s1_1", "s1_2"]));
    let parents = build_super_clusters(&mut store, 65, &parse_clstr_text(&text).unwrap()).unwrap();
    assert_eq!(parents.len(), 1);

    let parent = store.cluster(parents[0]).unwrap().unwrap();
    assert!(parent.is_parent_cluster());
    assert_eq!(parent.cutoff, 65);
    assert_eq!(parent.number_of_members, 2);
    assert_eq!(parent.number_of_strains, 1);
    assert!(parent.id > leaves[2]);
    assert_eq!(store.cluster_genes(parent.id).unwrap().len(), 2);

    // The third leaf stays without a parent and classification ignores the parent
    assert_eq!(store.cluster(leaves[2]).unwrap().unwrap().parent, None);
    assert_eq!(store.cluster_count(Some(ClusterKind::Leaf)).unwrap(), 3);
    assert_eq!(unique_clusters(&store, &["strain1"]).unwrap(), vec![leaves[0], leaves[1]]);
}

// ============================================================================
// 415 leaf clusters over two strains
// ============================================================================

/// Leaves 1..=61 and 412 are strain1 only, 62..=87 and 414 strain2 only, the rest core
fn strains_of(cluster: usize) -> (bool, bool) {
    match cluster {
        1..=61 | 412 => (true, false),
        62..=87 | 414 => (false, true),
        _ => (true, true),
    }
}

fn large_store() -> PangenomeStore {
    let mut store = PangenomeStore::open_in_memory().unwrap();
    let strain1 = store.add_strain("strain1").unwrap();
    let strain2 = store.add_strain("strain2").unwrap();

    let mut genes1 = Vec::new();
    let mut genes2 = Vec::new();
    let mut text = String::new();
    for cluster in 1..=415 {
        let (in1, in2) = strains_of(cluster);
        let mut members = Vec::new();
        if in1 {
            let name = format!("strain1_{cluster:05}");
            genes1.push(NewGene::new(&name, format!("MK{cluster}")));
            members.push(name);
        }
        if in2 {
            let name = format!("strain2_{cluster:05}");
            genes2.push(NewGene::new(&name, format!("MT{cluster}")));
            members.push(name);
        }
        clstr_block(&mut text, cluster - 1, &members);
    }
    store.add_genes(strain1, &genes1).unwrap();
    store.add_genes(strain2, &genes2).unwrap();

    let leaves =
        build_hierarchy(&mut store, &[ClusterLevel::new(85, parse_clstr_text(&text).unwrap())])
            .unwrap();
    assert_eq!(leaves.len(), 415);
    assert_eq!(leaves[414], ClusterId(415));
    store
}

#[test]
fn test_classification_of_large_fixture() {
    let store = large_store();
    let core = core_clusters(&store).unwrap();
    let unique = unique_clusters(&store, &["strain1"]).unwrap();
    let partial = partially_shared_clusters(&store, &["strain1"]).unwrap();

    assert_eq!(core.len(), 326);
    assert_eq!(unique.len(), 62);
    assert_eq!(unique.last(), Some(&ClusterId(412)));
    assert!(partial.is_empty());
    assert_eq!(unique_clusters(&store, &["strain2"]).unwrap().len(), 27);

    assert!(unique.iter().all(|c| !core.contains(c)));
    for cluster in &core {
        assert_eq!(store.cluster_strains(*cluster).unwrap().len(), 2);
    }
}

#[test]
fn test_presence_absence_of_large_fixture() {
    let store = large_store();

    let mut full = Vec::new();
    let lines = write_presence_absence(&store, &mut full, false).unwrap();
    let full = String::from_utf8(full).unwrap();
    assert_eq!(lines, 416);
    let rows: Vec<&str> = full.lines().collect();
    assert_eq!(rows.len(), 416);
    assert_eq!(rows[0], "cluster\tstrain1\tstrain2");
    assert_eq!(rows[414], "414: hypothetical protein\t0\t1");
    assert_eq!(rows[415], "415: hypothetical protein\t1\t1");

    let mut accessory = Vec::new();
    let lines = write_presence_absence(&store, &mut accessory, true).unwrap();
    let accessory = String::from_utf8(accessory).unwrap();
    assert_eq!(lines, 90);
    let rows: Vec<&str> = accessory.lines().collect();
    assert_eq!(rows.len(), 90);
    assert_eq!(rows[88], "412: hypothetical protein\t1\t0");
    assert_eq!(rows[89], "414: hypothetical protein\t0\t1");
}

// ============================================================================
// Annotation
// ============================================================================

fn hit_line(
    query: &str,
    target: &str,
    identity: f64,
    length: u32,
    score: f64,
    title: &str,
) -> String {
    format!(
        "{query}\t{target}\t{identity:.2}\t{length}\t0\t0\t1\t{length}\t1\t{length}\t\
         1e-80\t{score}\t{title}\n"
    )
}

#[test]
fn test_annotation_with_multiple_hits_policy() {
    let mut store = five_cutoff_store();
    let dir = TempDir::new().unwrap();

    // Leaf 1 (s1_1) has a reciprocal reference hit; leaf 2 (s1_2) hits a gene whose
    // best reverse hit is s2_1, tied with s1_2
    let forward = [
        hit_line("s1_1", "ref_gyrA", 98.0, 300, 600.0, "DNA gyrase subunit A"),
        hit_line("s1_2", "ref_abc", 93.0, 280, 500.0, "ABC transporter"),
    ]
    .concat();
    let reverse = [
        hit_line("ref_gyrA", "s1_1", 98.0, 300, 600.0, ""),
        hit_line("ref_abc", "s2_1", 93.0, 280, 500.0, ""),
        hit_line("ref_abc", "s1_2", 93.0, 280, 500.0, ""),
    ]
    .concat();
    std::fs::write(dir.path().join("ref.fwd.tsv"), forward).unwrap();
    std::fs::write(dir.path().join("ref.rev.tsv"), reverse).unwrap();
    let config_path = dir.path().join("annotate.json");
    std::fs::write(
        &config_path,
        r#"{
            "reference": {
                "enabled": true,
                "percent_identity_cutoff": 90,
                "minimum_hit_length": 85,
                "forward_hits": "ref.fwd.tsv",
                "reverse_hits": "ref.rev.tsv"
            },
            "workers": 6
        }"#,
    )
    .unwrap();

    let mut config = AnnotationConfig::load(&config_path).unwrap();
    config.policy = Some(ReciprocalPolicy::MultipleHitsIncludingQuery);
    let backend = TabularSearchBackend::from_config(&config).unwrap();

    assert_eq!(store.annotation_count().unwrap(), 0);
    let report = annotate_clusters(&mut store, &backend, &config).unwrap();
    assert!(store.annotation_count().unwrap() >= 1);
    assert_eq!(report.clusters_annotated, 2);
    assert!(report.failures.is_empty());

    let mut matrix = Vec::new();
    write_presence_absence(&store, &mut matrix, false).unwrap();
    let matrix = String::from_utf8(matrix).unwrap();
    assert!(matrix.contains("1: DNA gyrase subunit A\t1\t0\n"));
    assert!(matrix.contains("2: ABC transporter\t1\t1\n"));

    // The stricter policy rejects the tied reverse hit
    let mut strict_store = five_cutoff_store();
    config.policy = Some(ReciprocalPolicy::FirstReciprocalHitContainingQuery);
    let report = annotate_clusters(&mut strict_store, &backend, &config).unwrap();
    assert_eq!(report.clusters_annotated, 1);
    assert_eq!(strict_store.annotation_count().unwrap(), 1);
}
