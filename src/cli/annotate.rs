use std::path::PathBuf;

use clap::Args;

use crate::annotation::{
    annotate_clusters, AnnotationConfig, ReciprocalPolicy, TabularSearchBackend,
};
use crate::cli::{open_store, OutputFormat};

#[derive(Args)]
pub struct AnnotateArgs {
    /// Pangenome database
    #[arg(long, required = true)]
    pub db: PathBuf,

    /// Annotation settings (JSON); defaults are used when omitted
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Accept the best forward hit if the representative is among its top reverse hits
    #[arg(long)]
    pub accept_multiple_hits_incl_query: bool,

    /// Accept the first forward hit whose only top reverse hit is the representative
    #[arg(long)]
    pub accept_first_reciprocal_hit: bool,

    /// Number of worker threads, overriding the configuration
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub workers: Option<u16>,
}

/// Build the run configuration from the file and the command-line overrides
///
/// # Errors
///
/// Returns an error if the configuration file cannot be read, or if the policy
/// switches conflict.
pub fn resolve_config(args: &AnnotateArgs) -> anyhow::Result<AnnotationConfig> {
    let mut config = match &args.config {
        Some(path) => AnnotationConfig::load(path)?,
        None => AnnotationConfig::default(),
    };

    if args.accept_multiple_hits_incl_query
        || args.accept_first_reciprocal_hit
        || config.policy.is_none()
    {
        config.policy = Some(ReciprocalPolicy::from_flags(
            args.accept_multiple_hits_incl_query,
            args.accept_first_reciprocal_hit,
        )?);
    }
    if let Some(workers) = args.workers {
        config.workers = usize::from(workers);
    }
    config.validate()?;
    Ok(config)
}

/// Execute annotate subcommand
///
/// # Errors
///
/// Returns an error for invalid settings or unreadable hit files. Failed lookups of
/// single clusters are reported, not returned.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: AnnotateArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let config = resolve_config(&args)?;
    let backend = TabularSearchBackend::from_config(&config)?;
    if verbose {
        let tiers: Vec<&str> = config.enabled_tiers().iter().map(|tier| tier.as_str()).collect();
        eprintln!("Annotating against {} with {} workers", tiers.join(", "), config.workers);
    }

    let mut store = open_store(&args.db)?;
    let report = annotate_clusters(&mut store, &backend, &config)?;

    match format {
        OutputFormat::Text => {
            println!(
                "Annotated {} of {} clusters ({} annotations)",
                report.clusters_annotated, report.clusters_searched, report.annotations_added
            );
            if !report.failures.is_empty() {
                println!("{} lookups failed:", report.failures.len());
                for failure in &report.failures {
                    println!("  {failure}");
                }
            }
        }
        OutputFormat::Json => {
            let failures: Vec<serde_json::Value> = report
                .failures
                .iter()
                .map(|failure| {
                    serde_json::json!({
                        "cluster_id": failure.cluster,
                        "tier": failure.tier,
                        "error": failure.source.to_string(),
                    })
                })
                .collect();
            let output = serde_json::json!({
                "clusters_searched": report.clusters_searched,
                "clusters_annotated": report.clusters_annotated,
                "annotations_added": report.annotations_added,
                "failures": failures,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Tsv => {
            println!("cluster_id\ttier\terror");
            for failure in &report.failures {
                println!("{}\t{}\t{}", failure.cluster, failure.tier, failure.source);
            }
        }
    }
    Ok(())
}
