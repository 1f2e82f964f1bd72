use clap::Parser;
use tracing_subscriber::EnvFilter;

use pancluster::cli;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("pancluster=debug,info")
    } else {
        EnvFilter::new("pancluster=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        cli::Commands::Ingest(args) => cli::ingest::run(args, cli.format, cli.verbose)?,
        cli::Commands::Cluster(args) => cli::cluster::run(args, cli.format, cli.verbose)?,
        cli::Commands::Representatives(args) => {
            cli::representatives::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::SuperCluster(args) => {
            cli::super_cluster::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Search(args) => cli::search::run(args, cli.format, cli.verbose)?,
        cli::Commands::Annotate(args) => cli::annotate::run(args, cli.format, cli.verbose)?,
        cli::Commands::Output(args) => cli::output::run(args, cli.format, cli.verbose)?,
    }

    Ok(())
}
