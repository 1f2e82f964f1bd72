use std::io::Write;
use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::{open_store, OutputFormat};
use crate::core::ClusterKind;
use crate::output::{
    write_presence_absence, write_presence_absence_file, write_representatives,
    write_representatives_file,
};

#[derive(Args)]
pub struct OutputArgs {
    #[command(subcommand)]
    pub command: OutputCommands,
}

#[derive(Subcommand)]
pub enum OutputCommands {
    /// Write the gene presence/absence matrix of the leaf clusters
    PresenceAbsence {
        /// Pangenome database
        #[arg(long, required = true)]
        db: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Leave out clusters present in every strain
        #[arg(long)]
        without_core_genes: bool,
    },

    /// Write cluster representative sequences as FASTA
    Representatives {
        /// Pangenome database
        #[arg(long, required = true)]
        db: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write super-cluster representatives instead of leaf representatives
        #[arg(long)]
        parents: bool,
    },
}

/// Execute output subcommand
///
/// # Errors
///
/// Returns an error if the database cannot be read or the output cannot be written.
#[allow(clippy::needless_pass_by_value)] // CLI entry point, values from clap
pub fn run(args: OutputArgs, _format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    match args.command {
        OutputCommands::PresenceAbsence {
            db,
            output,
            without_core_genes,
        } => {
            let store = open_store(&db)?;
            let lines = match &output {
                Some(path) => write_presence_absence_file(&store, path, without_core_genes)?,
                None => {
                    let mut stdout = std::io::stdout().lock();
                    let lines = write_presence_absence(&store, &mut stdout, without_core_genes)?;
                    stdout.flush()?;
                    lines
                }
            };
            if verbose {
                eprintln!("Wrote {lines} lines");
            }
        }
        OutputCommands::Representatives {
            db,
            output,
            parents,
        } => {
            let store = open_store(&db)?;
            let kind = if parents {
                ClusterKind::Parent
            } else {
                ClusterKind::Leaf
            };
            let records = match &output {
                Some(path) => write_representatives_file(&store, path, kind)?,
                None => write_representatives(&store, &mut std::io::stdout().lock(), kind)?,
            };
            if verbose {
                eprintln!("Wrote {records} representative sequences");
            }
        }
    }
    Ok(())
}
