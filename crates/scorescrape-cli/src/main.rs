//! scorescrape CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;
mod interact;

#[derive(Parser)]
#[command(name = "scorescrape", version, about = "Exam score scraping and ledger toolkit")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log every roster user into the portal and write the batch workbook
    Scrape {
        /// Roster workbook (overrides the config)
        #[arg(long)]
        roster: PathBuf,

        /// Batch workbook to write (overrides the config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Row pick mode: last, third, none
        #[arg(long)]
        row_pick: Option<String>,

        /// Dump every fetched page into this directory
        #[arg(long)]
        debug_dir: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Merge one student's scores from an exam workbook into the ledger
    Merge {
        /// Exam workbook (a filed batch artifact)
        #[arg(long)]
        exam_file: PathBuf,

        /// Exam name; defaults to the workbook file stem
        #[arg(long)]
        exam_name: Option<String>,

        /// Ledger workbook (overrides the config)
        #[arg(long)]
        ledger: Option<PathBuf>,

        /// Student whose row is merged (overrides the config)
        #[arg(long)]
        student: Option<String>,

        /// Replace the column if the exam already exists
        #[arg(long)]
        overwrite: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Export an exam workbook as the web importer's JSON document
    Export {
        /// Exam workbook (a filed batch artifact)
        #[arg(long)]
        exam_file: PathBuf,

        /// Exam name; defaults to the workbook file stem
        #[arg(long)]
        exam_name: Option<String>,

        /// Output JSON path; defaults next to the exam workbook
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Scrape, file the exam workbook, merge the ledger, and export JSON
    Run {
        /// Answer yes to every overwrite prompt
        #[arg(long)]
        yes: bool,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Write a starter scorescrape.toml
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scorescrape_core=info".parse().unwrap())
                .add_directive("scorescrape_portal=info".parse().unwrap())
                .add_directive("scorescrape_ledger=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Scrape {
            roster,
            output,
            row_pick,
            debug_dir,
            config,
        } => commands::scrape::execute(roster, output, row_pick, debug_dir, config).await,
        Commands::Merge {
            exam_file,
            exam_name,
            ledger,
            student,
            overwrite,
            config,
        } => commands::merge::execute(exam_file, exam_name, ledger, student, overwrite, config),
        Commands::Export {
            exam_file,
            exam_name,
            output,
        } => commands::export::execute(exam_file, exam_name, output),
        Commands::Run { yes, config } => commands::run::execute(yes, config).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
