mod commands;

use chrono::NaiveDate;
use clap::{ArgAction, CommandFactory, Parser};
use clap_complete::{Shell, generate};
use std::io;
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "lingosite")]
#[command(version, about = "Static site generator for multilingual sites", long_about = None)]
struct Cli {
    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Parser)]
enum Command {
    /// Scaffold a new site directory
    Init {
        /// Existing directory to scaffold into
        path: PathBuf,
    },

    /// Check configuration, templates and translations
    Validate {
        /// Path to site directory (containing site.toml)
        path: PathBuf,
    },

    /// Generate every page in every locale plus sitemap.xml
    Build {
        /// Path to site directory (containing site.toml)
        path: PathBuf,

        /// Output directory (overrides site.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Sitemap lastmod date, YYYY-MM-DD (defaults to today)
        #[arg(long, value_parser = parse_date)]
        date: Option<NaiveDate>,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| format!("expected YYYY-MM-DD: {}", e))
}

fn initialize_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => Level::ERROR,
        (false, 0) => Level::WARN,
        (false, 1) => Level::INFO,
        (false, _) => Level::DEBUG,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    initialize_logging(&cli)?;

    match cli.command {
        Command::Init { path } => commands::init::run(path),
        Command::Validate { path } => commands::validate::run(path),
        Command::Build { path, output, date } => commands::build::run(path, output, date),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "lingosite", &mut io::stdout());
            Ok(())
        }
    }
}
