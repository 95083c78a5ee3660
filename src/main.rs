//! Bots CLI - pluggable task runner

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing::warn;

use bots::config::{self, CONFIG_PATH_ENV};
use bots::dag::dangling_dependencies;
use bots::schedule;
use bots::{
    BackendFilter, BackendLoader, BotsError, DependencyGraph, FixSuggestion, Registry, RunReport,
    Runner, StateStore,
};

#[derive(Parser)]
#[command(name = "bots")]
#[command(about = "Bots - run configured backends in dependency order")]
#[command(version)]
struct Cli {
    /// Config file (default: $BOTS_CONFIG, ~/.config/bots/bots.toml, ~/.botsrc)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run configured backends (all of them unless names are given)
    Run {
        /// Backend names to run
        #[arg(short, long = "bots", num_args = 1..)]
        bots: Vec<String>,
    },

    /// Run the recurring backends that are due now
    Cron {
        /// Print a crontab line that invokes this command every minute
        #[arg(short, long)]
        print_tab: bool,
    },

    /// List backend types and configured backends
    List,

    /// Parse and instantiate the config, then check dependencies
    Validate,
}

#[tokio::main]
async fn main() {
    // Load .env file (ignore if not present)
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match Registry::with_builtins() {
        Ok(registry) => {
            let loader = BackendLoader::new(Arc::new(registry));
            let explicit = cli.config.as_deref();
            match cli.command {
                Commands::Run { bots } => run_backends(&loader, explicit, bots).await,
                Commands::Cron { print_tab: true } => print_crontab(explicit),
                Commands::Cron { print_tab: false } => run_due(&loader, explicit).await,
                Commands::List => list_backends(&loader, explicit),
                Commands::Validate => validate_config(&loader, explicit),
            }
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let Some(suggestion) = e.fix_suggestion() {
            eprintln!("  {} {}", "Fix:".yellow(), suggestion);
        }
        std::process::exit(1);
    }
}

async fn run_backends(
    loader: &BackendLoader,
    explicit: Option<&Path>,
    names: Vec<String>,
) -> Result<(), BotsError> {
    let path = config::config_path(explicit)?;
    let backends = loader.load(&path, BackendFilter::All)?;
    let names = if names.is_empty() {
        backends.names()
    } else {
        names
    };

    let state = StateStore::load_default()?;
    let report = Runner::new(backends, state.clone()).run(&names).await;
    print_summary(&report);
    state.save()
}

async fn run_due(loader: &BackendLoader, explicit: Option<&Path>) -> Result<(), BotsError> {
    let path = config::config_path(explicit)?;
    let backends = loader.load(&path, BackendFilter::Recurring)?;

    let state = StateStore::load_default()?;
    let due = schedule::due_backends(&backends, &state, schedule::now());
    if due.is_empty() {
        println!("{} No recurring backends due", "→".cyan());
    } else {
        let report = Runner::new(backends, state.clone()).run(&due).await;
        print_summary(&report);
    }
    state.save()
}

fn print_crontab(explicit: Option<&Path>) -> Result<(), BotsError> {
    let path = config::config_path(explicit)?;
    let path = path.canonicalize().unwrap_or(path);
    let cwd = std::env::current_dir()?;
    let exe = std::env::current_exe()?;

    println!(
        "* * * * * cd {} && {}={} {} cron",
        cwd.display(),
        CONFIG_PATH_ENV,
        path.display(),
        exe.display()
    );
    Ok(())
}

fn list_backends(loader: &BackendLoader, explicit: Option<&Path>) -> Result<(), BotsError> {
    println!("{}", "Backend types:".cyan().bold());
    print!("{}", loader.registry().describe());

    let path = config::config_path(explicit)?;
    let backends = loader.load(&path, BackendFilter::All)?;

    println!();
    println!(
        "{} ({})",
        "Configured backends:".cyan().bold(),
        path.display()
    );
    for backend in backends.iter() {
        println!("  {} {}", backend.name().bold(), backend.describe().dimmed());
        if !backend.depends().is_empty() {
            let depends: Vec<&str> = backend.depends().iter().map(String::as_str).collect();
            println!("      depends: {}", depends.join(", "));
        }
    }
    Ok(())
}

fn validate_config(loader: &BackendLoader, explicit: Option<&Path>) -> Result<(), BotsError> {
    let path = config::config_path(explicit)?;
    let backends = loader.load(&path, BackendFilter::All)?;

    for (backend, missing) in dangling_dependencies(&backends) {
        warn!(%backend, dependency = %missing, "depends on an unconfigured backend");
        println!(
            "  {} {} depends on unknown backend '{}'",
            "⚠".yellow(),
            backend,
            missing
        );
    }

    DependencyGraph::from_backends(&backends).detect_cycles()?;

    println!(
        "{} Config valid: {} backends",
        "✓".green(),
        backends.len()
    );
    Ok(())
}

fn print_summary(report: &RunReport) {
    let failed = report.len() - report.succeeded();
    let line = format!("{}/{} backends succeeded", report.succeeded(), report.len());
    if failed == 0 {
        println!("\n{} {}", "✓".green(), line.green());
    } else {
        println!("\n{} {}", "✗".red(), line.red());
        for outcome in report.failures() {
            println!("  {} {}", outcome.name.bold(), outcome.error().unwrap_or_default());
        }
    }
}
