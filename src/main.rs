// src/main.rs

use anyhow::{Context, Result};
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use slurpy::config::{self, Config};
use slurpy::filesystem;
use slurpy::output::Printer;
use slurpy::packages::{InstalledSource, Pacman};
use slurpy::repository::{AurClient, SyncDatabase, sync_db};
use slurpy::resolver::{DEPTH_DIRECT, DEPTH_RECURSIVE, Resolver};
use slurpy::{PackageFailure, search, updates};
use std::path::{Path, PathBuf};
use termcolor::StandardStream;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "slurpy")]
#[command(author, version, about = "AUR search, download and update helper", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.config/slurpy/config.toml)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Colorize output
    #[arg(short, long, global = true)]
    color: bool,

    /// Show less information
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Show more information (repeat for debug logging)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Download and unpack package snapshots from the AUR
    Download {
        /// Package names
        #[arg(required = true)]
        packages: Vec<String>,
        /// Also download build dependencies found in the AUR
        #[arg(short, long)]
        deps: bool,
        /// Overwrite existing files and directories
        #[arg(short, long)]
        force: bool,
        /// Directory to unpack into (default: current directory)
        #[arg(short = 't', long, value_name = "DIR")]
        save_to: Option<PathBuf>,
    },
    /// Show detailed information about packages
    Info {
        /// Package names
        #[arg(required = true)]
        packages: Vec<String>,
    },
    /// Search the AUR (use ^ and $ to anchor on package names)
    Search {
        /// Search terms
        #[arg(required = true)]
        queries: Vec<String>,
    },
    /// Check installed foreign packages for updates in the AUR
    Update {
        /// Download the updates (twice to include dependencies)
        #[arg(short, long, action = ArgAction::Count)]
        download: u8,
        /// Overwrite existing files and directories
        #[arg(short, long)]
        force: bool,
        /// Directory to unpack into (default: current directory)
        #[arg(short = 't', long, value_name = "DIR")]
        save_to: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type
        shell: Shell,
    },
}

type StdPrinter = Printer<StandardStream, StandardStream>;

/// Default log filter for a verbosity level, used when RUST_LOG is unset
fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Resolver depth for `update --download` repeated `count` times
fn update_depth(count: u8) -> u8 {
    count.min(DEPTH_RECURSIVE)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "slurpy", &mut std::io::stdout());
        return Ok(());
    }

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.verbose > 0 {
        config.verbose = cli.verbose;
    }
    config.color |= cli.color;

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_filter(config.verbose))),
        )
        .init();

    let aur = AurClient::new(&config.aur_url, config.timeout())?;
    let mut printer = Printer::stdio(config.color, cli.quiet, config.verbose);

    match cli.command {
        Commands::Download {
            packages,
            deps,
            force,
            save_to,
        } => {
            let depth = if deps { DEPTH_RECURSIVE } else { DEPTH_DIRECT };
            let target = target_dir(save_to, &config);
            download(&aur, &config, &mut printer, &packages, depth, force, &target)
        }
        Commands::Info { packages } => {
            for name in &packages {
                match aur.info(name) {
                    Ok(meta) => printer.package_info(&meta, &aur.package_page(&meta))?,
                    Err(e) => printer.failure(&PackageFailure::new(name.as_str(), e))?,
                }
            }
            Ok(())
        }
        Commands::Search { queries } => {
            let report = search::search_all(&aur, &queries);
            printer.failures(&report.failures)?;
            printer.search_results(&report.results)?;
            Ok(())
        }
        Commands::Update {
            download: count,
            force,
            save_to,
        } => {
            info!("Checking for package updates");
            let installed = Pacman::new().list_installed_foreign_packages()?;
            let report = updates::detect_updates(&aur, &installed);
            printer.failures(&report.failures)?;

            if count == 0 || report.updates.is_empty() {
                printer.updates(&report)?;
                return Ok(());
            }

            let target = filesystem::ensure_target_dir(&target_dir(save_to, &config))?;
            printer.downloading_updates(&target)?;
            download(
                &aur,
                &config,
                &mut printer,
                &report.names(),
                update_depth(count),
                force,
                &target,
            )
        }
        Commands::Completions { .. } => Ok(()),
    }
}

fn target_dir(save_to: Option<PathBuf>, config: &Config) -> PathBuf {
    save_to
        .map(|p| config::expand_tilde(&p))
        .unwrap_or_else(|| config.target_dir.clone())
}

fn download(
    aur: &AurClient,
    config: &Config,
    printer: &mut StdPrinter,
    packages: &[String],
    depth: u8,
    force: bool,
    target: &Path,
) -> Result<()> {
    let local = load_local_index(config);
    let resolver = Resolver::new(aur, &local, aur, target);
    let report = resolver.resolve(packages, depth, force)?;

    printer.failures(&report.failures)?;
    printer.resolution(&report)?;
    Ok(())
}

/// Sync databases of the configured repositories
///
/// An unreadable pacman configuration leaves the index empty, so every
/// name is looked up in the AUR instead.
fn load_local_index(config: &Config) -> SyncDatabase {
    let repos = match &config.repos {
        Some(repos) => repos.clone(),
        None => match sync_db::configured_repositories(&config.pacman_conf) {
            Ok(repos) => repos,
            Err(e) => {
                warn!("{}", e);
                Vec::new()
            }
        },
    };
    debug!("Using sync repositories: {}", repos.join(", "));

    SyncDatabase::load(&config.sync_dir, &repos)
        .with_context(|| format!("Failed to read sync databases in {}", config.sync_dir.display()))
        .unwrap_or_else(|e| {
            warn!("{:#}", e);
            SyncDatabase::default()
        })
}
