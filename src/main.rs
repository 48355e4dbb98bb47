use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use relfetch::config::{self, Config};
use relfetch::logging::{self, Verbosity};
use relfetch::release::download::DownloadOutcome;
use relfetch::release::progress::{BarProgress, mib};
use relfetch::release::service::ReleaseService;

#[derive(Parser)]
#[command(name = "relfetch")]
#[command(version, about = "Mirror-aware release resolver and downloader")]
struct Cli {
    /// Path to a JSON config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log progress information
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log probe details and timings
    #[arg(long, global = true)]
    details: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Probe mirrors and print the inferred network state
    Status {
        /// Probing deadline in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// List available releases
    List {
        /// Oldest version to include
        #[arg(long)]
        since: Option<String>,
    },
    /// Download a release tarball
    Get {
        /// Version to fetch, may be partial or `latest`
        #[arg(long, default_value = "latest")]
        version: String,

        /// Target directory, defaults to the current directory
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _guard = logging::init(
        Verbosity::from_flags(cli.verbose, cli.details),
        Some(config::log_path().as_path()),
    )?;
    let config = Config::load(cli.config.as_deref())?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(run(cli.command, config))
}

async fn run(command: Command, config: Config) -> anyhow::Result<()> {
    let service = ReleaseService::new(config)?;

    match command {
        Command::Status { timeout_ms } => {
            let timeout = timeout_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| service.probe_timeout());
            let state = service.refresh_network_state(timeout).await;

            println!("internet: {}", state.internet_access);
            println!("region:   {}", state.region);
            println!(
                "origin:   {}",
                state.origin.map_or("none", |origin| origin.as_str())
            );
            println!("latest:   {}", state.latest_version);
            println!("releases: {}", state.catalog.len());
        }
        Command::List { since } => {
            let releases = service
                .list_catalog(since.as_deref().unwrap_or_default())
                .await;
            for release in releases {
                println!(
                    "{:<16} {:<32} {}",
                    release.version(),
                    release.checksum(),
                    release.download_url()
                );
            }
        }
        Command::Get { version, dir } => {
            let version = service.complete_version(&version).await;
            let release = service
                .resolve_version(&version)
                .await
                .with_context(|| format!("cannot resolve version {}", version))?;

            let dir = dir.unwrap_or_default();
            let mut progress = BarProgress::default();
            match service.download(&release, &dir, &mut progress).await? {
                DownloadOutcome::AlreadyPresent { path } => {
                    println!("{} already present at {}", release.version(), path.display());
                }
                DownloadOutcome::Downloaded {
                    path,
                    bytes,
                    checksum,
                } => {
                    println!(
                        "Downloaded {} ({:.1} MiB, md5 {})",
                        path.display(),
                        mib(bytes),
                        checksum
                    );
                }
            }
        }
    }

    Ok(())
}
