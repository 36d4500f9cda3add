use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use gdsync::bridge::executor::AdbBridge;
use gdsync::config::{self, SessionConfig};
use gdsync::entitlement::{self, EntitlementProvider, LicenseFile};
use gdsync::sync::engine::{SyncEngine, SyncJob, SyncMode, SyncPlan};
use gdsync::sync::policy::SyncDirection;

#[derive(Parser)]
#[command(
    name = "gdsync",
    version,
    about = "Sync Geometry Dash saves between this PC and an Android phone over adb"
)]
struct Cli {
    /// Path to the adb executable (default: next to gdsync, then the search path)
    #[arg(long, global = true)]
    adb: Option<PathBuf>,

    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Copy files from this PC to the phone
    Push(SyncArgs),
    /// Copy files from the phone to this PC
    Pull(SyncArgs),
    /// Show or change the configured paths
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Unlock pro features with a license key
    Activate { key: String },
}

#[derive(Args)]
struct SyncArgs {
    /// Sync the whole save directory, not just the critical save files
    #[arg(long)]
    all: bool,

    /// Skip files that are at least as new at the destination (pro)
    #[arg(long)]
    smart: bool,

    /// Also sync Geode mods (pro)
    #[arg(long)]
    geode: bool,

    /// Also sync GDH replay macros (pro)
    #[arg(long)]
    gdh: bool,
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print every key and its current value
    Show,
    /// Set one key and save the file
    Set { key: String, value: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "gdsync=info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match &cli.command {
        Command::Push(args) => run_sync(&cli, args, SyncDirection::LocalToRemote).await,
        Command::Pull(args) => run_sync(&cli, args, SyncDirection::RemoteToLocal).await,
        Command::Config { action } => run_config(&cli, action),
        Command::Activate { key } => run_activate(key),
    }
}

fn config_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.config {
        Some(path) => Ok(path.clone()),
        None => config::default_config_path(),
    }
}

async fn run_sync(cli: &Cli, args: &SyncArgs, direction: SyncDirection) -> Result<()> {
    let config = SessionConfig::load(&config_path(cli)?)?;
    let license = LicenseFile::load(&entitlement::default_license_path()?);
    let pro = license.is_pro_enabled();

    let smart_sync = if args.smart && !pro {
        warn!("smart sync is a pro feature, run `gdsync activate` first; ignoring --smart");
        false
    } else {
        args.smart
    };

    let mode = if args.all {
        SyncMode::AllFiles
    } else {
        SyncMode::CriticalOnly
    };

    let mut jobs = vec![SyncJob {
        target: config.game_data_target(),
        mode,
    }];
    if args.geode {
        if pro {
            jobs.push(SyncJob {
                target: config.geode_target()?,
                mode: SyncMode::AllFiles,
            });
        } else {
            warn!("Geode mod sync is a pro feature, ignoring --geode");
        }
    }
    if args.gdh {
        if pro {
            jobs.push(SyncJob {
                target: config.gdh_target()?,
                mode: SyncMode::AllFiles,
            });
        } else {
            warn!("GDH replay sync is a pro feature, ignoring --gdh");
        }
    }

    let adb_path = cli.adb.clone().unwrap_or_else(AdbBridge::locate);
    let engine = SyncEngine::new(Arc::new(AdbBridge::new(adb_path)), smart_sync);
    let summaries = engine.run(&SyncPlan { direction, jobs }).await?;

    for summary in &summaries {
        println!(
            "{}: {} transferred, {} skipped, {} failed",
            summary.target, summary.transferred, summary.skipped, summary.failed
        );
    }
    if summaries.iter().any(|s| s.failed > 0) {
        bail!("some files did not transfer, see the log above");
    }
    Ok(())
}

fn run_config(cli: &Cli, action: &ConfigAction) -> Result<()> {
    let path = config_path(cli)?;
    match action {
        ConfigAction::Show => {
            let config = SessionConfig::load(&path)?;
            for (key, value) in config.entries() {
                println!("{}=\"{}\"", key, value);
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = SessionConfig::load(&path)?;
            config.set(key, value)?;
            config.save(&path)?;
            println!("saved {} to {}", key, path.display());
        }
    }
    Ok(())
}

fn run_activate(key: &str) -> Result<()> {
    let path = entitlement::default_license_path()?;
    LicenseFile::activate(&path, key)?;
    println!("Pro features activated: smart sync, Geode mods, GDH replays.");
    Ok(())
}
