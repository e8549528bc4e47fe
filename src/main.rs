use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use autoswipe::automation::{Automation, AutomationController, Collaborators, LogObserver};
use autoswipe::config::{self as cfg, Config};
use autoswipe::gesture::GestureInjector;
use autoswipe::launcher::CommandLauncher;
use autoswipe::random::RandomRangeProvider;
use autoswipe::sources::{self, ControlMessage};

/// Autoswipe CLI
#[derive(Debug, Parser)]
#[command(
    name = autoswipe::PKG_NAME,
    version = autoswipe::PKG_VERSION,
    about = "Timed, randomized swipe automation for short-video apps"
)]
struct Args {
    /// Path to the JSON configuration file (built-in defaults when omitted)
    #[arg(short = 'c', long = "config")]
    config: Option<PathBuf>,

    /// Enable dry-run mode (log gestures and launches instead of performing them)
    #[arg(long = "dry-run")]
    dry_run: bool,

    /// Set log level (e.g., trace, debug, info, warn, error). Overrides RUST_LOG.
    #[arg(long = "log-level")]
    log_level: Option<String>,

    /// Print the JSON Schema for the configuration and exit
    #[arg(long = "print-schema")]
    print_schema: bool,

    /// Start the automation right away instead of waiting for a start message
    #[arg(long = "autostart")]
    autostart: bool,

    /// Seed the random source for reproducible timings and coordinates
    #[arg(long = "seed")]
    seed: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    autoswipe::init_tracing(args.log_level.as_deref());

    if args.print_schema {
        let schema = cfg::generate_schema();
        let json = serde_json::to_string_pretty(&schema)?;
        println!("{json}");
        return Ok(());
    }

    info!(
        version = autoswipe::PKG_VERSION,
        config = ?args.config,
        dry_run = args.dry_run,
        "Starting Autoswipe"
    );

    let config = match &args.config {
        Some(path) => cfg::load_from_path_async(path).await?,
        None => Config::default(),
    };
    debug!(target: "autoswipe", target_package = %config.target_package, "Configuration loaded successfully");

    let random = match args.seed {
        Some(seed) => RandomRangeProvider::seeded(seed),
        None => RandomRangeProvider::from_entropy(),
    };
    let collaborators = Collaborators {
        random: Box::new(random),
        performer: Arc::new(GestureInjector::new(args.dry_run)),
        launcher: Arc::new(CommandLauncher::new(config.launch.clone(), args.dry_run)),
    };

    // Build and spawn control sources before the controller takes the config
    let sources = sources::build_sources_from_config(&config);
    if sources.is_empty() {
        warn!("No control sources configured. The automation will only react to Ctrl+C.");
    }

    let (controller, mailbox) = AutomationController::new(config, collaborators)?;
    let _log_subscription = controller.subscribe(Arc::new(LogObserver));
    let automation = Automation::spawn(controller, mailbox);

    let (tx, mut rx) = mpsc::channel::<ControlMessage>(256);
    let _handles = sources::spawn_all_sources(&sources, tx);

    if args.autostart {
        automation.start();
    }

    // Main loop: forward control messages or handle Ctrl+C
    tokio::select! {
        () = async {
            while let Some(message) = rx.recv().await {
                debug!(?message, "Control message received");
                automation.send(message.into());
            }
            info!("All control sources ended; running until Ctrl+C");
            std::future::pending::<()>().await;
        } => {}
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    automation.shutdown().await;
    info!("Autoswipe exited");
    Ok(())
}
