//! Startup: logging, configuration, client wiring, and mode dispatch.

use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use torrelay_bot::{ConversationRouter, LinkOrchestrator, LinkRecognizer, PendingLinks, ReplySink};
use torrelay_client::{DaemonClient, TorrentDaemon, TorrentFilter, TrackerClient};
use torrelay_config::AppConfig;
use torrelay_telemetry::{GlobalContextGuard, LogFormat, LoggingConfig, log_format_from_str};

use crate::cli::{Cli, Command};
use crate::console::{self, ConsoleSink};
use crate::error::{AppError, AppResult};

/// Remote clients built from configuration.
pub(crate) struct Services {
    daemon: Arc<DaemonClient>,
    tracker: Arc<TrackerClient>,
    recognizer: LinkRecognizer,
}

impl Services {
    pub(crate) fn from_config(config: &AppConfig) -> AppResult<Self> {
        let daemon = DaemonClient::new(&config.daemon, config.http_timeout)
            .map_err(|err| AppError::client("daemon.new", err))?;
        let tracker = TrackerClient::new(&config.sites, config.http_timeout)
            .map_err(|err| AppError::client("tracker.new", err))?;
        let recognizer =
            LinkRecognizer::new(&config.sites).map_err(|err| AppError::link("links.compile", err))?;
        for site in config.sites.iter().filter(|site| site.credentials.is_none()) {
            warn!(
                site = %site.name,
                "tracker has no credentials; its links will be rejected at download time"
            );
        }
        Ok(Self {
            daemon: Arc::new(daemon),
            tracker: Arc::new(tracker),
            recognizer,
        })
    }

    pub(crate) fn into_router(
        self,
        config: &AppConfig,
        sink: Arc<dyn ReplySink>,
    ) -> ConversationRouter {
        let orchestrator =
            LinkOrchestrator::new(self.recognizer, self.tracker, self.daemon.clone());
        ConversationRouter::new(
            config,
            Arc::new(PendingLinks::new()),
            orchestrator,
            self.daemon,
            sink,
        )
    }
}

/// Entry point for the torrelay boot sequence.
///
/// # Errors
///
/// Returns an error if logging, configuration, client construction, or the
/// selected mode fails.
pub async fn run_app() -> AppResult<()> {
    run_with(Cli::parse()).await
}

pub(crate) async fn run_with(cli: Cli) -> AppResult<()> {
    let logging = LoggingConfig {
        level: &cli.log_level,
        format: log_format_from_str(cli.log_format.as_deref()).unwrap_or_else(LogFormat::infer),
        ..LoggingConfig::default()
    };
    torrelay_telemetry::init_logging(&logging)
        .map_err(|err| AppError::telemetry("telemetry.init", err))?;
    let _context = GlobalContextGuard::new(cli.command.mode());

    let config = AppConfig::from_env().map_err(|err| AppError::config("config.from_env", err))?;
    info!(
        daemon = %config.daemon.url,
        sites = config.sites.len(),
        categories = config.categories.len(),
        "torrelay bootstrap starting"
    );
    let services = Services::from_config(&config)?;

    match cli.command {
        Command::Check => check(&services).await,
        Command::Console(args) => {
            let router = services.into_router(&config, Arc::new(ConsoleSink));
            console::run(Arc::new(router), args.requester).await
        }
    }
}

async fn check(services: &Services) -> AppResult<()> {
    let torrents = services
        .daemon
        .list(TorrentFilter::All)
        .await
        .map_err(|err| AppError::client("daemon.check", err))?;
    info!(count = torrents.len(), "daemon reachable");
    println!("daemon reachable; {} torrent(s)", torrents.len());
    Ok(())
}
