use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use postwatch::{
    extractor::IdentifierExtractor,
    fetcher::{ProfileFetcher, ReqwestTransport},
    jitter::Jitter,
    notify::{backend::NotifyBackend, ifttt::IftttBackend, noop::NoopBackend, Notifier},
    state::JsonFileStateStore,
    Config, ProfileWatcher,
};

/// Check a public profile once and fire a webhook if there is a new post.
#[derive(Debug, Parser)]
#[command(name = "postwatch", version)]
struct Args {
    /// Skip the random pre-fetch delay.
    #[arg(long)]
    no_jitter: bool,

    /// Override STATE_PATH.
    #[arg(long)]
    state_path: Option<PathBuf>,

    /// Override PROFILE_NAME.
    #[arg(long)]
    profile: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("postwatch=info".parse()?))
        .init();

    let args = Args::parse();

    // Load config
    let mut config = Config::from_env();
    if args.no_jitter {
        config.jitter = Jitter::none();
    }
    if let Some(path) = args.state_path {
        config.state_path = path;
    }
    if let Some(profile) = args.profile {
        config.profile_name = profile;
    }
    config.log_keys();

    // Notification backend: IFTTT if a key is configured, otherwise Noop
    let backend: Box<dyn NotifyBackend> = match config.notify_key.clone() {
        Some(key) => {
            info!(event = config.notify_event.as_str(), "IFTTT notifications enabled");
            Box::new(IftttBackend::new(key, config.notify_event.clone()))
        }
        None => {
            info!("No NOTIFY_KEY set, notifications disabled");
            Box::new(NoopBackend)
        }
    };

    let transport = ReqwestTransport::new(config.fetch_timeout)?;
    let watcher = ProfileWatcher::new(
        config.watch_config(),
        ProfileFetcher::new(Box::new(transport), config.sources()),
        IdentifierExtractor::new(),
        Box::new(JsonFileStateStore::new(config.state_path.clone())),
        Notifier::new(backend),
    );

    let outcome = watcher.run().await;
    info!(profile = config.profile_name.as_str(), "Check complete. {outcome}");
    Ok(())
}
