use std::path::PathBuf;
use std::pin::pin;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use d2c::error::{ErrorKind, Result};
use d2c::{Context, PublishEvent, Summary};
use d2c_archive::{ArchiveHandle, FotoWebClient};
use d2c_commons::{CollisionPolicy, MediaWikiRepository, RepositoryHandle, UploadMode};
use d2c_config::Config;
use d2c_extract::models::Rendition;
use exn::ResultExt;
use futures::StreamExt;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "d2c", version, about = "Migrates photographs from Digitalarkivet to Wikimedia Commons")]
struct Cli {
    /// Config file (`.toml`, `.yaml` or `.json`).
    #[arg(long, global = true, env = "D2C_CONFIG")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print one asset reference per line.
    Discover {
        /// Listing path and query, e.g. `/fotoweb/archives/5001-Historiske-foto/?q=reinbeite*`.
        #[arg(long)]
        query: String,
        /// Maximum listing pages to read.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Discover, then upload everything found.
    Publish {
        #[arg(long)]
        query: String,
        #[arg(long)]
        limit: Option<usize>,
        /// tif, big_jpg or small_jpg.
        #[arg(long, value_parser = parse_rendition)]
        rendition: Option<Rendition>,
        /// Edit summary for every upload.
        #[arg(long)]
        comment: Option<String>,
        /// skip or suffix.
        #[arg(long)]
        on_collision: Option<CollisionPolicy>,
        /// file or url.
        #[arg(long)]
        upload: Option<UploadMode>,
    },
}

fn parse_rendition(value: &str) -> std::result::Result<Rendition, String> {
    value.parse().map_err(|_| format!("unsupported rendition: {value}"))
}

fn archive(config: &Config) -> Result<ArchiveHandle> {
    let client = FotoWebClient::new(&config.archive.base_url, &config.archive.user_agent)
        .or_raise(|| ErrorKind::Archive)?
        .with_listing(config.archive.listing)
        .with_archive_path(&config.archive.archive_path)
        .with_poll_policy(config.poll_policy());
    Ok(Arc::new(client))
}

async fn repository(config: &Config) -> Result<RepositoryHandle> {
    let repository = MediaWikiRepository::new(&config.commons.api_url, &config.archive.user_agent)
        .or_raise(|| ErrorKind::Commons)?;
    match config.commons.credentials() {
        Some((username, password)) => repository.login(username, password).await.or_raise(|| ErrorKind::Commons)?,
        None => warn!("no Commons credentials configured, uploading anonymously"),
    }
    Ok(Arc::new(repository))
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    match cli.command {
        Command::Discover { query, limit } => {
            let archive = archive(&config)?;
            let limit = limit.unwrap_or(config.archive.page_limit);
            for asset in d2c::discover(archive.as_ref(), &query, limit).await? {
                println!("{asset}");
            }
        },
        Command::Publish { query, limit, rendition, comment, on_collision, upload } => {
            if let Some(rendition) = rendition {
                config.publish.rendition = rendition;
            }
            if let Some(comment) = comment {
                config.publish.comment = comment;
            }
            if let Some(on_collision) = on_collision {
                config.publish.on_collision = on_collision;
            }
            if let Some(upload) = upload {
                config.publish.upload = upload;
            }
            let context = Context::from_config(&config)?;
            let archive = archive(&config)?;
            let repository = repository(&config).await?;
            let limit = limit.unwrap_or(config.archive.page_limit);
            let assets = d2c::discover(archive.as_ref(), &query, limit).await?;

            let mut summary = Summary::default();
            let mut events = pin!(d2c::publish(archive.as_ref(), repository.as_ref(), &context, &assets));
            while let Some(event) = events.next().await {
                summary.record(&event);
                match event {
                    Ok(PublishEvent::Started { total }) => info!(total, "started"),
                    Ok(PublishEvent::BatchStarted { index, size }) => info!(index, size, "batch started"),
                    Ok(PublishEvent::Published(outcome)) => info!(?outcome, "published"),
                    Ok(PublishEvent::BatchFailed { index }) => warn!(index, "batch failed"),
                    Ok(PublishEvent::Paused(duration)) => info!(?duration, "pausing"),
                    Ok(PublishEvent::Complete) => info!(?summary, "complete"),
                    Err(err) => error!("{err:?}"),
                }
            }
            summary.finish()?;
        },
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:?}");
            ExitCode::FAILURE
        },
    }
}
