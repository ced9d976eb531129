use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use clap::Parser;
use color_eyre::eyre::{Result, bail, eyre};
use reqwest::Url;
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use halcyon::application::{DownloadOptions, DownloaderConfig, ImageDownloader};
use halcyon::domain::entities::{ImageCreatingOptions, ImageResource, ProcessItem};
use halcyon::domain::{DefaultImageProcessor, DispatchContexts};
use halcyon::domain::ports::{ImageDataProvider, ImageProcessor};
use halcyon::infrastructure::config::Command;
use halcyon::infrastructure::image::LocalFileImageDataProvider;
use halcyon::infrastructure::{AppConfig, CliArgs, ConfigManager, DiskStorage};

fn init_logging(config: &AppConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.to_string()));

    if let Some(log_path) = config.effective_log_path() {
        if let Some(parent) = log_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;

        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_thread_ids(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();

        info!(path = %log_path.display(), "Logging initialized");
    } else {
        tracing_subscriber::registry().with(filter).init();
    }

    Ok(())
}

fn load_config(args: &CliArgs) -> Result<AppConfig> {
    let mut config = ConfigManager::locate(args.config.as_deref())?.load()?;
    config.merge_with_args(args);
    config
        .validate()
        .map_err(|reason| eyre!("invalid command line options: {reason}"))?;
    Ok(config)
}

fn is_remote(source: &str) -> Option<Url> {
    Url::parse(source)
        .ok()
        .filter(|url| matches!(url.scheme(), "http" | "https"))
}

async fn fetch(
    config: &AppConfig,
    storage: &DiskStorage<Bytes>,
    sources: Vec<String>,
    key: Option<String>,
    force: bool,
) -> Result<()> {
    if key.is_some() && sources.len() > 1 {
        bail!("--key can only be used with a single source");
    }

    let contexts = DispatchContexts::current()?;
    let downloader_config = DownloaderConfig {
        download_timeout: config.downloader.download_timeout(),
        trusted_hosts: config.downloader.trusted_hosts.clone(),
        challenge_responder: None,
    };
    let downloader = Arc::new(ImageDownloader::new(
        config.downloader.name.clone(),
        downloader_config,
        &contexts,
    )?);

    let mut downloads = JoinSet::new();
    for source in sources {
        if let Some(url) = is_remote(&source) {
            let resource = ImageResource::new(url, key.clone());
            if !force && storage.is_cached(&resource.cache_key, Utc::now()) {
                println!("cached   {}", resource.cache_key);
                continue;
            }
            let downloader = Arc::clone(&downloader);
            downloads.spawn(async move {
                let result = downloader
                    .retrieve_image(resource.download_url.clone(), DownloadOptions::default())
                    .await;
                (resource, result)
            });
        } else {
            let provider = LocalFileImageDataProvider::new(&source, key.clone());
            if !force && storage.is_cached(provider.cache_key(), Utc::now()) {
                println!("cached   {}", provider.cache_key());
                continue;
            }
            let data = provider.data().await?;
            DefaultImageProcessor
                .process(
                    ProcessItem::Data(data.clone()),
                    &ImageCreatingOptions::default(),
                )
                .ok_or_else(|| eyre!("{source} is not a supported image"))?;
            storage.store(&data, provider.cache_key(), None)?;
            println!("stored   {} ({} bytes)", provider.cache_key(), data.len());
        }
    }

    let mut failures = 0usize;
    while let Some(joined) = downloads.join_next().await {
        let (resource, result) = joined?;
        match result {
            Ok(loaded) => {
                storage.store(&loaded.original_data, &resource.cache_key, None)?;
                println!(
                    "stored   {} ({}x{}, {} bytes)",
                    resource.cache_key,
                    loaded.image.width(),
                    loaded.image.height(),
                    loaded.original_data.len()
                );
            }
            Err(e) => {
                failures += 1;
                warn!(url = %resource.download_url, error = %e, "Download failed");
                eprintln!("failed   {}: {e}", resource.download_url);
            }
        }
    }

    if failures > 0 {
        bail!("{failures} download(s) failed");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = CliArgs::parse();
    let config = load_config(&args)?;
    init_logging(&config)?;

    info!(version = halcyon::VERSION, "Starting {}", halcyon::NAME);

    let storage = DiskStorage::<Bytes>::new(config.disk_cache.to_storage_config())?;
    info!(path = %storage.directory().display(), "Disk cache ready");

    match args.command {
        Command::Fetch {
            sources,
            key,
            force,
        } => fetch(&config, &storage, sources, key, force).await?,
        Command::Sweep => {
            let removed = storage.remove_expired_values(Utc::now())?;
            println!("removed {} expired entries", removed.len());
        }
        Command::Trim => {
            let removed = storage.remove_size_exceeded_values()?;
            println!(
                "removed {} entries, {} bytes remain",
                removed.len(),
                storage.total_size()?
            );
        }
        Command::Clear => {
            storage.remove_all()?;
            println!("cleared {}", storage.directory().display());
        }
    }

    storage.flush_metadata();
    Ok(())
}
