use anyhow::{Context, Result};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use drive_uploader::{
    config,
    services::{
        http_api::HttpDriveApi,
        progress_sink::{BarProgress, LogProgress, ProgressSink},
        uploader::{UploadOptions, UploadService},
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // --- Parse config ---
    let cfg = config::AppConfig::from_env_and_args()?;
    tracing::info!("Starting drive-uploader with config: {:?}", cfg);

    // --- Authenticated transport ---
    let token = cfg.access_token()?;
    let api = HttpDriveApi::new(&cfg.api_url, &cfg.upload_url, token)?;

    // --- Ctrl-C cancels the transfer at the next round-trip ---
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping upload");
            on_signal.cancel();
        }
    });

    let sink: Arc<dyn ProgressSink> = if cfg.show_progress {
        Arc::new(BarProgress::new())
    } else {
        Arc::new(LogProgress)
    };
    let options = UploadOptions {
        check_existing: cfg.check_existing,
        cancel,
        sink,
    };

    // --- Upload ---
    let service = UploadService::new(api, cfg.upload_config());
    let entry = service
        .upload(&cfg.target(), &options)
        .await
        .with_context(|| format!("uploading {}", cfg.input.display()))?;

    tracing::info!(
        "Uploaded {} as [{}] id {} ({} bytes confirmed by remote)",
        cfg.input.display(),
        entry.name.as_deref().unwrap_or("?"),
        entry.id,
        entry
            .size_bytes()
            .map_or_else(|| "unknown".to_string(), |n| n.to_string())
    );
    Ok(())
}
