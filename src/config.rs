use crate::{
    models::upload_target::UploadTarget,
    services::retry_policy::{DEFAULT_BACKOFF_UNIT, DEFAULT_MAX_IDLE_RETRIES, RetryPolicy},
};
use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use std::{env, path::PathBuf, str::FromStr, time::Duration};

/// Default bytes sent per round-trip.
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Mime type declared for every upload; content is never sniffed.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// The remote rejects chunks that are not a multiple of this (except the last).
pub const CHUNK_ALIGNMENT: usize = 256 * 1024;

const DEFAULT_API_URL: &str = "https://www.googleapis.com/drive/v3";
const DEFAULT_UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3";

/// Settings that drive one resumable upload.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub chunk_size: usize,
    pub mime_type: String,
    pub retry: RetryPolicy,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Which pre-issued credential to authenticate with.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// End-user OAuth token from `DRIVE_ACCESS_TOKEN`.
    #[default]
    User,
    /// Service-account token from `DRIVE_SERVICE_TOKEN`.
    Service,
}

impl AuthMode {
    pub fn token_var(self) -> &'static str {
        match self {
            AuthMode::User => "DRIVE_ACCESS_TOKEN",
            AuthMode::Service => "DRIVE_SERVICE_TOKEN",
        }
    }
}

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub input: PathBuf,
    pub output_name: Option<String>,
    pub folder: Option<String>,
    pub auth_mode: AuthMode,
    pub chunk_size: usize,
    pub max_idle_retries: u32,
    pub backoff_unit: Duration,
    pub show_progress: bool,
    pub check_existing: bool,
    pub api_url: String,
    pub upload_url: String,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Upload a file to cloud storage with resumable transfer")]
pub struct Args {
    /// Input file path
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,

    /// Remote name for the file (defaults to the input's base name)
    #[arg(short = 'o', long = "output-name")]
    pub output_name: Option<String>,

    /// Folder to upload into; created when missing
    #[arg(short = 'f', long = "folder")]
    pub folder: Option<String>,

    /// Credential to authenticate with
    #[arg(long, value_enum, default_value_t = AuthMode::User)]
    pub auth_mode: AuthMode,

    /// Bytes per round-trip (overrides DRIVE_CHUNK_SIZE)
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Consecutive idle round-trips before giving up (overrides DRIVE_MAX_IDLE_RETRIES)
    #[arg(long)]
    pub max_idle_retries: Option<u32>,

    /// Backoff unit in seconds (overrides DRIVE_BACKOFF_UNIT_SECS)
    #[arg(long)]
    pub backoff_unit_secs: Option<u64>,

    /// Draw a progress bar
    #[arg(long)]
    pub progress: bool,

    /// Warn when a file with the same name already exists at the destination
    #[arg(long)]
    pub check_existing: bool,

    /// Metadata API base URL (overrides DRIVE_API_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Upload API base URL (overrides DRIVE_UPLOAD_URL)
    #[arg(long)]
    pub upload_url: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::from_args(Args::parse())
    }

    /// Merge already-parsed CLI args with environment fallbacks.
    pub fn from_args(args: Args) -> Result<Self> {
        // --- Environment fallback ---
        let env_chunk = parse_env("DRIVE_CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?;
        let env_retries = parse_env("DRIVE_MAX_IDLE_RETRIES", DEFAULT_MAX_IDLE_RETRIES)?;
        let env_backoff = parse_env("DRIVE_BACKOFF_UNIT_SECS", DEFAULT_BACKOFF_UNIT.as_secs())?;
        let env_api = env::var("DRIVE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        let env_upload =
            env::var("DRIVE_UPLOAD_URL").unwrap_or_else(|_| DEFAULT_UPLOAD_URL.into());

        // --- Merge ---
        let cfg = Self {
            input: args.input,
            output_name: args.output_name,
            folder: args.folder,
            auth_mode: args.auth_mode,
            chunk_size: args.chunk_size.unwrap_or(env_chunk),
            max_idle_retries: args.max_idle_retries.unwrap_or(env_retries),
            backoff_unit: Duration::from_secs(args.backoff_unit_secs.unwrap_or(env_backoff)),
            show_progress: args.progress,
            check_existing: args.check_existing,
            api_url: args.api_url.unwrap_or(env_api),
            upload_url: args.upload_url.unwrap_or(env_upload),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 || self.chunk_size % CHUNK_ALIGNMENT != 0 {
            bail!(
                "chunk size {} must be a positive multiple of {} bytes",
                self.chunk_size,
                CHUNK_ALIGNMENT
            );
        }
        if self.max_idle_retries == 0 {
            bail!("max idle retries must be at least 1");
        }
        Ok(())
    }

    /// Read the bearer token for the configured auth mode.
    pub fn access_token(&self) -> Result<String> {
        let var = self.auth_mode.token_var();
        env::var(var).with_context(|| format!("missing credential, set {}", var))
    }

    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig {
            chunk_size: self.chunk_size,
            mime_type: DEFAULT_MIME_TYPE.to_string(),
            retry: RetryPolicy::new(self.max_idle_retries, self.backoff_unit),
        }
    }

    pub fn target(&self) -> UploadTarget {
        UploadTarget {
            source: self.input.clone(),
            display_name: self.output_name.clone(),
            folder_name: self.folder.clone(),
        }
    }
}

fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", name, value)),
        Err(env::VarError::NotPresent) => Ok(default),
        Err(err) => Err(err).with_context(|| format!("reading {}", name)),
    }
}
