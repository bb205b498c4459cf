use crate::services::{object_store::S3Settings, share_service::LinkPolicy};
use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::{env, fmt, str::FromStr, time::Duration};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub s3: S3Settings,
    /// Shared secret for access tokens. Missing is tolerated at startup and
    /// reported on the first request that needs a token.
    pub token_secret: Option<String>,
    pub links: LinkPolicy,
    pub max_upload_bytes: usize,
    pub ensure_bucket_on_start: bool,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug, Default)]
#[command(author, version, about = "Share files from an S3-compatible bucket via token links")]
pub struct Args {
    /// Host to bind to (overrides OBJECT_SHARE_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides OBJECT_SHARE_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Object store endpoint, with or without scheme (overrides ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Bucket holding shared files (overrides BUCKET_NAME)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Region sent to the object store (overrides REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Use https for endpoints given without a scheme (overrides USE_SSL)
    #[arg(long)]
    pub use_ssl: Option<bool>,

    /// Validity of the URL returned by an upload (overrides UPLOAD_LINK_TTL_SECS)
    #[arg(long)]
    pub upload_link_ttl_secs: Option<u64>,

    /// Validity of the URL returned by a download (overrides DOWNLOAD_LINK_TTL_SECS)
    #[arg(long)]
    pub download_link_ttl_secs: Option<u64>,

    /// Maximum multipart request size in bytes (overrides MAX_UPLOAD_BYTES)
    #[arg(long)]
    pub max_upload_bytes: Option<usize>,

    /// Do not check for (and create) the bucket at startup
    #[arg(long)]
    pub skip_bucket_check: bool,
}

const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig.
    pub fn from_env_and_args() -> Result<Self> {
        Self::from_sources(Args::parse(), |key| env::var(key).ok())
    }

    /// Merge CLI args over values looked up with `env`.
    pub fn from_sources(args: Args, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |key: &str| {
            env(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| anyhow!("missing required environment variable {key}"))
        };

        let endpoint = match args.endpoint {
            Some(endpoint) => endpoint,
            None => required("ENDPOINT")?,
        };
        let bucket = match args.bucket {
            Some(bucket) => bucket,
            None => required("BUCKET_NAME")?,
        };

        let links = LinkPolicy {
            upload_link_ttl: Duration::from_secs(
                args.upload_link_ttl_secs
                    .map(Ok)
                    .unwrap_or_else(|| parse_or(&env, "UPLOAD_LINK_TTL_SECS", 60 * 60))?,
            ),
            download_link_ttl: Duration::from_secs(
                args.download_link_ttl_secs
                    .map(Ok)
                    .unwrap_or_else(|| parse_or(&env, "DOWNLOAD_LINK_TTL_SECS", 60 * 60))?,
            ),
            record_ttl: Duration::from_secs(parse_or(&env, "RECORD_TTL_SECS", 7 * 24 * 60 * 60)?),
        };

        let cfg = Self {
            host: args
                .host
                .or_else(|| env("OBJECT_SHARE_HOST"))
                .unwrap_or_else(|| "0.0.0.0".into()),
            port: args
                .port
                .map(Ok)
                .unwrap_or_else(|| parse_or(&env, "OBJECT_SHARE_PORT", 3000))?,
            s3: S3Settings {
                endpoint,
                access_key: required("ACCESS_KEY_ID")?,
                secret_key: required("SECRET_ACCESS_KEY")?,
                bucket,
                region: args
                    .region
                    .or_else(|| env("REGION").filter(|v| !v.is_empty()))
                    .unwrap_or_else(|| "us-east-1".into()),
                use_ssl: args
                    .use_ssl
                    .map(Ok)
                    .unwrap_or_else(|| parse_or(&env, "USE_SSL", true))?,
            },
            token_secret: env("SECRET_TOKEN").filter(|v| !v.is_empty()),
            links,
            max_upload_bytes: args
                .max_upload_bytes
                .map(Ok)
                .unwrap_or_else(|| parse_or(&env, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES))?,
            ensure_bucket_on_start: !args.skip_bucket_check,
        };

        Ok(cfg)
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("s3", &self.s3)
            .field("token_secret", &self.token_secret.as_ref().map(|_| "<redacted>"))
            .field("links", &self.links)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("ensure_bucket_on_start", &self.ensure_bucket_on_start)
            .finish()
    }
}

fn parse_or<T>(env: impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env(key) {
        Some(value) if !value.is_empty() => value
            .parse::<T>()
            .with_context(|| format!("parsing {} value `{}`", key, value)),
        _ => Ok(default),
    }
}
