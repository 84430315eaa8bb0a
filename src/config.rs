use anyhow::{Context, Result};
use clap::Parser;
use std::{env, str::FromStr};

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub storage_dir: String,
    pub database_url: String,
    pub bucket_name: String,
    pub public_base_url: String,
    pub auth_token: String,
    pub api_path: String,
    pub max_body_bytes: usize,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "HTTP gateway for a single object bucket")]
pub struct Args {
    /// Host to bind to (overrides BUCKET_GATEWAY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides BUCKET_GATEWAY_PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory where object payloads are stored (overrides BUCKET_GATEWAY_STORAGE_DIR)
    #[arg(long)]
    pub storage_dir: Option<String>,

    /// Metadata database URL (overrides BUCKET_GATEWAY_DATABASE_URL)
    #[arg(long)]
    pub database_url: Option<String>,

    /// Bucket name reported by `?action=version` (overrides BUCKET_GATEWAY_BUCKET_NAME)
    #[arg(long)]
    pub bucket_name: Option<String>,

    /// Public URL prefix for object links (overrides BUCKET_GATEWAY_PUBLIC_BASE_URL)
    #[arg(long)]
    pub public_base_url: Option<String>,

    /// Expected X-Custom-Auth value (overrides BUCKET_GATEWAY_AUTH_TOKEN)
    #[arg(long)]
    pub auth_token: Option<String>,

    /// Path the API is served on (overrides BUCKET_GATEWAY_API_PATH)
    #[arg(long)]
    pub api_path: Option<String>,

    /// Maximum request body size in bytes (overrides BUCKET_GATEWAY_MAX_BODY_BYTES)
    #[arg(long)]
    pub max_body_bytes: Option<usize>,

    /// Run migrations and exit
    #[arg(long)]
    pub migrate: bool,
}

pub const DEFAULT_BUCKET_NAME: &str = "talenmap_bucket";
pub const DEFAULT_PUBLIC_BASE_URL: &str = "https://file.talentmap.my.id";
pub const DEFAULT_AUTH_TOKEN: &str = "admin";
pub const DEFAULT_API_PATH: &str = "/api/r2_api_talentmap1";
pub const DEFAULT_MAX_BODY_BYTES: usize = 100 * 1024 * 1024;

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and migrate flag.
    pub fn from_env_and_args() -> Result<(Self, bool)> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env_string("BUCKET_GATEWAY_HOST", "0.0.0.0");
        let env_port = env_parsed("BUCKET_GATEWAY_PORT", 3000u16)?;
        let env_storage = env_string("BUCKET_GATEWAY_STORAGE_DIR", "./data/objects");
        let env_db = env_string(
            "BUCKET_GATEWAY_DATABASE_URL",
            "sqlite://./data/meta/bucket_gateway.db",
        );
        let env_bucket = env_string("BUCKET_GATEWAY_BUCKET_NAME", DEFAULT_BUCKET_NAME);
        let env_public = env_string("BUCKET_GATEWAY_PUBLIC_BASE_URL", DEFAULT_PUBLIC_BASE_URL);
        let env_token = env_string("BUCKET_GATEWAY_AUTH_TOKEN", DEFAULT_AUTH_TOKEN);
        let env_api_path = env_string("BUCKET_GATEWAY_API_PATH", DEFAULT_API_PATH);
        let env_body = env_parsed("BUCKET_GATEWAY_MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?;

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            storage_dir: args.storage_dir.unwrap_or(env_storage),
            database_url: args.database_url.unwrap_or(env_db),
            bucket_name: args.bucket_name.unwrap_or(env_bucket),
            public_base_url: args.public_base_url.unwrap_or(env_public),
            auth_token: args.auth_token.unwrap_or(env_token),
            api_path: args.api_path.unwrap_or(env_api_path),
            max_body_bytes: args.max_body_bytes.unwrap_or(env_body),
        };

        if !cfg.api_path.starts_with('/') {
            anyhow::bail!("api path `{}` must start with `/`", cfg.api_path);
        }

        Ok((cfg, args.migrate))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.into())
}

fn env_parsed<T>(name: &str, default: T) -> Result<T>
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
