use clap::Parser;
use rand::Rng;
use serde::Deserialize;
use std::path::PathBuf;

use crate::auth::tokens::{Algorithm, TokenService};

#[derive(Parser, Debug)]
#[command(name = "postboard", about = "A small blogging backend")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Secret used to sign access tokens
    #[arg(long, env = "POSTBOARD_SECRET_KEY", hide_env_values = true)]
    pub secret_key: Option<String>,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub cors: CorsConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub secret_key: Option<String>,
    pub algorithm: Algorithm,
    pub token_minutes: i64,
    pub bcrypt_cost: u32,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            algorithm: Algorithm::Hs256,
            token_minutes: 30,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: vec!["*".to_string()],
        }
    }
}

/// Longest accepted access token lifetime: one year.
pub const MAX_TOKEN_MINUTES: i64 = 60 * 24 * 365;

impl AuthConfig {
    pub fn token_service(&self) -> anyhow::Result<TokenService> {
        let ttl = chrono::TimeDelta::try_minutes(self.token_minutes)
            .filter(|ttl| *ttl > chrono::TimeDelta::zero())
            .ok_or_else(|| {
                anyhow::anyhow!("auth.token_minutes out of range: {}", self.token_minutes)
            })?;
        Ok(TokenService::new(
            self.secret_key.clone().unwrap_or_default(),
            self.algorithm,
            ttl,
        ))
    }
}

impl CorsConfig {
    pub fn allows_any_origin(&self) -> bool {
        self.allow_origins.iter().any(|o| o == "*")
    }
}

/// Generate a random 32-byte hex secret.
fn generate_secret() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }
        if let Some(ref secret) = cli.secret_key {
            config.auth.secret_key = Some(secret.clone());
        }

        if config.auth.secret_key.as_deref().map_or(true, str::is_empty) {
            tracing::warn!(
                "No secret key configured; generated one for this run. \
                 Issued tokens will not survive a restart."
            );
            config.auth.secret_key = Some(generate_secret());
        }

        if !(1..=MAX_TOKEN_MINUTES).contains(&config.auth.token_minutes) {
            anyhow::bail!(
                "auth.token_minutes must be between 1 and {}, got {}",
                MAX_TOKEN_MINUTES,
                config.auth.token_minutes
            );
        }

        // Resolve paths relative to data dir
        if config.database.path.is_none() {
            config.database.path = Some(data_dir.join("postboard.db"));
        }

        Ok(config)
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".postboard")
        })
    }

    /// Database file. Only meaningful after `load`, which fills the default.
    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("postboard.db"))
    }
}
