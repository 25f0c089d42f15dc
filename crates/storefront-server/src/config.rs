//! Server configuration loaded from environment variables.
//!
//! Every setting has a default so a local instance starts with no setup.

use std::path::PathBuf;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::warn;

/// Secrets shipped in samples. Accepted, but loudly.
pub const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobBackend {
    /// Files under `media_dir`, served by this server under `/media`.
    Local,
    /// Remote object store at `blob_endpoint`.
    Http,
}

/// Account created or promoted to SUPERADMIN at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Env: `STOREFRONT_HOST`, default `0.0.0.0`
    pub host: String,
    /// Env: `STOREFRONT_PORT`, default `3000`
    pub port: u16,
    /// Env: `STOREFRONT_DB_PATH`, default `storefront.db`
    pub db_path: PathBuf,
    /// Env: `STOREFRONT_JWT_SECRET`
    pub jwt_secret: String,
    /// Env: `STOREFRONT_BLOB_BACKEND` (`local` | `http`), default `local`
    pub blob_backend: BlobBackend,
    /// Env: `STOREFRONT_MEDIA_DIR`, default `./media`
    pub media_dir: PathBuf,
    /// Base URL local blobs are reachable under.
    /// Env: `STOREFRONT_PUBLIC_URL`, default `http://localhost:3000/media`
    pub public_url: String,
    /// Env: `STOREFRONT_BLOB_ENDPOINT`
    pub blob_endpoint: Option<String>,
    /// Env: `STOREFRONT_BLOB_TOKEN`
    pub blob_token: Option<String>,
    /// Env: `STOREFRONT_ADMIN_USERNAME`, `STOREFRONT_ADMIN_PASSWORD`,
    /// `STOREFRONT_ADMIN_EMAIL`
    pub admin: Option<AdminSeed>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            db_path: PathBuf::from("storefront.db"),
            jwt_secret: "dev-secret-change-me".to_string(),
            blob_backend: BlobBackend::Local,
            media_dir: PathBuf::from("./media"),
            public_url: "http://localhost:3000/media".to_string(),
            blob_endpoint: None,
            blob_token: None,
            admin: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over an arbitrary source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = var("STOREFRONT_HOST") {
            config.host = host;
        }
        if let Some(port) = var("STOREFRONT_PORT") {
            match port.parse() {
                Ok(port) => config.port = port,
                Err(_) => warn!(value = %port, "Invalid STOREFRONT_PORT, using default"),
            }
        }
        if let Some(path) = var("STOREFRONT_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(secret) = var("STOREFRONT_JWT_SECRET") {
            config.jwt_secret = secret;
        }
        if let Some(backend) = var("STOREFRONT_BLOB_BACKEND") {
            match backend.to_ascii_lowercase().as_str() {
                "local" => config.blob_backend = BlobBackend::Local,
                "http" => config.blob_backend = BlobBackend::Http,
                _ => warn!(value = %backend, "Unknown STOREFRONT_BLOB_BACKEND, using local"),
            }
        }
        if let Some(dir) = var("STOREFRONT_MEDIA_DIR") {
            config.media_dir = PathBuf::from(dir);
        }
        if let Some(url) = var("STOREFRONT_PUBLIC_URL") {
            config.public_url = url;
        }
        config.blob_endpoint = var("STOREFRONT_BLOB_ENDPOINT");
        config.blob_token = var("STOREFRONT_BLOB_TOKEN");

        if let (Some(username), Some(password)) =
            (var("STOREFRONT_ADMIN_USERNAME"), var("STOREFRONT_ADMIN_PASSWORD"))
        {
            let email = var("STOREFRONT_ADMIN_EMAIL").unwrap_or_else(|| format!("{username}@localhost"));
            config.admin = Some(AdminSeed {
                username,
                password,
                email,
            });
        }

        config
    }

    /// Binds the listening socket. `host` may be a name like `localhost`,
    /// resolved at bind time.
    pub async fn bind(&self) -> anyhow::Result<TcpListener> {
        TcpListener::bind((self.host.as_str(), self.port))
            .await
            .with_context(|| format!("Failed to bind {}:{}", self.host, self.port))
    }

    pub fn has_placeholder_secret(&self) -> bool {
        PLACEHOLDER_SECRETS.contains(&self.jwt_secret.as_str())
    }
}
