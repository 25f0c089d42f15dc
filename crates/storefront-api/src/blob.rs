use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use bytes::Bytes;
use serde::Deserialize;
use tokio::fs;
use tracing::{debug, info};
use uuid::Uuid;

/// Upload options. Every blob is publicly readable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PutOptions {
    pub add_random_suffix: bool,
    pub content_type: Option<String>,
}

impl PutOptions {
    /// Public blob stored under exactly the requested path.
    pub fn public(content_type: Option<&str>) -> Self {
        Self {
            add_random_suffix: false,
            content_type: content_type.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PutBlobResult {
    pub url: String,
    pub pathname: String,
}

/// Object storage for uploaded images.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, path: &str, bytes: Bytes, options: PutOptions) -> Result<PutBlobResult>;
}

/// Resolve `relative` under `base`, refusing anything that could escape it.
fn ensure_within(base: &Path, relative: &str) -> Result<PathBuf> {
    let mut resolved = base.to_path_buf();
    let mut depth = 0;
    for component in Path::new(relative).components() {
        match component {
            Component::Normal(c) => {
                resolved.push(c);
                depth += 1;
            }
            Component::CurDir => {}
            _ => bail!("Path traversal detected in blob path '{}'", relative),
        }
    }
    if depth == 0 {
        bail!("Empty blob path");
    }
    Ok(resolved)
}

fn with_random_suffix(path: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    let suffix = &suffix[..8];
    match path.rsplit_once('.') {
        Some((stem, ext)) if !ext.contains('/') && !stem.ends_with('/') => format!("{stem}-{suffix}.{ext}"),
        _ => format!("{path}-{suffix}"),
    }
}

/// Files on local disk, served back under `public_base_url`.
pub struct LocalBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl LocalBlobStore {
    pub async fn new(root: PathBuf, public_base_url: impl Into<String>) -> Result<Self> {
        fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create media directory '{}'", root.display()))?;

        info!(path = %root.display(), "Local blob store initialized");

        Ok(Self {
            root,
            public_base_url: public_base_url.into(),
        })
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, path: &str, bytes: Bytes, options: PutOptions) -> Result<PutBlobResult> {
        let pathname = if options.add_random_suffix {
            with_random_suffix(path)
        } else {
            path.to_string()
        };
        let target = ensure_within(&self.root, &pathname)?;

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&target, &bytes)
            .await
            .with_context(|| format!("Failed to write blob '{}'", pathname))?;

        debug!(path = %pathname, size = bytes.len(), "Stored blob");
        Ok(PutBlobResult {
            url: format!("{}/{}", self.public_base_url.trim_end_matches('/'), pathname),
            pathname,
        })
    }
}

/// Remote object store speaking a plain `PUT <endpoint>/<path>` protocol.
pub struct HttpBlobStore {
    client: reqwest::Client,
    endpoint: String,
    token: String,
}

impl HttpBlobStore {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            token: token.into(),
        }
    }
}

#[async_trait]
impl BlobStore for HttpBlobStore {
    async fn put(&self, path: &str, bytes: Bytes, options: PutOptions) -> Result<PutBlobResult> {
        let url = format!("{}/{}", self.endpoint.trim_end_matches('/'), path);
        let size = bytes.len();

        let mut request = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .header("x-add-random-suffix", if options.add_random_suffix { "1" } else { "0" })
            .body(bytes);
        if let Some(content_type) = &options.content_type {
            request = request.header("x-content-type", content_type);
        }

        let result = request
            .send()
            .await
            .with_context(|| format!("Blob upload to {} failed", url))?
            .error_for_status()?
            .json::<PutBlobResult>()
            .await
            .context("Blob store returned an unreadable response")?;

        debug!(path = %result.pathname, size, "Uploaded blob");
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_root(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("storefront_blob_{}_{}", name, Uuid::new_v4()))
    }

    #[test]
    fn traversal_is_refused() {
        let base = Path::new("/srv/media");
        assert!(ensure_within(base, "../etc/passwd").is_err());
        assert!(ensure_within(base, "avatars/../../x").is_err());
        assert!(ensure_within(base, "/etc/passwd").is_err());
        assert!(ensure_within(base, "").is_err());
        assert_eq!(
            ensure_within(base, "avatars/user_1_2.png").unwrap(),
            PathBuf::from("/srv/media/avatars/user_1_2.png")
        );
    }

    #[test]
    fn random_suffix_goes_before_extension() {
        let path = with_random_suffix("avatars/a.png");
        assert!(path.starts_with("avatars/a-"));
        assert!(path.ends_with(".png"));
        assert_eq!(path.len(), "avatars/a-".len() + 8 + ".png".len());
    }

    #[tokio::test]
    async fn local_store_writes_under_root() {
        let root = temp_root("write");
        let store = LocalBlobStore::new(root.clone(), "http://localhost:3000/media/")
            .await
            .unwrap();

        let result = store
            .put("avatars/user_1_5.png", Bytes::from_static(b"png"), PutOptions::public(Some("image/png")))
            .await
            .unwrap();

        assert_eq!(result.pathname, "avatars/user_1_5.png");
        assert_eq!(result.url, "http://localhost:3000/media/avatars/user_1_5.png");
        assert_eq!(std::fs::read(root.join("avatars/user_1_5.png")).unwrap(), b"png");

        let _ = std::fs::remove_dir_all(&root);
    }

    #[tokio::test]
    async fn local_store_rejects_escape() {
        let root = temp_root("escape");
        let store = LocalBlobStore::new(root.clone(), "http://x").await.unwrap();
        let err = store
            .put("../outside.png", Bytes::from_static(b"x"), PutOptions::default())
            .await;
        assert!(err.is_err());
        let _ = std::fs::remove_dir_all(&root);
    }
}
