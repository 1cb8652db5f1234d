/// Image loading - the byte source behind the preload queue
///
/// `ImageLoader` abstracts over where image bytes come from so the queue and
/// viewer can be driven by a mock in tests. `FsImageLoader` reads the photo
/// tree produced by the external download step (`image/<team>/PhotoN.jpg`).
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Decoded image handle, cheap to clone and shared by every waiter of a load
#[derive(Clone)]
pub struct ImageHandle(Arc<ImageData>);

struct ImageData {
    url: String,
    bytes: Vec<u8>,
}

impl ImageHandle {
    pub fn new(url: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self(Arc::new(ImageData {
            url: url.into(),
            bytes,
        }))
    }

    pub fn url(&self) -> &str {
        &self.0.url
    }

    pub fn bytes(&self) -> &[u8] {
        &self.0.bytes
    }

    pub fn len(&self) -> usize {
        self.0.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.bytes.is_empty()
    }

    /// True when both handles came from the same load
    pub fn same_as(&self, other: &ImageHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ImageHandle {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl fmt::Debug for ImageHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageHandle")
            .field("url", &self.0.url)
            .field("bytes", &self.0.bytes.len())
            .finish()
    }
}

/// Per-image failure; always recoverable (the viewer shows a placeholder)
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ImageLoadError {
    #[error("image not found: {0}")]
    NotFound(String),

    #[error("failed to read {url}: {message}")]
    Io { url: String, message: String },

    #[error("image is empty: {0}")]
    Empty(String),

    #[error("remote images are not supported: {0}")]
    Unsupported(String),

    #[error("load was abandoned: {0}")]
    Abandoned(String),
}

pub type LoadResult = Result<ImageHandle, ImageLoadError>;

/// Source of image bytes
#[async_trait]
pub trait ImageLoader: Send + Sync {
    async fn load(&self, url: &str) -> LoadResult;
}

/// Loads images from a directory on disk, resolving URLs relative to `root`
pub struct FsImageLoader {
    root: PathBuf,
}

impl FsImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a gallery URL to a file path, ignoring query string and fragment
    fn resolve(&self, url: &str) -> Result<PathBuf, ImageLoadError> {
        if url.contains("://") {
            return Err(ImageLoadError::Unsupported(url.to_string()));
        }
        let path = url.split(['?', '#']).next().unwrap_or_default();
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Err(ImageLoadError::NotFound(url.to_string()));
        }
        Ok(self.root.join(path))
    }
}

#[async_trait]
impl ImageLoader for FsImageLoader {
    async fn load(&self, url: &str) -> LoadResult {
        let path = self.resolve(url)?;
        let bytes = tokio::fs::read(&path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => ImageLoadError::NotFound(url.to_string()),
            _ => ImageLoadError::Io {
                url: url.to_string(),
                message: e.to_string(),
            },
        })?;
        if bytes.is_empty() {
            return Err(ImageLoadError::Empty(url.to_string()));
        }
        tracing::trace!("LOADER: Read {} bytes from {}", bytes.len(), path.display());
        Ok(ImageHandle::new(url, bytes))
    }
}

/// Thumbnail fetch quality; controls the width parameter of preview URLs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreviewQuality {
    Low,
    Medium,
    High,
    #[default]
    Full,
}

impl PreviewQuality {
    pub fn width(self) -> Option<u32> {
        match self {
            PreviewQuality::Low => Some(200),
            PreviewQuality::Medium => Some(400),
            PreviewQuality::High => Some(800),
            PreviewQuality::Full => None,
        }
    }

    /// URL used for grid thumbnails of `url`
    pub fn preview_url(self, url: &str) -> String {
        match self.width() {
            None => url.to_string(),
            Some(w) if url.contains('?') => format!("{}&w={}", url, w),
            Some(w) => format!("{}?w={}", url, w),
        }
    }
}

impl fmt::Display for PreviewQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PreviewQuality::Low => "low",
            PreviewQuality::Medium => "medium",
            PreviewQuality::High => "high",
            PreviewQuality::Full => "full",
        };
        write!(f, "{}", name)
    }
}
