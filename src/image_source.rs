//! Image loading with a single fallback retry
//!
//! Tiles never surface load errors. A source that fails to load is replaced
//! by the fallback image exactly once; if the fallback fails too the tile
//! stays blank.

use image::RgbaImage;
use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

/// Image shown when a reward's own image cannot be loaded.
pub const DEFAULT_FALLBACK_SOURCE: &str = "/assets/collections/pixel_animals/animal_1lb.png";

/// Why an image could not be loaded.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ImageLoadError {
    /// No image is registered under this source
    #[error("image '{0}' not found")]
    NotFound(String),
    /// File could not be read
    #[error("failed to read image '{source_uri}': {error}")]
    Io {
        source_uri: String,
        #[source]
        error: std::io::Error,
    },
    /// File was read but could not be decoded
    #[error("failed to decode image '{source_uri}': {error}")]
    Decode {
        source_uri: String,
        #[source]
        error: image::ImageError,
    },
}

/// Something that turns an image source URI into decoded pixels.
pub trait ImageLoader {
    fn load(&self, source: &str) -> Result<RgbaImage, ImageLoadError>;
}

/// Loads images from disk, resolving sources relative to an asset root.
///
/// A leading `/` on the source is treated as the asset root, so
/// `/assets/a.png` under root `public` reads `public/assets/a.png`.
#[derive(Debug, Clone)]
pub struct FsImageLoader {
    root: PathBuf,
}

impl FsImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Filesystem path a source resolves to.
    pub fn path_for(&self, source: &str) -> PathBuf {
        let source = Path::new(source);
        if source.is_absolute() && source.exists() {
            return source.to_path_buf();
        }
        self.root.join(source.strip_prefix("/").unwrap_or(source))
    }
}

impl ImageLoader for FsImageLoader {
    fn load(&self, source: &str) -> Result<RgbaImage, ImageLoadError> {
        let path = self.path_for(source);
        let reader = image::io::Reader::open(&path)
            .map_err(|error| ImageLoadError::Io { source_uri: source.to_string(), error })?
            .with_guessed_format()
            .map_err(|error| ImageLoadError::Io { source_uri: source.to_string(), error })?;
        let decoded = reader
            .decode()
            .map_err(|error| ImageLoadError::Decode { source_uri: source.to_string(), error })?;
        Ok(decoded.to_rgba8())
    }
}

/// In-memory loader, mainly for tests and generated previews.
///
/// Records every source it was asked for so callers can verify how many
/// load attempts were made.
#[derive(Debug, Default)]
pub struct MemoryImageLoader {
    images: HashMap<String, RgbaImage>,
    attempts: RefCell<Vec<String>>,
}

impl MemoryImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image under `source`.
    pub fn insert(&mut self, source: impl Into<String>, image: RgbaImage) {
        self.images.insert(source.into(), image);
    }

    /// Builder form of [`MemoryImageLoader::insert`].
    pub fn with(mut self, source: impl Into<String>, image: RgbaImage) -> Self {
        self.insert(source, image);
        self
    }

    /// Sources requested so far, in order.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts.borrow().clone()
    }

    /// How many times `source` was requested.
    pub fn attempts_for(&self, source: &str) -> usize {
        self.attempts.borrow().iter().filter(|s| s.as_str() == source).count()
    }
}

impl ImageLoader for MemoryImageLoader {
    fn load(&self, source: &str) -> Result<RgbaImage, ImageLoadError> {
        self.attempts.borrow_mut().push(source.to_string());
        self.images.get(source).cloned().ok_or_else(|| ImageLoadError::NotFound(source.to_string()))
    }
}

/// Outcome of resolving a tile's image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageStatus {
    /// The requested source loaded
    Loaded,
    /// The requested source failed; the fallback loaded instead
    Fallback,
    /// Neither the source nor the fallback loaded
    Failed,
}

/// A tile's image after load and (at most one) fallback attempt.
#[derive(Debug, Clone)]
pub struct ResolvedImage {
    requested: String,
    resolved: String,
    status: ImageStatus,
    image: Option<RgbaImage>,
}

impl ResolvedImage {
    /// Load `source`, substituting `fallback` once if it fails.
    ///
    /// A source that already is the fallback is not retried.
    pub fn resolve(loader: &dyn ImageLoader, source: &str, fallback: &str) -> Self {
        match loader.load(source) {
            Ok(image) => {
                debug!(source, "image loaded");
                return Self::new(source, source, ImageStatus::Loaded, Some(image));
            }
            Err(e) => warn!(source, error = %e, "image failed to load"),
        }

        if source == fallback {
            return Self::new(source, source, ImageStatus::Failed, None);
        }

        match loader.load(fallback) {
            Ok(image) => Self::new(source, fallback, ImageStatus::Fallback, Some(image)),
            Err(e) => {
                warn!(source, fallback, error = %e, "fallback image failed to load; tile stays blank");
                Self::new(source, fallback, ImageStatus::Failed, None)
            }
        }
    }

    fn new(requested: &str, resolved: &str, status: ImageStatus, image: Option<RgbaImage>) -> Self {
        Self { requested: requested.to_string(), resolved: resolved.to_string(), status, image }
    }

    /// Source the tile asked for.
    pub fn requested(&self) -> &str {
        &self.requested
    }

    /// Source actually in use (the fallback after a failure).
    pub fn resolved(&self) -> &str {
        &self.resolved
    }

    pub fn status(&self) -> ImageStatus {
        self.status
    }

    /// Decoded pixels, `None` when every attempt failed.
    pub fn image(&self) -> Option<&RgbaImage> {
        self.image.as_ref()
    }
}
