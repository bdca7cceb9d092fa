//! Trait-based image loading.
//!
//! Each supported file format implements the [`ImageLoader`] trait;
//! [`LoaderRegistry`] dispatches on extension, then magic bytes, then
//! falls back to trying every loader. [`ImageStore`] sits on top of the
//! registry and holds the most recently loaded image for extraction.

use std::path::{Path, PathBuf};

use ndarray::Array2;
use thiserror::Error;

use crate::data::ImageData;
use crate::model::Region;

/// Errors from image loading.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The path does not resolve to a readable file.
    #[error("image not found: {path:?}")]
    NotFound {
        /// Path that failed to resolve.
        path: PathBuf,
    },

    /// I/O failure while reading the file.
    #[error("IO error reading {path:?}: {source}")]
    Io {
        /// Path being read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The bytes were recognized by a loader but could not be parsed as a
    /// single-frame 2D numeric image.
    #[error("[{loader}] {message}")]
    Format {
        /// Loader that rejected the data.
        loader: &'static str,
        /// Description of the parse failure.
        message: String,
    },

    /// No registered loader could handle the data.
    #[error("no loader could handle the data (file: {filename})")]
    Unsupported {
        /// Filename the data came from, or `"<bytes>"`.
        filename: String,
    },
}

impl LoadError {
    /// Create a format error attributed to a loader.
    pub fn format(loader: &'static str, message: impl Into<String>) -> Self {
        Self::Format {
            loader,
            message: message.into(),
        }
    }
}

/// Trait for single-frame 2D image format loaders.
pub trait ImageLoader: Send + Sync {
    /// Unique identifier for this loader (e.g. "npy", "raster").
    fn id(&self) -> &'static str;

    /// Human-readable name for display.
    fn display_name(&self) -> &'static str;

    /// File extensions this loader handles (lowercase, without dots).
    fn extensions(&self) -> &'static [&'static str];

    /// Check whether this loader can likely handle the given data.
    ///
    /// Used for format auto-detection when the extension is unknown or
    /// ambiguous. Implementations should check magic bytes or headers.
    fn can_load(&self, data: &[u8]) -> bool;

    /// Load a single-frame 2D image from raw bytes.
    fn load(&self, data: &[u8]) -> Result<ImageData, LoadError>;

    /// Load a single-frame 2D image from a file path.
    ///
    /// The default reads the file and delegates to [`load`](Self::load);
    /// formats whose backing parser is file-based override this.
    fn load_path(&self, path: &Path) -> Result<ImageData, LoadError> {
        let data = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load(&data)
    }

    /// Priority for format detection (higher = checked first).
    fn priority(&self) -> i32 {
        0
    }
}

/// Registry of available image loaders.
///
/// Provides format detection and a unified loading interface.
pub struct LoaderRegistry {
    loaders: Vec<Box<dyn ImageLoader>>,
}

impl LoaderRegistry {
    /// Create a registry with all built-in loaders.
    pub fn new() -> Self {
        let mut registry = Self {
            loaders: Vec::new(),
        };

        registry.register(Box::new(super::loaders::NpyLoader));
        registry.register(Box::new(super::loaders::FitsLoader));
        registry.register(Box::new(super::loaders::RasterLoader));

        registry
    }

    /// Register a loader, keeping the list sorted by priority.
    pub fn register(&mut self, loader: Box<dyn ImageLoader>) {
        self.loaders.push(loader);
        self.loaders.sort_by(|a, b| b.priority().cmp(&a.priority()));
    }

    /// All supported file extensions (for file filtering).
    pub fn supported_extensions(&self) -> Vec<&'static str> {
        let mut extensions: Vec<&'static str> = self
            .loaders
            .iter()
            .flat_map(|l| l.extensions().iter().copied())
            .collect();
        extensions.sort_unstable();
        extensions.dedup();
        extensions
    }

    /// Check if a filename has a supported extension.
    pub fn is_supported_file(&self, filename: &str) -> bool {
        let lower = filename.to_lowercase();
        self.supported_extensions()
            .iter()
            .any(|ext| lower.ends_with(&format!(".{ext}")))
    }

    fn loaders_for_extension(&self, ext: &str) -> Vec<&dyn ImageLoader> {
        let ext_lower = ext.to_lowercase();
        self.loaders
            .iter()
            .filter(|l| l.extensions().contains(&ext_lower.as_str()))
            .map(|l| l.as_ref())
            .collect()
    }

    fn detect_loader(&self, data: &[u8]) -> Option<&dyn ImageLoader> {
        self.loaders
            .iter()
            .find(|l| l.can_load(data))
            .map(|l| l.as_ref())
    }

    /// Load an image from raw bytes, auto-detecting the format.
    ///
    /// Tries loaders in this order:
    /// 1. By file extension (if a filename is provided)
    /// 2. By magic-byte detection
    /// 3. All loaders as fallback
    ///
    /// Formats whose parser is file-based (FITS) are only reachable
    /// through [`load_path`](Self::load_path).
    pub fn load_bytes(
        &self,
        data: &[u8],
        filename: Option<&str>,
    ) -> Result<ImageData, LoadError> {
        let extension = filename.and_then(|f| f.rsplit('.').next().map(str::to_lowercase));

        let mut last_format_error = None;

        if let Some(ref ext) = extension {
            for loader in self.loaders_for_extension(ext) {
                match loader.load(data) {
                    Ok(image) => {
                        log::debug!("Loaded with {} loader (by extension)", loader.id());
                        return Ok(image);
                    }
                    Err(e) => {
                        log::trace!("Loader {} failed: {}", loader.id(), e);
                        last_format_error = Some(e);
                    }
                }
            }
        }

        if let Some(loader) = self.detect_loader(data) {
            match loader.load(data) {
                Ok(image) => {
                    log::debug!("Loaded with {} loader (by detection)", loader.id());
                    return Ok(image);
                }
                Err(e) => {
                    log::trace!("Detected loader {} failed: {}", loader.id(), e);
                    last_format_error = Some(e);
                }
            }
        }

        for loader in &self.loaders {
            if let Ok(image) = loader.load(data) {
                log::debug!("Loaded with {} loader (fallback)", loader.id());
                return Ok(image);
            }
        }

        // A loader claimed the data but rejected its content: surface that
        // parse failure rather than a generic unsupported error.
        Err(last_format_error.unwrap_or_else(|| LoadError::Unsupported {
            filename: filename.unwrap_or("<bytes>").to_string(),
        }))
    }

    /// Load an image from a file path.
    ///
    /// Fails with [`LoadError::NotFound`] if the path does not resolve to a
    /// readable file. Dispatch order matches [`load_bytes`](Self::load_bytes)
    /// (extension, magic bytes, fallback), but goes through each loader's
    /// `load_path` so file-based parsers can read the file themselves.
    pub fn load_path(&self, path: &Path) -> Result<ImageData, LoadError> {
        if !path.exists() {
            return Err(LoadError::NotFound {
                path: path.to_path_buf(),
            });
        }
        let data = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let filename = path.file_name().and_then(|n| n.to_str());
        let extension = filename.and_then(|f| f.rsplit('.').next().map(str::to_lowercase));

        let mut last_format_error = None;

        if let Some(ref ext) = extension {
            for loader in self.loaders_for_extension(ext) {
                match loader.load_path(path) {
                    Ok(image) => {
                        log::debug!("Loaded with {} loader (by extension)", loader.id());
                        return Ok(image);
                    }
                    Err(e) => {
                        log::trace!("Loader {} failed: {}", loader.id(), e);
                        last_format_error = Some(e);
                    }
                }
            }
        }

        if let Some(loader) = self.detect_loader(&data) {
            match loader.load_path(path) {
                Ok(image) => {
                    log::debug!("Loaded with {} loader (by detection)", loader.id());
                    return Ok(image);
                }
                Err(e) => {
                    log::trace!("Detected loader {} failed: {}", loader.id(), e);
                    last_format_error = Some(e);
                }
            }
        }

        for loader in &self.loaders {
            if let Ok(image) = loader.load_path(path) {
                log::debug!("Loaded with {} loader (fallback)", loader.id());
                return Ok(image);
            }
        }

        Err(last_format_error.unwrap_or_else(|| LoadError::Unsupported {
            filename: filename.unwrap_or("<unnamed>").to_string(),
        }))
    }

    /// All registered loaders.
    pub fn loaders(&self) -> &[Box<dyn ImageLoader>] {
        &self.loaders
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Loads images from disk and slices regions out of the current one.
///
/// The store holds only the most recently loaded image; each load replaces
/// the prior state, and there is no cross-file cache. Callers that need
/// concurrent computations give each computation its own store.
pub struct ImageStore {
    registry: LoaderRegistry,
    current: Option<ImageData>,
}

impl ImageStore {
    /// Create a store with the built-in loader registry.
    pub fn new() -> Self {
        Self::with_registry(LoaderRegistry::new())
    }

    /// Create a store with a custom loader registry.
    pub fn with_registry(registry: LoaderRegistry) -> Self {
        Self {
            registry,
            current: None,
        }
    }

    /// The loader registry backing this store.
    pub fn registry(&self) -> &LoaderRegistry {
        &self.registry
    }

    /// Load an image, replacing the currently held one.
    ///
    /// On failure the previously loaded image is left untouched.
    pub fn load(&mut self, path: &Path) -> Result<&ImageData, LoadError> {
        let image = self.registry.load_path(path)?;
        log::info!(
            "Loaded {:?}: {}x{}",
            path,
            image.width(),
            image.height()
        );
        Ok(self.current.insert(image))
    }

    /// The most recently loaded image, if any.
    pub fn current(&self) -> Option<&ImageData> {
        self.current.as_ref()
    }

    /// Extract a region from the current image.
    ///
    /// With no image loaded this yields the empty array, the same "no
    /// samples contributed" value as a zero-area region.
    pub fn extract(&self, region: &Region) -> Array2<f32> {
        match &self.current {
            Some(image) => image.extract(region),
            None => Array2::zeros((0, 0)),
        }
    }
}

impl Default for ImageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    use ndarray_npy::WriteNpyExt;

    fn write_npy_fixture(dir: &Path, name: &str, array: &Array2<f32>) -> PathBuf {
        let path = dir.join(name);
        let file = std::fs::File::create(&path).unwrap();
        array.write_npy(file).unwrap();
        path
    }

    #[test]
    fn test_load_missing_file_is_not_found() {
        let store = LoaderRegistry::new();
        let err = store.load_path(Path::new("/no/such/file.npy")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[test]
    fn test_load_unparseable_file_is_format_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("garbage.npy");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(b"not an image at all").unwrap();

        let err = LoaderRegistry::new().load_path(&path).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Format { .. } | LoadError::Unsupported { .. }
        ));
    }

    #[test]
    fn test_store_load_replaces_current() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_npy_fixture(dir.path(), "a.npy", &Array2::zeros((4, 6)));
        let b = write_npy_fixture(dir.path(), "b.npy", &Array2::zeros((2, 3)));

        let mut store = ImageStore::new();
        assert!(store.current().is_none());

        store.load(&a).unwrap();
        assert_eq!(store.current().unwrap().width(), 6);

        store.load(&b).unwrap();
        assert_eq!(store.current().unwrap().width(), 3);
    }

    #[test]
    fn test_store_failed_load_keeps_prior_image() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_npy_fixture(dir.path(), "a.npy", &Array2::zeros((4, 6)));

        let mut store = ImageStore::new();
        store.load(&a).unwrap();
        assert!(store.load(Path::new("/missing.npy")).is_err());
        assert_eq!(store.current().unwrap().width(), 6);
    }

    #[test]
    fn test_store_extract_without_image_is_empty() {
        let store = ImageStore::new();
        assert_eq!(store.extract(&Region::new(0, 0, 5, 5)).len(), 0);
    }

    #[test]
    fn test_supported_extensions() {
        let registry = LoaderRegistry::new();
        assert!(registry.is_supported_file("scan.npy"));
        assert!(registry.is_supported_file("frame.PNG"));
        assert!(registry.is_supported_file("obs.fits"));
        assert!(!registry.is_supported_file("notes.txt"));
    }
}
