//! # Stage Definition: Recognition Result Cache
//!
//! This stage is considered "Done" when it fulfills the following contract:
//!
//! - **Inputs**: A merged recognition canvas and the identity string of the
//!   recognizer that would process it.
//! - **Outputs**: Previously stored [`RawRows`] for the same canvas and
//!   recognizer, or nothing on a miss.
//! - **Logging**: Debug-level hit/miss tracing; warnings on corrupt state.
//! - **Invariants**:
//!     - Keys are content-addressed: the image hash covers canonical pixel
//!       data, not any file encoding the image arrived in, and the
//!       recognizer identity is hashed, never stored verbatim.
//!     - Every read-modify-write of the store happens under the exclusive
//!       [`FileLock`], and writes are atomic rename-into-place.
//!     - A disabled cache misses on every get and ignores every set.

mod lock;

pub use lock::FileLock;

use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::PathBuf;
use std::time::Duration;

use image::{ImageFormat, RgbImage};
use sha2::{Digest, Sha256};

use crate::core::config::CacheConfig;
use crate::core::errors::BomError;
use crate::domain::RawRows;

/// Content-addressed cache key: hash of the recognizer identity plus the
/// canonical image hash. The identity is hashed rather than embedded
/// verbatim, since identities carry model names and prompt text of arbitrary
/// length; any change to either still invalidates old entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub recognizer: String,
    pub image: String,
}

impl CacheKey {
    /// Builds the key for `image` as processed by the recognizer identified
    /// by `recognizer`.
    pub fn for_image(recognizer: &str, image: &RgbImage) -> Result<Self, BomError> {
        let digest = Sha256::digest(recognizer.as_bytes());
        Ok(Self {
            recognizer: format!("{digest:x}"),
            image: canonical_image_hash(image)?,
        })
    }

    fn file_key(&self) -> String {
        format!("{}:{}", self.recognizer, self.image)
    }
}

/// SHA-256 over a canonical PNG re-encoding of the pixel data. Two images
/// with identical pixels hash identically regardless of the container
/// format they were loaded from.
pub fn canonical_image_hash(image: &RgbImage) -> Result<String, BomError> {
    let mut encoded = Cursor::new(Vec::new());
    image
        .write_to(&mut encoded, ImageFormat::Png)
        .map_err(BomError::ImageEncode)?;

    let digest = Sha256::digest(encoded.into_inner());
    Ok(format!("{digest:x}"))
}

/// File-backed store of recognition results keyed by [`CacheKey`].
///
/// The store is one JSON document; batches are small enough that rewriting
/// the whole document per set stays cheap.
#[derive(Debug)]
pub struct RecognitionCache {
    path: Option<PathBuf>,
    lock_path: PathBuf,
    lock_timeout: Duration,
}

impl RecognitionCache {
    pub fn new(config: &CacheConfig) -> Self {
        let (path, lock_path) = if config.enabled {
            let mut lock_path = config.path.clone().into_os_string();
            lock_path.push(".lock");
            (Some(config.path.clone()), PathBuf::from(lock_path))
        } else {
            (None, PathBuf::new())
        };
        Self {
            path,
            lock_path,
            lock_timeout: Duration::from_millis(config.lock_timeout_ms),
        }
    }

    /// A cache that stores nothing and never hits.
    pub fn disabled() -> Self {
        Self {
            path: None,
            lock_path: PathBuf::new(),
            lock_timeout: Duration::ZERO,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    /// Looks up `key`, returning the stored rows on a hit.
    pub fn get(&self, key: &CacheKey) -> Result<Option<RawRows>, BomError> {
        let Some(path) = &self.path else {
            return Ok(None);
        };
        let _lock = FileLock::acquire(&self.lock_path, self.lock_timeout)?;
        let store = load_store(path)?;
        let hit = store.get(&key.file_key()).cloned();
        tracing::debug!(recognizer = %key.recognizer, hit = hit.is_some(), "cache lookup");
        Ok(hit)
    }

    /// Stores `rows` under `key`, replacing any previous entry.
    pub fn set(&self, key: &CacheKey, rows: &RawRows) -> Result<(), BomError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let _lock = FileLock::acquire(&self.lock_path, self.lock_timeout)?;
        let mut store = load_store(path)?;
        store.insert(key.file_key(), rows.clone());
        write_store(path, &store)?;
        tracing::debug!(recognizer = %key.recognizer, entries = store.len(), "cache updated");
        Ok(())
    }
}

/// Caller must hold the file lock.
fn load_store(path: &std::path::Path) -> Result<BTreeMap<String, RawRows>, BomError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(err) => return Err(err.into()),
    };
    serde_json::from_slice(&bytes)
        .map_err(|err| BomError::cache_corrupt(path.display().to_string(), err))
}

/// Caller must hold the file lock. Writes to a sibling temp file and renames
/// it into place so readers never observe a half-written store.
fn write_store(
    path: &std::path::Path,
    store: &BTreeMap<String, RawRows>,
) -> Result<(), BomError> {
    let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
    let mut temp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer(&mut temp, store)?;
    temp.persist(path).map_err(|err| BomError::Io(err.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ExtractedRow;
    use image::Rgb;

    fn sample_rows() -> RawRows {
        RawRows::new(vec![ExtractedRow {
            position: 1,
            quantity: Some(4.0),
            raw_code: Some("100234".into()),
            description: Some("Sechskantschraube M8".into()),
            unit: Some("Stk".into()),
        }])
    }

    fn canvas(seed: u8) -> RgbImage {
        RgbImage::from_fn(16, 16, |x, y| Rgb([seed, (x % 256) as u8, (y % 256) as u8]))
    }

    fn enabled_cache(dir: &tempfile::TempDir) -> RecognitionCache {
        RecognitionCache::new(&CacheConfig::new(dir.path().join("recognition.json")))
    }

    #[test]
    fn set_then_get_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let cache = enabled_cache(&dir);
        let key = CacheKey::for_image("scripted-v1", &canvas(7)).unwrap();

        assert_eq!(cache.get(&key).unwrap(), None);
        cache.set(&key, &sample_rows()).unwrap();
        assert_eq!(cache.get(&key).unwrap(), Some(sample_rows()));
    }

    #[test]
    fn key_separates_recognizers_and_images() {
        let dir = tempfile::tempdir().unwrap();
        let cache = enabled_cache(&dir);
        let key = CacheKey::for_image("scripted-v1", &canvas(7)).unwrap();
        cache.set(&key, &sample_rows()).unwrap();

        let other_recognizer = CacheKey::for_image("scripted-v2", &canvas(7)).unwrap();
        let other_image = CacheKey::for_image("scripted-v1", &canvas(8)).unwrap();
        assert_eq!(cache.get(&other_recognizer).unwrap(), None);
        assert_eq!(cache.get(&other_image).unwrap(), None);
    }

    #[test]
    fn recognizer_identity_is_hashed_not_embedded() {
        let identity = "bom-recognizer-v3 :: extract every row of the table as JSON";
        let key = CacheKey::for_image(identity, &canvas(7)).unwrap();

        assert_eq!(key.recognizer.len(), 64);
        assert!(key.recognizer.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!key.file_key().contains("extract every row"));

        let other = CacheKey::for_image("bom-recognizer-v3 :: other prompt", &canvas(7)).unwrap();
        assert_ne!(key.recognizer, other.recognizer);
    }

    #[test]
    fn hash_is_stable_across_encodings() {
        let image = canvas(7);
        let mut bmp = Cursor::new(Vec::new());
        image.write_to(&mut bmp, ImageFormat::Bmp).unwrap();
        let reloaded = image::load_from_memory(bmp.get_ref()).unwrap().to_rgb8();

        assert_eq!(
            canonical_image_hash(&image).unwrap(),
            canonical_image_hash(&reloaded).unwrap()
        );
    }

    #[test]
    fn hash_changes_with_any_pixel() {
        let image = canvas(7);
        let mut tweaked = image.clone();
        tweaked.put_pixel(3, 3, Rgb([8, 3, 3]));

        assert_ne!(
            canonical_image_hash(&image).unwrap(),
            canonical_image_hash(&tweaked).unwrap()
        );
    }

    #[test]
    fn corrupt_store_is_reported_not_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recognition.json");
        std::fs::write(&path, b"{ not json").unwrap();

        let cache = RecognitionCache::new(&CacheConfig::new(path));
        let key = CacheKey::for_image("scripted-v1", &canvas(7)).unwrap();
        assert!(matches!(
            cache.get(&key),
            Err(BomError::CacheCorrupt { .. })
        ));
    }

    #[test]
    fn disabled_cache_never_hits() {
        let cache = RecognitionCache::disabled();
        let key = CacheKey::for_image("scripted-v1", &canvas(7)).unwrap();

        cache.set(&key, &sample_rows()).unwrap();
        assert_eq!(cache.get(&key).unwrap(), None);
    }
}
