//! Collaborator interfaces for the external services the pipeline calls.
//!
//! The recognition model, the boilerplate OCR engine, the catalog store, the
//! embedding service and the inventory API are all out of scope for this
//! crate and appear only as traits. Implementations perform blocking I/O;
//! callers that need timeouts must impose them around the calls.

use crate::core::errors::BomError;
use crate::domain::{CatalogEntry, RawRows, StockLevel};
use image::{GrayImage, RgbImage};

/// The opaque recognition model the merged BOM image is handed to.
pub trait Recognizer: Send + Sync {
    /// Stable identity of the model and its prompt. Hashed into cache keys
    /// so that changing the extraction model invalidates stale entries.
    fn identity(&self) -> String;

    /// Recognizes the rows of the merged BOM image. Failures surface as a
    /// structured error, never a panic.
    fn recognize(&self, image: &RgbImage) -> Result<RawRows, BomError>;
}

/// Lightweight OCR used by the safety filter to read boilerplate text out of
/// a binarized crop. Implementations should treat the input as a single
/// uniform text block.
pub trait OcrEngine: Send + Sync {
    /// Returns the plain text visible in the image.
    fn read_text(&self, image: &GrayImage) -> Result<String, BomError>;
}

/// Read-only queries against the relational catalog and its attached
/// similarity index.
///
/// Substring semantics: code and name fields are compared after the same
/// normalization the resolver applies to queries (whitespace stripped,
/// lowercased); text fields are compared case-insensitively.
pub trait CatalogStore: Send + Sync {
    /// Entries whose normalized code or display name occurs inside
    /// `normalized_query`. The resolver applies the code-length guard and
    /// picks among the candidates.
    fn find_code_candidates(&self, normalized_query: &str)
    -> Result<Vec<CatalogEntry>, BomError>;

    /// First entry whose display name or description contains `needle`.
    fn first_entry_with_text(&self, needle: &str) -> Result<Option<CatalogEntry>, BomError>;

    /// Entry nearest to `vector` in the similarity index, or `None` when the
    /// index is empty.
    fn nearest_by_embedding(&self, vector: &[f32]) -> Result<Option<CatalogEntry>, BomError>;
}

/// Embeds free text into the same vector space as the catalog's similarity
/// index.
pub trait Embedder: Send + Sync {
    /// Embeds `text`. Implementations decide how to treat empty input.
    fn embed(&self, text: &str) -> Result<Vec<f32>, BomError>;
}

/// Stock lookups against the external inventory system.
pub trait InventoryProvider: Send + Sync {
    /// Current stock and minimum-stock threshold for a catalog entry.
    fn stock_level(&self, catalog_id: i64) -> Result<StockLevel, BomError>;
}
