//! Core error handling, configuration and collaborator traits.

pub mod config;
pub mod errors;
pub mod traits;

pub use config::{
    CacheConfig, CompositorConfig, FilterPolicy, PipelineConfig, SafetyFilterConfig,
    SegmentationConfig, SplitConfig,
};
pub use errors::{BomError, Stage};
pub use traits::{CatalogStore, Embedder, InventoryProvider, OcrEngine, Recognizer};
