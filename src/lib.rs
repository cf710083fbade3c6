//! Extraction of bills of materials (BOMs) from technical drawing scans.
//!
//! The crate detects table regions through structural line geometry, screens
//! them for confidential boilerplate, composites the survivors into one
//! canvas, hands that to a pluggable recognition model (with content-addressed
//! result caching), resolves the recognized rows against a parts catalog and
//! checks order feasibility against inventory.
//!
//! # Architecture
//!
//! ```text
//! DynamicImage
//!     |  normalize_landscape
//!     v
//! SegmentationEngine ---> Vec<TableCrop>
//!     |  SafetyFilter (denylist OCR screen)
//!     v
//! compose_vertical ---> merged canvas
//!     |  RecognitionCache / Recognizer
//!     v
//! RawRows --- IdentifierResolver ---> Vec<ResolvedRow>
//!     |  feasibility::analyze
//!     v
//! FeasibilityReport
//! ```
//!
//! The recognition model, OCR engine, catalog store, embedder and inventory
//! system are external collaborators behind the traits in [`crate::core::traits`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use bom_extract::prelude::*;
//! # fn collaborators() -> (Arc<dyn Recognizer>, Arc<dyn OcrEngine>) { unimplemented!() }
//!
//! # fn main() -> Result<(), BomError> {
//! let (recognizer, ocr) = collaborators();
//! let pipeline = BomPipeline::new(PipelineConfig::default(), recognizer, ocr);
//!
//! let drawing = image::open("drawing.png").map_err(BomError::from)?;
//! match pipeline.extract(drawing)? {
//!     ExtractionOutcome::Extracted { rows, .. } => {
//!         println!("recognized {} rows", rows.rows.len());
//!     }
//!     ExtractionOutcome::NoTablesFound => println!("no BOM on this sheet"),
//!     ExtractionOutcome::AllTablesFiltered => println!("only boilerplate found"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod core;
pub mod domain;
pub mod feasibility;
pub mod pipeline;
pub mod processors;
pub mod resolver;
pub mod utils;

/// Commonly used types, re-exported for convenient glob import.
pub mod prelude {
    pub use crate::cache::{CacheKey, RecognitionCache};
    pub use crate::core::config::{
        CacheConfig, CompositorConfig, FilterPolicy, PipelineConfig, SafetyFilterConfig,
        SegmentationConfig, SplitConfig,
    };
    pub use crate::core::errors::{BomError, Stage};
    pub use crate::core::traits::{
        CatalogStore, Embedder, InventoryProvider, OcrEngine, Recognizer,
    };
    pub use crate::domain::{
        BoundingBox, CatalogEntry, CatalogMatch, ExtractedRow, FeasibilityLine,
        FeasibilityReport, MatchKind, RawRows, ResolvedRow, StockLevel, TableCrop,
    };
    pub use crate::feasibility::{analyze, check_line};
    pub use crate::pipeline::{
        BomPipeline, ExtractionOutcome, SafetyFilter, SegmentationEngine, compose_vertical,
    };
    pub use crate::resolver::IdentifierResolver;
}
