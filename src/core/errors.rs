//! Error types for the BOM extraction pipeline.
//!
//! This module defines the error taxonomy for the pipeline: image errors,
//! per-stage processing failures, collaborator call failures, cache lock
//! timeouts and cache corruption. Lock timeout and corruption are distinct
//! variants so callers can tell "cache busy" apart from "cache corrupt".

use thiserror::Error;

/// Enum naming the pipeline stage an error occurred in.
///
/// Attached to processing and collaborator errors so callers can apply
/// per-stage policies (e.g. retry a recognizer call but not a segmentation
/// failure) without parsing error text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Table region detection and cropping.
    Segmentation,
    /// Boilerplate screening of table crops.
    SafetyFilter,
    /// Vertical composition of safe crops.
    Compositing,
    /// The external recognition model call.
    Recognition,
    /// Catalog store queries made by the resolver.
    CatalogQuery,
    /// Inventory lookups made by the feasibility check.
    InventoryQuery,
    /// Cache file access.
    Cache,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Stage::Segmentation => write!(f, "segmentation"),
            Stage::SafetyFilter => write!(f, "safety filter"),
            Stage::Compositing => write!(f, "compositing"),
            Stage::Recognition => write!(f, "recognition"),
            Stage::CatalogQuery => write!(f, "catalog query"),
            Stage::InventoryQuery => write!(f, "inventory query"),
            Stage::Cache => write!(f, "cache"),
        }
    }
}

/// Errors produced by the extraction pipeline and its collaborators.
#[derive(Error, Debug)]
pub enum BomError {
    /// Error occurred while loading or decoding an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// Error occurred while re-encoding an image (canonical hashing).
    #[error("image encode")]
    ImageEncode(#[source] image::ImageError),

    /// A pipeline stage failed while processing.
    #[error("{stage} failed: {context}")]
    Stage {
        /// The stage where the error occurred.
        stage: Stage,
        /// Additional context about the failure.
        context: String,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// An external collaborator call (recognizer, catalog, inventory, OCR
    /// engine) failed. Propagated as-is; retry policy belongs to the caller.
    #[error("collaborator call failed during {stage}")]
    Collaborator {
        /// The stage that made the call.
        stage: Stage,
        /// The underlying error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// The cache's advisory lock could not be acquired within the timeout.
    #[error("cache lock timed out after {timeout_ms} ms")]
    LockTimeout {
        /// The configured acquisition timeout.
        timeout_ms: u64,
    },

    /// The cache file exists but could not be deserialized.
    #[error("cache corrupt: {context}")]
    CacheCorrupt {
        /// Path or other context identifying the corrupt store.
        context: String,
        /// The underlying parse error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// IO error.
    #[error("io")]
    Io(#[from] std::io::Error),

    /// Serialization error outside the cache read path.
    #[error("serialization")]
    Serialization(#[from] serde_json::Error),
}

impl BomError {
    /// Creates a stage-tagged processing error.
    pub fn stage_error(
        stage: Stage,
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Stage {
            stage,
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates an error for a failed collaborator call.
    pub fn collaborator(
        stage: Stage,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Collaborator {
            stage,
            source: Box::new(error),
        }
    }

    /// Creates a collaborator error from a plain message, for implementations
    /// that do not carry a structured error type.
    pub fn collaborator_msg(stage: Stage, message: impl Into<String>) -> Self {
        Self::Collaborator {
            stage,
            source: message.into().into(),
        }
    }

    /// Creates an error for invalid input.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a cache corruption error.
    pub fn cache_corrupt(
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::CacheCorrupt {
            context: context.into(),
            source: Box::new(error),
        }
    }
}

impl From<image::ImageError> for BomError {
    fn from(error: image::ImageError) -> Self {
        Self::ImageLoad(error)
    }
}
