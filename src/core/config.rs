//! Configuration for the extraction pipeline.
//!
//! Every heuristic constant of the segmentation and filtering stages lives
//! here as a named, serde-deserializable field. These are the main tuning
//! surface of the pipeline; change them against golden drawings rather than
//! in isolation.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the table segmentation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentationConfig {
    /// Divisor for structural-line kernel lengths: the horizontal kernel is
    /// `image_width / line_scale` wide, the vertical one
    /// `image_height / line_scale` tall.
    /// Default: 50
    #[serde(default = "SegmentationConfig::default_line_scale")]
    pub line_scale: u32,

    /// Number of erode passes (and matching dilate passes) applied with the
    /// structural-line kernels.
    /// Default: 3
    #[serde(default = "SegmentationConfig::default_line_iterations")]
    pub line_iterations: usize,

    /// Block radius of the adaptive threshold used to binarize the drawing
    /// (window edge is `2 * radius + 1` pixels).
    /// Default: 5
    #[serde(default = "SegmentationConfig::default_adaptive_block_radius")]
    pub adaptive_block_radius: u32,

    /// Width divisor of the horizontal weaving kernel that bridges gaps
    /// between a table's grid intersections (`image_width / divisor`).
    /// Default: 5
    #[serde(default = "SegmentationConfig::default_weave_divisor_x")]
    pub weave_divisor_x: u32,

    /// Height divisor of the vertical weaving kernel
    /// (`image_height / divisor`).
    /// Default: 20
    #[serde(default = "SegmentationConfig::default_weave_divisor_y")]
    pub weave_divisor_y: u32,

    /// Minimum candidate area as a fraction of the source image area.
    /// Default: 0.05
    #[serde(default = "SegmentationConfig::default_min_area_ratio")]
    pub min_area_ratio: f32,

    /// A candidate spanning at least this fraction of both image dimensions
    /// is treated as a whole-page artifact and discarded.
    /// Default: 0.9
    #[serde(default = "SegmentationConfig::default_full_page_ratio")]
    pub full_page_ratio: f32,

    /// Margin in pixels added around the tight joint extent of a crop.
    /// Default: 5
    #[serde(default = "SegmentationConfig::default_crop_margin")]
    pub crop_margin: u32,

    /// Split detection settings for crops holding two merged tables.
    #[serde(default)]
    pub split: SplitConfig,
}

impl SegmentationConfig {
    fn default_line_scale() -> u32 {
        50
    }

    fn default_line_iterations() -> usize {
        3
    }

    fn default_adaptive_block_radius() -> u32 {
        5
    }

    fn default_weave_divisor_x() -> u32 {
        5
    }

    fn default_weave_divisor_y() -> u32 {
        20
    }

    fn default_min_area_ratio() -> f32 {
        0.05
    }

    fn default_full_page_ratio() -> f32 {
        0.9
    }

    fn default_crop_margin() -> u32 {
        5
    }
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            line_scale: Self::default_line_scale(),
            line_iterations: Self::default_line_iterations(),
            adaptive_block_radius: Self::default_adaptive_block_radius(),
            weave_divisor_x: Self::default_weave_divisor_x(),
            weave_divisor_y: Self::default_weave_divisor_y(),
            min_area_ratio: Self::default_min_area_ratio(),
            full_page_ratio: Self::default_full_page_ratio(),
            crop_margin: Self::default_crop_margin(),
            split: SplitConfig::default(),
        }
    }
}

/// Configuration for split detection on a provisional table crop.
///
/// Two side-by-side tables sharing a faint outer border are frequently
/// detected as a single contour; these parameters control the seam search
/// that separates them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Divisor for the horizontal structure kernel (`crop_width / line_scale`).
    /// Smaller values widen the kernel and bridge empty columns inside a
    /// single table.
    /// Default: 15
    #[serde(default = "SplitConfig::default_line_scale")]
    pub line_scale: u32,

    /// Top of the vertical band inspected for seams, as a fraction of crop
    /// height. Rows above it (header text) are ignored.
    /// Default: 0.15
    #[serde(default = "SplitConfig::default_band_top_ratio")]
    pub band_top_ratio: f32,

    /// Bottom of the inspected band, as a fraction of crop height. Rows
    /// below it (shared footers) are ignored.
    /// Default: 0.65
    #[serde(default = "SplitConfig::default_band_bottom_ratio")]
    pub band_bottom_ratio: f32,

    /// A column counts as a gap when its ink coverage within the band is at
    /// most this fraction of the band height.
    /// Default: 0.02
    #[serde(default = "SplitConfig::default_ink_ratio")]
    pub ink_ratio: f32,

    /// Minimum width in pixels for a gap run to qualify as a seam.
    /// Default: 5
    #[serde(default = "SplitConfig::default_min_gap_width")]
    pub min_gap_width: u32,

    /// Seams whose center falls within this fraction of the crop width from
    /// either edge are rejected as artifacts.
    /// Default: 0.15
    #[serde(default = "SplitConfig::default_edge_margin_ratio")]
    pub edge_margin_ratio: f32,
}

impl SplitConfig {
    fn default_line_scale() -> u32 {
        15
    }

    fn default_band_top_ratio() -> f32 {
        0.15
    }

    fn default_band_bottom_ratio() -> f32 {
        0.65
    }

    fn default_ink_ratio() -> f32 {
        0.02
    }

    fn default_min_gap_width() -> u32 {
        5
    }

    fn default_edge_margin_ratio() -> f32 {
        0.15
    }
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            line_scale: Self::default_line_scale(),
            band_top_ratio: Self::default_band_top_ratio(),
            band_bottom_ratio: Self::default_band_bottom_ratio(),
            ink_ratio: Self::default_ink_ratio(),
            min_gap_width: Self::default_min_gap_width(),
            edge_margin_ratio: Self::default_edge_margin_ratio(),
        }
    }
}

/// Behavior of the safety filter when its OCR engine fails on a crop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterPolicy {
    /// Keep the unverified crop and flag the result as uncertain.
    FailOpen,
    /// Drop the crop.
    FailClosed,
}

impl Default for FilterPolicy {
    fn default() -> Self {
        FilterPolicy::FailOpen
    }
}

/// Configuration for the boilerplate safety filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyFilterConfig {
    /// Lowercased substrings whose presence in a crop's OCR text causes the
    /// crop to be dropped (company names, confidentiality markers, revision
    /// stamps).
    #[serde(default = "SafetyFilterConfig::default_denylist")]
    pub denylist: Vec<String>,

    /// What to do with a crop the OCR engine could not read.
    #[serde(default)]
    pub on_ocr_failure: FilterPolicy,
}

impl SafetyFilterConfig {
    fn default_denylist() -> Vec<String> {
        ["gmbh", "vertraulich", "confidential", "version", "drawn", "date"]
            .into_iter()
            .map(str::to_string)
            .collect()
    }
}

impl Default for SafetyFilterConfig {
    fn default() -> Self {
        Self {
            denylist: Self::default_denylist(),
            on_ocr_failure: FilterPolicy::default(),
        }
    }
}

/// Configuration for the compositor that stacks safe crops vertically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositorConfig {
    /// Height in pixels of the blank strip inserted between consecutive
    /// crops.
    /// Default: 20
    #[serde(default = "CompositorConfig::default_separator_height")]
    pub separator_height: u32,
}

impl CompositorConfig {
    fn default_separator_height() -> u32 {
        20
    }
}

impl Default for CompositorConfig {
    fn default() -> Self {
        Self {
            separator_height: Self::default_separator_height(),
        }
    }
}

/// Configuration for the recognition result cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Path of the cache file. A sibling `<path>.lock` file is used for
    /// inter-process mutual exclusion.
    pub path: PathBuf,

    /// Maximum time to wait for the advisory lock before failing with a
    /// lock-timeout error.
    /// Default: 10_000
    #[serde(default = "CacheConfig::default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// When false the cache is a no-op: gets miss, sets are dropped.
    /// Default: true
    #[serde(default = "CacheConfig::default_enabled")]
    pub enabled: bool,
}

impl CacheConfig {
    /// Creates an enabled cache configuration for the given file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout_ms: Self::default_lock_timeout_ms(),
            enabled: Self::default_enabled(),
        }
    }

    fn default_lock_timeout_ms() -> u64 {
        10_000
    }

    fn default_enabled() -> bool {
        true
    }
}

/// Top-level configuration wiring all pipeline stages together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Segmentation engine settings.
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    /// Safety filter settings.
    #[serde(default)]
    pub safety: SafetyFilterConfig,
    /// Compositor settings.
    #[serde(default)]
    pub compositor: CompositorConfig,
    /// Cache settings. `None` disables caching entirely.
    #[serde(default)]
    pub cache: Option<CacheConfig>,
}
