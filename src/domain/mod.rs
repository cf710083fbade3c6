//! Domain types shared across the extraction pipeline.
//!
//! Transient image-side types (bounding boxes, table candidates and crops)
//! live next to the row-side types produced by recognition and resolution
//! (`RawRows`, `ResolvedRow`, `FeasibilityLine`). Image-side values are
//! request-scoped and discarded after the recognizer call; only `RawRows`
//! is persisted (into the cache).

use serde::{Deserialize, Serialize};

/// Schema tag written into [`RawRows`]. The recognizer's row shape is an
/// external, evolving contract; bump this tag when the shape changes so
/// stale cache entries and consumers can detect the mismatch.
pub const RAW_ROWS_SCHEMA: &str = "bom-rows/v1";

/// Axis-aligned rectangle in pixel coordinates, always within the extent of
/// the image it was built against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl BoundingBox {
    /// Creates a bounding box without clamping.
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Builds a box from corner coordinates (which may extend past the image
    /// or below zero) clamped to an `image_width` x `image_height` extent.
    pub fn from_corners_clamped(
        left: i64,
        top: i64,
        right: i64,
        bottom: i64,
        image_width: u32,
        image_height: u32,
    ) -> Self {
        let x = left.clamp(0, i64::from(image_width)) as u32;
        let y = top.clamp(0, i64::from(image_height)) as u32;
        let right = right.clamp(0, i64::from(image_width)) as u32;
        let bottom = bottom.clamp(0, i64::from(image_height)) as u32;
        Self {
            x,
            y,
            width: right.saturating_sub(x),
            height: bottom.saturating_sub(y),
        }
    }

    /// Area in pixels.
    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// A detected table-like region: the contour bounding box plus the grid-line
/// intersections ("joints") found strictly inside it.
#[derive(Debug, Clone)]
pub struct TableCandidate {
    /// Bounding box of the woven contour, in source image coordinates.
    pub bbox: BoundingBox,
    /// Joint pixel coordinates inside `bbox`, in source image coordinates.
    pub joints: Vec<(u32, u32)>,
}

impl TableCandidate {
    /// Tight extent of the joints, or `None` when the candidate has no
    /// joints (a contour with area but no detectable grid).
    pub fn joint_extent(&self) -> Option<BoundingBox> {
        let (mut min_x, mut min_y) = (u32::MAX, u32::MAX);
        let (mut max_x, mut max_y) = (0u32, 0u32);
        for &(x, y) in &self.joints {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        if self.joints.is_empty() {
            None
        } else {
            Some(BoundingBox::new(
                min_x,
                min_y,
                max_x - min_x + 1,
                max_y - min_y + 1,
            ))
        }
    }
}

/// A tightly cropped table region ready for filtering and composition.
#[derive(Debug, Clone)]
pub struct TableCrop {
    /// Pixel data of the crop.
    pub image: image::RgbImage,
    /// Where the crop came from in the (landscape-normalized) source image.
    pub region: BoundingBox,
}

/// One row as the recognition model returned it, before catalog resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRow {
    /// Position number within the BOM table.
    pub position: u32,
    /// Required per-unit quantity, when the recognizer could read one.
    pub quantity: Option<f64>,
    /// Part code as printed in the drawing, possibly noisy.
    pub raw_code: Option<String>,
    /// Free-text description of the part.
    pub description: Option<String>,
    /// Unit of measure, e.g. "pcs" or "m".
    pub unit: Option<String>,
}

/// The recognizer's full output for one merged BOM image. This is the unit
/// stored in the cache, pre-enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRows {
    /// Row-shape schema tag, see [`RAW_ROWS_SCHEMA`].
    pub schema: String,
    /// Recognized rows in table order.
    pub rows: Vec<ExtractedRow>,
}

impl RawRows {
    /// Wraps rows under the current schema tag.
    pub fn new(rows: Vec<ExtractedRow>) -> Self {
        Self {
            schema: RAW_ROWS_SCHEMA.to_string(),
            rows,
        }
    }
}

/// A canonical catalog record, owned by the external catalog store and
/// queried read-only by the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// ERP-internal identifier.
    pub internal_id: i64,
    /// External part code as ordered by customers.
    pub external_code: String,
    /// Display name.
    pub display_name: String,
    /// Free-text description.
    pub description: String,
    /// Embedding of the entry's searchable text, used for nearest-neighbour
    /// queries. May be empty when the store has no similarity index.
    #[serde(default)]
    pub embedding: Vec<f32>,
}

/// Which resolver strategy produced a match, recorded for auditability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchKind {
    /// Normalized part code matched a catalog code or name.
    ExactId,
    /// The raw code was found inside a catalog name or description.
    IdInText,
    /// The description substring-matched a catalog name or description.
    TextMatch,
    /// Nearest neighbour by embedding distance.
    VectorMatch,
    /// Every strategy failed. A normal outcome, not an error.
    NotFound,
}

impl std::fmt::Display for MatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchKind::ExactId => write!(f, "EXACT_ID"),
            MatchKind::IdInText => write!(f, "ID_IN_TEXT"),
            MatchKind::TextMatch => write!(f, "TEXT_MATCH"),
            MatchKind::VectorMatch => write!(f, "VECTOR_MATCH"),
            MatchKind::NotFound => write!(f, "NOT_FOUND"),
        }
    }
}

/// A successful catalog lookup, tagged with the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogMatch {
    /// The matched catalog record.
    pub entry: CatalogEntry,
    /// The strategy that succeeded.
    pub kind: MatchKind,
}

/// An extracted row enriched with its catalog resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRow {
    /// The recognized row.
    pub row: ExtractedRow,
    /// ERP-internal id of the matched catalog entry, if any.
    pub matched_id: Option<i64>,
    /// Strategy that produced the match, or `NotFound`.
    pub match_kind: MatchKind,
}

/// Stock figures for one catalog entry, as reported by the inventory
/// collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StockLevel {
    /// Sellable quantity currently in stock.
    pub stock: f64,
    /// Configured minimum stock threshold.
    pub min_stock: f64,
}

/// Required-versus-available result for one resolved row.
#[derive(Debug, Clone, PartialEq)]
pub struct FeasibilityLine {
    /// The row the figures apply to.
    pub row: ResolvedRow,
    /// Per-unit quantity times the order multiplier.
    pub required_total: f64,
    /// Stock available at lookup time.
    pub in_stock: f64,
    /// Minimum stock threshold for the part.
    pub min_stock: f64,
    /// Whether the requirement can be covered from stock.
    pub feasible: bool,
    /// Present when the line is infeasible or fulfilling it would dip below
    /// the minimum stock.
    pub warning: Option<String>,
}

/// Feasibility results for a whole BOM.
#[derive(Debug, Clone, PartialEq)]
pub struct FeasibilityReport {
    /// One line per resolved row, in input order.
    pub lines: Vec<FeasibilityLine>,
    /// True when every line is feasible.
    pub feasible: bool,
}

impl FeasibilityReport {
    /// Lines that cannot be covered from stock.
    pub fn missing(&self) -> impl Iterator<Item = &FeasibilityLine> {
        self.lines.iter().filter(|line| !line.feasible)
    }
}
