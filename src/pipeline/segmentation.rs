//! # Stage Definition: Table Segmentation
//!
//! This stage is considered "Done" when it fulfills the following contract:
//!
//! - **Inputs**: One landscape-normalized `image::RgbImage` of a technical drawing.
//! - **Outputs**: `Vec<TableCrop>` with each crop tightly bounded to a table's grid
//!   joints plus a small margin, split into two crops where two tables were merged
//!   into one detected region.
//! - **Logging**: Traces candidate counts, discarded candidates and split decisions.
//! - **Invariants**:
//!     - No emitted candidate has a contour box smaller than `min_area_ratio` of the
//!       image, or spanning `full_page_ratio` of both dimensions.
//!     - Crop regions are always clamped to the source image extent.
//!     - A candidate whose box contains no joints is dropped, never emitted empty.

use crate::core::config::SegmentationConfig;
use crate::core::errors::BomError;
use crate::domain::{BoundingBox, TableCandidate, TableCrop};
use crate::processors::{
    adaptive_ink_mask, column_ink_counts, dilate_horizontal, dilate_rect, dilate_vertical,
    erode_horizontal, erode_vertical, gap_groups, intersect, otsu_ink_mask, to_gray,
};
use image::{GrayImage, RgbImage};
use imageproc::contours::{BorderType, find_contours};

/// Detects table-like regions in a drawing via structural line geometry and
/// returns them as tight crops.
#[derive(Debug, Clone)]
pub struct SegmentationEngine {
    config: SegmentationConfig,
}

impl SegmentationEngine {
    /// Creates an engine with the given configuration.
    pub fn new(config: SegmentationConfig) -> Self {
        Self { config }
    }

    /// Finds all table regions of `image` and returns their crops in contour
    /// order. An image without any table yields an empty vector, not an
    /// error.
    pub fn segment(&self, image: &RgbImage) -> Result<Vec<TableCrop>, BomError> {
        let (img_w, img_h) = image.dimensions();
        if img_w == 0 || img_h == 0 {
            return Err(BomError::invalid_input("drawing image has zero extent"));
        }

        let gray = to_gray(image);
        let ink = adaptive_ink_mask(&gray, self.config.adaptive_block_radius);
        let joints = self.extract_joints(&ink, img_w, img_h);
        let woven = self.weave(&joints, img_w, img_h);

        let contours = find_contours::<u32>(&woven);
        let min_area = f64::from(img_w) * f64::from(img_h) * f64::from(self.config.min_area_ratio);
        let full_w = self.config.full_page_ratio * img_w as f32;
        let full_h = self.config.full_page_ratio * img_h as f32;

        tracing::debug!(
            candidates = contours.len(),
            "examining woven contour candidates"
        );

        let mut crops = Vec::new();
        for contour in contours
            .iter()
            .filter(|c| c.border_type == BorderType::Outer)
        {
            let Some(bbox) = bbox_of_points(&contour.points) else {
                continue;
            };
            if (bbox.area() as f64) < min_area {
                tracing::debug!(?bbox, "discarding candidate below minimum area");
                continue;
            }
            if bbox.width as f32 >= full_w && bbox.height as f32 >= full_h {
                tracing::debug!(?bbox, "discarding whole-page candidate");
                continue;
            }

            let candidate = TableCandidate {
                bbox,
                joints: joints_within(&joints, &bbox),
            };
            let Some(extent) = candidate.joint_extent() else {
                tracing::warn!(?bbox, "candidate has area but no joints inside; dropping");
                continue;
            };

            let margin = i64::from(self.config.crop_margin);
            let region = BoundingBox::from_corners_clamped(
                i64::from(extent.x) - margin,
                i64::from(extent.y) - margin,
                i64::from(extent.right()) + margin,
                i64::from(extent.bottom()) + margin,
                img_w,
                img_h,
            );
            if region.area() == 0 {
                continue;
            }
            let crop_image =
                image::imageops::crop_imm(image, region.x, region.y, region.width, region.height)
                    .to_image();
            crops.extend(self.split_crop(crop_image, region));
        }

        tracing::debug!(tables = crops.len(), "segmentation finished");
        Ok(crops)
    }

    /// Extracts near-horizontal and near-vertical structural lines from the
    /// ink mask and intersects them into the joint mask.
    fn extract_joints(&self, ink: &GrayImage, img_w: u32, img_h: u32) -> GrayImage {
        let kernel_h = (img_w / self.config.line_scale).max(1);
        let kernel_v = (img_h / self.config.line_scale).max(1);

        let mut vertical = ink.clone();
        for _ in 0..self.config.line_iterations {
            vertical = erode_vertical(&vertical, kernel_v);
        }
        for _ in 0..self.config.line_iterations {
            vertical = dilate_vertical(&vertical, kernel_v);
        }

        let mut horizontal = ink.clone();
        for _ in 0..self.config.line_iterations {
            horizontal = erode_horizontal(&horizontal, kernel_h);
        }
        for _ in 0..self.config.line_iterations {
            horizontal = dilate_horizontal(&horizontal, kernel_h);
        }

        // Thicken by one pixel so crossings that miss by a pixel still
        // intersect.
        let vertical = dilate_rect(&vertical, 3, 3);
        let horizontal = dilate_rect(&horizontal, 3, 3);
        intersect(&vertical, &horizontal)
    }

    /// Bridges the joints of one logical table into a single connected blob,
    /// across header gaps and missing inner rules.
    fn weave(&self, joints: &GrayImage, img_w: u32, img_h: u32) -> GrayImage {
        let gap_w = (img_w / self.config.weave_divisor_x).max(1);
        let gap_h = (img_h / self.config.weave_divisor_y).max(1);
        dilate_vertical(&dilate_horizontal(joints, gap_w), gap_h)
    }

    /// Applies split detection to a provisional crop, yielding one crop when
    /// no seam is found or two (left, right) when one is.
    fn split_crop(&self, crop_image: RgbImage, region: BoundingBox) -> Vec<TableCrop> {
        match self.detect_seam(&crop_image) {
            Some(seam) => {
                tracing::debug!(seam, ?region, "splitting merged table crop");
                let (w, h) = crop_image.dimensions();
                let left = image::imageops::crop_imm(&crop_image, 0, 0, seam, h).to_image();
                let right =
                    image::imageops::crop_imm(&crop_image, seam, 0, w - seam, h).to_image();
                vec![
                    TableCrop {
                        image: left,
                        region: BoundingBox::new(region.x, region.y, seam, region.height),
                    },
                    TableCrop {
                        image: right,
                        region: BoundingBox::new(
                            region.x + seam,
                            region.y,
                            region.width - seam,
                            region.height,
                        ),
                    },
                ]
            }
            None => vec![TableCrop {
                image: crop_image,
                region,
            }],
        }
    }

    /// Looks for a vertical seam separating two side-by-side tables that were
    /// detected as one region. Returns the seam column, crop-local.
    ///
    /// A heuristic, not a guarantee: a missed seam surfaces as one wider
    /// table downstream; spurious seams are suppressed by the edge margins.
    fn detect_seam(&self, crop: &RgbImage) -> Option<u32> {
        let cfg = &self.config.split;
        let (w, h) = crop.dimensions();
        if w == 0 || h == 0 {
            return None;
        }

        let gray = to_gray(crop);
        let ink = otsu_ink_mask(&gray);

        // Horizontal structure only: one erode pass, two dilate passes, so
        // runs bridge empty columns inside a single table but genuine
        // inter-table gaps stay blank.
        let kernel = (w / cfg.line_scale).max(1);
        let structure = dilate_horizontal(
            &dilate_horizontal(&erode_horizontal(&ink, kernel), kernel),
            kernel,
        );

        // Band excluding header and footer text that would mask the gap.
        let mut top = (h as f32 * cfg.band_top_ratio) as u32;
        let mut bottom = (h as f32 * cfg.band_bottom_ratio) as u32;
        if bottom <= top {
            top = 0;
            bottom = h;
        }

        let counts = column_ink_counts(&structure, top, bottom);
        let max_ink = (bottom - top) as f32 * cfg.ink_ratio;
        let margin = w as f32 * cfg.edge_margin_ratio;
        let half = i64::from(w / 2);

        gap_groups(&counts, max_ink)
            .into_iter()
            .filter(|&(_, len)| len as u32 >= cfg.min_gap_width)
            .map(|(start, len)| (start + len / 2) as u32)
            .filter(|&center| (center as f32) > margin && (center as f32) < w as f32 - margin)
            .min_by_key(|&center| (i64::from(center) - half).abs())
    }
}

/// Bounding box of a contour's point set, or `None` for an empty contour.
fn bbox_of_points(points: &[imageproc::point::Point<u32>]) -> Option<BoundingBox> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for point in points {
        min_x = min_x.min(point.x);
        min_y = min_y.min(point.y);
        max_x = max_x.max(point.x);
        max_y = max_y.max(point.y);
    }
    Some(BoundingBox::new(
        min_x,
        min_y,
        max_x - min_x + 1,
        max_y - min_y + 1,
    ))
}

/// Joint pixel coordinates lying inside `bbox`, in image coordinates.
fn joints_within(joints: &GrayImage, bbox: &BoundingBox) -> Vec<(u32, u32)> {
    let mut found = Vec::new();
    let right = bbox.right().min(joints.width());
    let bottom = bbox.bottom().min(joints.height());
    for y in bbox.y..bottom {
        for x in bbox.x..right {
            if joints.get_pixel(x, y)[0] != 0 {
                found.push((x, y));
            }
        }
    }
    found
}

#[cfg(test)]
pub(crate) mod testutil {
    use image::{Rgb, RgbImage};

    pub const INK: Rgb<u8> = Rgb([0, 0, 0]);
    pub const PAPER: Rgb<u8> = Rgb([255, 255, 255]);

    /// Blank white drawing.
    pub fn blank(width: u32, height: u32) -> RgbImage {
        RgbImage::from_pixel(width, height, PAPER)
    }

    fn fill(image: &mut RgbImage, x0: u32, y0: u32, x1: u32, y1: u32) {
        for y in y0..y1.min(image.height()) {
            for x in x0..x1.min(image.width()) {
                image.put_pixel(x, y, INK);
            }
        }
    }

    /// Draws a table grid with 3 px rules: outer border plus evenly spaced
    /// inner rows and columns, spanning `(x0, y0)..(x1, y1)`.
    pub fn draw_grid(
        image: &mut RgbImage,
        x0: u32,
        y0: u32,
        x1: u32,
        y1: u32,
        rows: u32,
        cols: u32,
    ) {
        const THICKNESS: u32 = 3;
        for r in 0..=rows {
            let y = y0 + (y1 - y0 - THICKNESS) * r / rows;
            fill(image, x0, y, x1, y + THICKNESS);
        }
        for c in 0..=cols {
            let x = x0 + (x1 - x0 - THICKNESS) * c / cols;
            fill(image, x, y0, x + THICKNESS, y1);
        }
    }
}
