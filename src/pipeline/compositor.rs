//! Vertical compositing of table crops into one recognition canvas.
//!
//! Recognition runs once per drawing, so all surviving crops are stacked
//! top-to-bottom on white with a blank separator strip between them. Narrow
//! crops are padded on the right rather than scaled, keeping glyph geometry
//! untouched.

use crate::core::config::CompositorConfig;
use crate::domain::TableCrop;
use image::{Rgb, RgbImage, imageops};

const PAPER: Rgb<u8> = Rgb([255, 255, 255]);

/// Stacks `crops` vertically into a single image. Returns `None` for an
/// empty batch; a single crop is returned as-is without separators.
pub fn compose_vertical(crops: &[TableCrop], config: &CompositorConfig) -> Option<RgbImage> {
    let first = crops.first()?;
    if crops.len() == 1 {
        return Some(first.image.clone());
    }

    let width = crops.iter().map(|c| c.image.width()).max()?;
    let height: u32 = crops.iter().map(|c| c.image.height()).sum::<u32>()
        + config.separator_height * (crops.len() as u32 - 1);

    let mut canvas = RgbImage::from_pixel(width, height, PAPER);
    let mut y = 0i64;
    for crop in crops {
        imageops::replace(&mut canvas, &crop.image, 0, y);
        y += i64::from(crop.image.height()) + i64::from(config.separator_height);
    }

    tracing::debug!(
        crops = crops.len(),
        width,
        height,
        "composited crops for recognition"
    );
    Some(canvas)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::BoundingBox;

    fn crop(width: u32, height: u32, shade: u8) -> TableCrop {
        TableCrop {
            image: RgbImage::from_pixel(width, height, Rgb([shade, shade, shade])),
            region: BoundingBox::new(0, 0, width, height),
        }
    }

    #[test]
    fn empty_batch_yields_nothing() {
        assert!(compose_vertical(&[], &CompositorConfig::default()).is_none());
    }

    #[test]
    fn single_crop_passes_through_unchanged() {
        let merged = compose_vertical(&[crop(40, 30, 10)], &CompositorConfig::default()).unwrap();
        assert_eq!(merged.dimensions(), (40, 30));
        assert_eq!(merged.get_pixel(0, 0), &Rgb([10, 10, 10]));
    }

    #[test]
    fn crops_stack_with_separator_and_right_padding() {
        let config = CompositorConfig::default();
        let merged = compose_vertical(&[crop(60, 20, 10), crop(40, 30, 40)], &config).unwrap();

        assert_eq!(
            merged.dimensions(),
            (60, 20 + config.separator_height + 30)
        );
        // First crop at the top.
        assert_eq!(merged.get_pixel(0, 0), &Rgb([10, 10, 10]));
        // Separator strip is paper-white.
        assert_eq!(merged.get_pixel(0, 20), &PAPER);
        // Second crop below the separator, with white padding right of it.
        let second_top = 20 + config.separator_height;
        assert_eq!(merged.get_pixel(0, second_top), &Rgb([40, 40, 40]));
        assert_eq!(merged.get_pixel(40, second_top), &PAPER);
    }
}
