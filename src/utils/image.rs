//! Utility functions for loading and normalizing drawing images.

use crate::core::errors::BomError;
use image::{DynamicImage, RgbImage};

/// Converts a DynamicImage to an RgbImage.
pub fn dynamic_to_rgb(image: DynamicImage) -> RgbImage {
    image.to_rgb8()
}

/// Loads an image from a file path and converts it to RgbImage.
///
/// # Errors
///
/// Returns `BomError::ImageLoad` when the file cannot be read or decoded.
pub fn load_image(path: &std::path::Path) -> Result<RgbImage, BomError> {
    let image = image::open(path).map_err(BomError::ImageLoad)?;
    Ok(dynamic_to_rgb(image))
}

/// Rotates a portrait drawing 90° clockwise so segmentation always sees a
/// landscape page. Landscape input is returned unchanged.
pub fn normalize_landscape(image: RgbImage) -> RgbImage {
    if image.height() > image.width() {
        image::imageops::rotate90(&image)
    } else {
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portrait_image_is_rotated_to_landscape() {
        let image = RgbImage::new(100, 300);
        let normalized = normalize_landscape(image);
        assert_eq!(normalized.dimensions(), (300, 100));
    }

    #[test]
    fn landscape_image_is_untouched() {
        let image = RgbImage::new(300, 100);
        let normalized = normalize_landscape(image);
        assert_eq!(normalized.dimensions(), (300, 100));
    }
}
