//! Binarization helpers for scanned-drawing masks.
//!
//! Segmentation works on "ink masks" where foreground (255) means ink and
//! background (0) means paper, regardless of the drawing's polarity. The
//! adaptive variant copes with the uneven contrast of scans; the Otsu
//! variants are used on already-cropped regions.

use image::{GrayImage, RgbImage};
use imageproc::contrast::{ThresholdType, adaptive_threshold, otsu_level, threshold};

/// Converts an RGB image to 8-bit grayscale.
pub fn to_gray(image: &RgbImage) -> GrayImage {
    image::imageops::grayscale(image)
}

/// Adaptive-threshold binarization with ink as foreground.
///
/// Each pixel is compared against the mean of its
/// `(2 * block_radius + 1)`-square neighbourhood; pixels darker than their
/// surroundings become 255.
pub fn adaptive_ink_mask(gray: &GrayImage, block_radius: u32) -> GrayImage {
    let mut mask = adaptive_threshold(gray, block_radius);
    for pixel in mask.pixels_mut() {
        pixel[0] = 255 - pixel[0];
    }
    mask
}

/// Otsu global binarization with ink as foreground.
pub fn otsu_ink_mask(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    threshold(gray, level, ThresholdType::BinaryInverted)
}

/// Otsu global binarization keeping the page white and the text black, the
/// polarity the boilerplate OCR engine expects.
pub fn otsu_document(gray: &GrayImage) -> GrayImage {
    let level = otsu_level(gray);
    threshold(gray, level, ThresholdType::Binary)
}
