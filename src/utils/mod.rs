//! Utility functions for images.

pub mod image;

pub use self::image::{dynamic_to_rgb, load_image, normalize_landscape};
