//! Image processing primitives for table segmentation.
//!
//! # Modules
//!
//! * `binarize` - grayscale conversion and adaptive/Otsu binarization
//! * `morphology` - separable rectangular erode/dilate on binary masks
//! * `projection` - column ink projections and gap grouping

mod binarize;
mod morphology;
mod projection;

pub use binarize::*;
pub use morphology::*;
pub use projection::*;
