//! # Stage Definition: Confidentiality Safety Filter
//!
//! This stage is considered "Done" when it fulfills the following contract:
//!
//! - **Inputs**: Candidate `TableCrop`s and an [`OcrEngine`] for a cheap read
//!   of each crop's text.
//! - **Outputs**: The crops whose text matches no denylist term, plus a flag
//!   recording whether any crop was passed through without a successful read.
//! - **Logging**: Warns on every discarded crop and on OCR failures.
//! - **Invariants**:
//!     - Denylist matching is case-insensitive on both sides.
//!     - Under [`FilterPolicy::FailOpen`] an OCR failure keeps the crop and
//!       sets the `uncertain` flag; under [`FilterPolicy::FailClosed`] it
//!       discards the crop.

use std::sync::Arc;

use crate::core::config::{FilterPolicy, SafetyFilterConfig};
use crate::core::errors::BomError;
use crate::core::traits::OcrEngine;
use crate::domain::TableCrop;
use crate::processors::{otsu_document, to_gray};

/// Outcome of filtering a batch of crops.
#[derive(Debug)]
pub struct FilterOutcome {
    /// Crops that passed the denylist check, in input order.
    pub kept: Vec<TableCrop>,
    /// True when at least one kept crop could not be read and was passed
    /// through under the fail-open policy.
    pub uncertain: bool,
}

/// Discards table crops whose text contains confidential boilerplate terms,
/// so that title blocks and legal notices never reach recognition.
pub struct SafetyFilter {
    config: SafetyFilterConfig,
    ocr: Arc<dyn OcrEngine>,
}

impl SafetyFilter {
    pub fn new(config: SafetyFilterConfig, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { config, ocr }
    }

    /// Filters `crops` against the denylist. Infallible at the batch level:
    /// per-crop OCR failures are resolved by the configured policy.
    pub fn filter(&self, crops: Vec<TableCrop>) -> FilterOutcome {
        let mut kept = Vec::with_capacity(crops.len());
        let mut uncertain = false;

        for crop in crops {
            match self.read_text(&crop) {
                Ok(text) => {
                    if let Some(term) = self.matched_term(&text) {
                        tracing::warn!(
                            region = ?crop.region,
                            term,
                            "discarding crop containing denylisted term"
                        );
                    } else {
                        kept.push(crop);
                    }
                }
                Err(err) => match self.config.on_ocr_failure {
                    FilterPolicy::FailOpen => {
                        tracing::warn!(
                            region = ?crop.region,
                            error = %err,
                            "safety read failed; keeping crop unchecked"
                        );
                        uncertain = true;
                        kept.push(crop);
                    }
                    FilterPolicy::FailClosed => {
                        tracing::warn!(
                            region = ?crop.region,
                            error = %err,
                            "safety read failed; discarding crop"
                        );
                    }
                },
            }
        }

        FilterOutcome { kept, uncertain }
    }

    /// Binarizes the crop and reads its text. Binarization strips the gray
    /// hatching common on drawing sheets so the reader only sees print.
    fn read_text(&self, crop: &TableCrop) -> Result<String, BomError> {
        let document = otsu_document(&to_gray(&crop.image));
        self.ocr.read_text(&document)
    }

    fn matched_term(&self, text: &str) -> Option<&str> {
        let haystack = text.to_lowercase();
        self.config
            .denylist
            .iter()
            .map(String::as_str)
            .find(|term| haystack.contains(&term.to_lowercase()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::errors::{BomError, Stage};
    use crate::domain::BoundingBox;
    use image::RgbImage;
    use std::sync::Mutex;

    /// Returns one scripted response per call, in order.
    struct ScriptedOcr {
        responses: Mutex<Vec<Result<String, BomError>>>,
    }

    impl ScriptedOcr {
        fn new(responses: Vec<Result<String, BomError>>) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses),
            })
        }
    }

    impl OcrEngine for ScriptedOcr {
        fn read_text(&self, _image: &image::GrayImage) -> Result<String, BomError> {
            self.responses.lock().unwrap().remove(0)
        }
    }

    fn crop_at(x: u32) -> TableCrop {
        TableCrop {
            image: RgbImage::from_pixel(8, 8, image::Rgb([255, 255, 255])),
            region: BoundingBox::new(x, 0, 8, 8),
        }
    }

    fn ocr_failure() -> BomError {
        BomError::collaborator_msg(Stage::SafetyFilter, "reader unavailable")
    }

    #[test]
    fn crop_with_denylisted_term_is_discarded() {
        let ocr = ScriptedOcr::new(vec![
            Ok("Pos Menge Benennung".into()),
            Ok("Muster GmbH - VERTRAULICH".into()),
        ]);
        let filter = SafetyFilter::new(SafetyFilterConfig::default(), ocr);

        let outcome = filter.filter(vec![crop_at(0), crop_at(100)]);
        assert_eq!(outcome.kept.len(), 1);
        assert_eq!(outcome.kept[0].region.x, 0);
        assert!(!outcome.uncertain);
    }

    #[test]
    fn denylist_matching_is_case_insensitive() {
        let ocr = ScriptedOcr::new(vec![Ok("streng Vertraulich".into())]);
        let filter = SafetyFilter::new(SafetyFilterConfig::default(), ocr);

        let outcome = filter.filter(vec![crop_at(0)]);
        assert!(outcome.kept.is_empty());
    }

    #[test]
    fn fail_open_keeps_crop_and_marks_uncertain() {
        let ocr = ScriptedOcr::new(vec![Err(ocr_failure())]);
        let filter = SafetyFilter::new(SafetyFilterConfig::default(), ocr);

        let outcome = filter.filter(vec![crop_at(0)]);
        assert_eq!(outcome.kept.len(), 1);
        assert!(outcome.uncertain);
    }

    #[test]
    fn fail_closed_discards_unreadable_crop() {
        let ocr = ScriptedOcr::new(vec![Err(ocr_failure())]);
        let config = SafetyFilterConfig {
            on_ocr_failure: FilterPolicy::FailClosed,
            ..SafetyFilterConfig::default()
        };
        let filter = SafetyFilter::new(config, ocr);

        let outcome = filter.filter(vec![crop_at(0)]);
        assert!(outcome.kept.is_empty());
        assert!(!outcome.uncertain);
    }
}
