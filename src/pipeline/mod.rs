//! BOM extraction pipeline: segmentation, safety filtering, compositing,
//! cached recognition.
//!
//! [`BomPipeline`] owns the per-stage components and runs them in fixed
//! order. Catalog resolution and feasibility are deliberately separate
//! stages (`resolver`, `feasibility`) so callers can re-resolve cached rows
//! without re-running recognition.

pub mod compositor;
pub mod safety;
pub mod segmentation;

pub use compositor::compose_vertical;
pub use safety::{FilterOutcome, SafetyFilter};
pub use segmentation::SegmentationEngine;

use std::sync::Arc;

use image::DynamicImage;

use crate::cache::{CacheKey, RecognitionCache};
use crate::core::config::{CompositorConfig, PipelineConfig};
use crate::core::errors::BomError;
use crate::core::traits::{OcrEngine, Recognizer};
use crate::domain::RawRows;
use crate::utils::{dynamic_to_rgb, load_image, normalize_landscape};

/// Result of one pipeline run over a drawing.
#[derive(Debug)]
pub enum ExtractionOutcome {
    /// At least one table survived and was recognized.
    Extracted {
        /// The recognized rows.
        rows: RawRows,
        /// Whether the rows came from the cache instead of a recognizer
        /// call.
        from_cache: bool,
        /// Whether any crop passed the safety filter unchecked (fail-open
        /// after an OCR failure).
        filter_uncertain: bool,
    },
    /// Segmentation found no table-like region. Not an error; many drawing
    /// sheets carry no BOM.
    NoTablesFound,
    /// Tables were found but every one was discarded as confidential
    /// boilerplate.
    AllTablesFiltered,
}

/// The extraction pipeline for a single drawing image.
pub struct BomPipeline {
    segmenter: SegmentationEngine,
    filter: SafetyFilter,
    compositor: CompositorConfig,
    cache: RecognitionCache,
    recognizer: Arc<dyn Recognizer>,
}

impl BomPipeline {
    /// Assembles the pipeline from configuration and collaborators. A
    /// configuration without a cache section runs with caching disabled.
    pub fn new(
        config: PipelineConfig,
        recognizer: Arc<dyn Recognizer>,
        ocr: Arc<dyn OcrEngine>,
    ) -> Self {
        let cache = match &config.cache {
            Some(cache_config) => RecognitionCache::new(cache_config),
            None => RecognitionCache::disabled(),
        };
        Self {
            segmenter: SegmentationEngine::new(config.segmentation),
            filter: SafetyFilter::new(config.safety, ocr),
            compositor: config.compositor,
            cache,
            recognizer,
        }
    }

    /// Runs the full extraction for one drawing.
    ///
    /// The image is landscape-normalized first, so portrait scans behave
    /// identically to their rotated counterparts.
    pub fn extract(&self, image: DynamicImage) -> Result<ExtractionOutcome, BomError> {
        self.extract_rgb(dynamic_to_rgb(image))
    }

    /// Loads a drawing from disk and runs the full extraction.
    pub fn extract_path(&self, path: &std::path::Path) -> Result<ExtractionOutcome, BomError> {
        self.extract_rgb(load_image(path)?)
    }

    fn extract_rgb(&self, image: image::RgbImage) -> Result<ExtractionOutcome, BomError> {
        let image = normalize_landscape(image);

        let crops = self.segmenter.segment(&image)?;
        if crops.is_empty() {
            tracing::debug!("no table regions detected");
            return Ok(ExtractionOutcome::NoTablesFound);
        }
        let found = crops.len();

        let outcome = self.filter.filter(crops);
        if outcome.kept.is_empty() {
            tracing::debug!(found, "all table regions were filtered out");
            return Ok(ExtractionOutcome::AllTablesFiltered);
        }
        let filter_uncertain = outcome.uncertain;

        // kept is non-empty, so composition always yields a canvas.
        let merged = compose_vertical(&outcome.kept, &self.compositor)
            .ok_or_else(|| BomError::invalid_input("compositing produced no canvas"))?;

        let key = CacheKey::for_image(&self.recognizer.identity(), &merged)?;
        if let Some(rows) = self.cache.get(&key)? {
            tracing::debug!("serving recognition result from cache");
            return Ok(ExtractionOutcome::Extracted {
                rows,
                from_cache: true,
                filter_uncertain,
            });
        }

        let rows = self.recognizer.recognize(&merged)?;
        self.cache.set(&key, &rows)?;
        tracing::debug!(rows = rows.rows.len(), "recognition finished");
        Ok(ExtractionOutcome::Extracted {
            rows,
            from_cache: false,
            filter_uncertain,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::segmentation::testutil::{blank, draw_grid};
    use super::*;
    use crate::core::config::CacheConfig;
    use crate::domain::ExtractedRow;
    use image::GrayImage;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SilentOcr;

    impl OcrEngine for SilentOcr {
        fn read_text(&self, _image: &GrayImage) -> Result<String, BomError> {
            Ok(String::new())
        }
    }

    /// Deterministic recognizer that counts how often it is invoked.
    struct CountingRecognizer {
        calls: AtomicUsize,
    }

    impl CountingRecognizer {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Recognizer for CountingRecognizer {
        fn identity(&self) -> String {
            "counting-v1".to_string()
        }

        fn recognize(&self, _image: &image::RgbImage) -> Result<RawRows, BomError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RawRows::new(vec![ExtractedRow {
                position: 1,
                quantity: Some(2.0),
                raw_code: Some("100234".into()),
                description: Some("Sechskantschraube".into()),
                unit: Some("Stk".into()),
            }]))
        }
    }

    fn drawing_with_table() -> DynamicImage {
        let mut image = blank(1000, 600);
        draw_grid(&mut image, 100, 100, 700, 400, 4, 4);
        DynamicImage::ImageRgb8(image)
    }

    fn pipeline_with_cache(
        dir: &tempfile::TempDir,
        recognizer: Arc<CountingRecognizer>,
    ) -> BomPipeline {
        let config = PipelineConfig {
            cache: Some(CacheConfig::new(dir.path().join("recognition.json"))),
            ..PipelineConfig::default()
        };
        BomPipeline::new(config, recognizer, Arc::new(SilentOcr))
    }

    #[test]
    fn blank_drawing_reports_no_tables() {
        let pipeline = BomPipeline::new(
            PipelineConfig::default(),
            CountingRecognizer::new(),
            Arc::new(SilentOcr),
        );
        let outcome = pipeline
            .extract(DynamicImage::ImageRgb8(blank(800, 500)))
            .unwrap();
        assert!(matches!(outcome, ExtractionOutcome::NoTablesFound));
    }

    #[test]
    fn table_is_extracted_and_second_run_hits_the_cache() {
        let dir = tempfile::tempdir().unwrap();
        let recognizer = CountingRecognizer::new();
        let pipeline = pipeline_with_cache(&dir, recognizer.clone());

        let first = pipeline.extract(drawing_with_table()).unwrap();
        match first {
            ExtractionOutcome::Extracted {
                ref rows,
                from_cache,
                filter_uncertain,
            } => {
                assert_eq!(rows.rows.len(), 1);
                assert!(!from_cache);
                assert!(!filter_uncertain);
            }
            other => panic!("expected extraction, got {other:?}"),
        }

        let second = pipeline.extract(drawing_with_table()).unwrap();
        assert!(matches!(
            second,
            ExtractionOutcome::Extracted {
                from_cache: true,
                ..
            }
        ));
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn portrait_drawing_matches_its_landscape_twin_in_cache() {
        let dir = tempfile::tempdir().unwrap();
        let recognizer = CountingRecognizer::new();
        let pipeline = pipeline_with_cache(&dir, recognizer.clone());

        pipeline.extract(drawing_with_table()).unwrap();

        let portrait = drawing_with_table().rotate270();
        let outcome = pipeline.extract(portrait).unwrap();
        assert!(matches!(
            outcome,
            ExtractionOutcome::Extracted {
                from_cache: true,
                ..
            }
        ));
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn extraction_works_from_a_file_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drawing.png");
        drawing_with_table().save(&path).unwrap();

        let pipeline = BomPipeline::new(
            PipelineConfig::default(),
            CountingRecognizer::new(),
            Arc::new(SilentOcr),
        );
        let outcome = pipeline.extract_path(&path).unwrap();
        assert!(matches!(outcome, ExtractionOutcome::Extracted { .. }));
    }

    #[test]
    fn denylisted_table_yields_all_filtered() {
        struct BoilerplateOcr;
        impl OcrEngine for BoilerplateOcr {
            fn read_text(&self, _image: &GrayImage) -> Result<String, BomError> {
                Ok("Muster GmbH - vertraulich".to_string())
            }
        }

        let recognizer = CountingRecognizer::new();
        let pipeline = BomPipeline::new(
            PipelineConfig::default(),
            recognizer.clone(),
            Arc::new(BoilerplateOcr),
        );

        let outcome = pipeline.extract(drawing_with_table()).unwrap();
        assert!(matches!(outcome, ExtractionOutcome::AllTablesFiltered));
        assert_eq!(recognizer.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn ocr_failure_is_fail_open_and_flagged() {
        struct FailingOcr;
        impl OcrEngine for FailingOcr {
            fn read_text(&self, _image: &GrayImage) -> Result<String, BomError> {
                Err(BomError::collaborator_msg(
                    crate::core::errors::Stage::SafetyFilter,
                    "reader unavailable",
                ))
            }
        }

        let pipeline = BomPipeline::new(
            PipelineConfig::default(),
            CountingRecognizer::new(),
            Arc::new(FailingOcr),
        );

        let outcome = pipeline.extract(drawing_with_table()).unwrap();
        assert!(matches!(
            outcome,
            ExtractionOutcome::Extracted {
                filter_uncertain: true,
                ..
            }
        ));
    }
}
