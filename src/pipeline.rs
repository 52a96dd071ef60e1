use image::{DynamicImage, ImageReader};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

use crate::classifier::{CharacterClassifier, glyph_features};
use crate::config::RecognitionConfig;
use crate::detection::DetectionPipeline;
use crate::detection::observer::{NoopObserver, PipelineObserver};
use crate::error::{PlateError, Result};
use crate::models::{CharacterReading, PlateReading, Recognition};

/// Full pipeline: locate plates, segment characters, classify each glyph.
pub struct PlateRecognizer {
    detection: DetectionPipeline,
    classifier: Box<dyn CharacterClassifier>,
}

impl PlateRecognizer {
    pub fn new(config: RecognitionConfig, classifier: Box<dyn CharacterClassifier>) -> Self {
        Self {
            detection: DetectionPipeline::new(config),
            classifier,
        }
    }

    pub fn config(&self) -> &RecognitionConfig {
        &self.detection.config
    }

    /// Recognize one image. No plate found gives an empty [`Recognition`].
    pub fn recognize(&self, img: &DynamicImage) -> Result<Recognition> {
        self.recognize_with(img, &mut NoopObserver)
    }

    pub fn recognize_with(
        &self,
        img: &DynamicImage,
        observer: &mut dyn PipelineObserver,
    ) -> Result<Recognition> {
        let detected = self.detection.detect_with(img, observer);

        let mut plates = Vec::with_capacity(detected.len());
        for plate in detected {
            let mut characters = Vec::with_capacity(plate.glyphs.len());
            for glyph in &plate.glyphs {
                let label = self.classifier.predict(&glyph_features(&glyph.image))?;
                characters.push(CharacterReading {
                    column: glyph.column,
                    label,
                });
            }
            let text: String = characters.iter().map(|c| c.label).collect();
            tracing::info!(
                text = %text,
                min_row = plate.bbox.min_row,
                min_col = plate.bbox.min_col,
                "plate read"
            );
            plates.push(PlateReading {
                bbox: plate.bbox,
                characters,
                text,
            });
        }

        if plates.is_empty() {
            tracing::info!("no plate detected");
        }
        Ok(Recognition { plates })
    }

    /// Decode an image file and recognize it.
    pub fn recognize_path(&self, path: impl AsRef<Path>) -> Result<Recognition> {
        let img = load_image(path)?;
        self.recognize(&img)
    }

    /// Recognize many files in parallel, one result per path, in input order.
    pub fn recognize_batch(&self, paths: &[PathBuf]) -> Vec<Result<Recognition>> {
        paths
            .par_iter()
            .map(|path| self.recognize_path(path))
            .collect()
    }
}

pub fn load_image(path: impl AsRef<Path>) -> Result<DynamicImage> {
    let path = path.as_ref();
    let img = ImageReader::open(path)
        .map_err(|e| PlateError::io(path, e))?
        .decode()?;
    Ok(img)
}
