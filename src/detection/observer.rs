//! Hooks for inspecting intermediate results of a pipeline run.
//!
//! Detection itself never renders anything. Callers that want to look at the
//! binarized images, the plate candidates or the character boxes pass an
//! observer; [`DebugDump`] writes them to disk as PNG files.

use image::{DynamicImage, GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_hollow_rect_mut;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{PlateError, Result};
use crate::models::{BinaryImage, BoundingBox, PlateCandidate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Whole image, searching for the plate.
    Localization,
    /// Plate crop, searching for characters.
    Segmentation,
}

/// Receives intermediate results. Every method defaults to doing nothing.
pub trait PipelineObserver {
    fn on_grayscale(&mut self, _gray: &GrayImage) {}

    fn on_binarized(&mut self, _stage: Stage, _threshold: f32, _binary: &BinaryImage) {}

    /// All candidates the plate policy accepted.
    fn on_plate_candidates(&mut self, _candidates: &[PlateCandidate]) {}

    /// A plate about to be segmented, with the grayscale image it came from.
    fn on_plate_selected(&mut self, _gray: &GrayImage, _plate: &PlateCandidate) {}

    /// Character boxes, relative to the plate crop.
    fn on_characters(&mut self, _plate: &GrayImage, _boxes: &[BoundingBox]) {}
}

/// Observer that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Saves every intermediate image into numbered stage directories.
///
/// Layout: `01_grayscale/01.png`, `02_localization_binary/01.png`,
/// `03_plate/01.png`, `04_segmentation_binary/01.png`, `05_characters/01.png`.
/// Write failures are logged and otherwise ignored.
pub struct DebugDump {
    output_dir: PathBuf,
    counters: HashMap<&'static str, usize>,
}

impl DebugDump {
    /// The directory must be empty or non-existent.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        if output_dir.exists() {
            let entries =
                std::fs::read_dir(&output_dir).map_err(|e| PlateError::io(&output_dir, e))?;
            if entries.count() > 0 {
                return Err(PlateError::invalid_config(format!(
                    "debug directory is not empty: {}",
                    output_dir.display()
                )));
            }
        } else {
            std::fs::create_dir_all(&output_dir).map_err(|e| PlateError::io(&output_dir, e))?;
        }

        Ok(Self {
            output_dir,
            counters: HashMap::new(),
        })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn save(&mut self, step_dir_name: &'static str, img: DynamicImage) {
        let counter = self.counters.entry(step_dir_name).or_insert(0);
        *counter += 1;
        let step_dir = self.output_dir.join(step_dir_name);
        let output_path = step_dir.join(format!("{:02}.png", counter));

        let saved = std::fs::create_dir_all(&step_dir)
            .map_err(|e| PlateError::io(&step_dir, e))
            .and_then(|_| img.save(&output_path).map_err(PlateError::from));
        match saved {
            Ok(()) => tracing::debug!(path = %output_path.display(), "debug image saved"),
            Err(e) => tracing::warn!(path = %output_path.display(), error = %e, "failed to save debug image"),
        }
    }
}

impl PipelineObserver for DebugDump {
    fn on_grayscale(&mut self, gray: &GrayImage) {
        self.save("01_grayscale", DynamicImage::ImageLuma8(gray.clone()));
    }

    fn on_binarized(&mut self, stage: Stage, _threshold: f32, binary: &BinaryImage) {
        let dir = match stage {
            Stage::Localization => "02_localization_binary",
            Stage::Segmentation => "04_segmentation_binary",
        };
        self.save(dir, DynamicImage::ImageLuma8(binary.clone()));
    }

    fn on_plate_selected(&mut self, gray: &GrayImage, plate: &PlateCandidate) {
        let overlay = draw_boxes(gray, std::slice::from_ref(&plate.bbox));
        self.save("03_plate", DynamicImage::ImageRgb8(overlay));
    }

    fn on_characters(&mut self, plate: &GrayImage, boxes: &[BoundingBox]) {
        let overlay = draw_boxes(plate, boxes);
        self.save("05_characters", DynamicImage::ImageRgb8(overlay));
    }
}

/// Grayscale image with red outlines around the given boxes.
pub fn draw_boxes(gray: &GrayImage, boxes: &[BoundingBox]) -> RgbImage {
    let mut canvas = DynamicImage::ImageLuma8(gray.clone()).to_rgb8();
    for rect in boxes.iter().filter_map(BoundingBox::to_rect) {
        draw_hollow_rect_mut(&mut canvas, rect, Rgb([255, 0, 0]));
    }
    canvas
}
