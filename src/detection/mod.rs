pub mod components;
pub mod observer;
pub mod plate;
pub mod preprocessing;
pub mod segmentation;

use image::{DynamicImage, GrayImage};

use crate::config::RecognitionConfig;
use crate::models::{DetectedPlate, Glyph, PlateCandidate, Segmentation};
use observer::{NoopObserver, PipelineObserver, Stage};

/// Plate localization and character segmentation, without classification.
#[derive(Debug, Clone, Default)]
pub struct DetectionPipeline {
    pub config: RecognitionConfig,
}

impl DetectionPipeline {
    pub fn new(config: RecognitionConfig) -> Self {
        Self { config }
    }

    /// Locate plates and segment each into ordered glyphs.
    pub fn detect(&self, img: &DynamicImage) -> Vec<DetectedPlate> {
        self.detect_with(img, &mut NoopObserver)
    }

    pub fn detect_with(
        &self,
        img: &DynamicImage,
        observer: &mut dyn PipelineObserver,
    ) -> Vec<DetectedPlate> {
        let gray = preprocessing::to_grayscale(img);
        observer.on_grayscale(&gray);

        let candidates = self.locate_plates(&gray, observer);

        let mut detected = Vec::with_capacity(candidates.len());
        for candidate in &candidates {
            observer.on_plate_selected(&gray, candidate);
            let plate_gray = candidate.bbox.crop(&gray);
            let segmentation = self.segment_plate(&plate_gray, observer);
            detected.push(into_detected(candidate, segmentation));
        }
        detected
    }

    /// Binarize the whole image, label it and apply the plate policy.
    pub fn locate_plates(
        &self,
        gray: &GrayImage,
        observer: &mut dyn PipelineObserver,
    ) -> Vec<PlateCandidate> {
        let policy = &self.config.localization;
        let threshold = preprocessing::resolve_threshold(gray, policy);
        let binary = preprocessing::binarize_at(gray, threshold, policy.polarity);
        observer.on_binarized(Stage::Localization, threshold, &binary);

        let regions = components::label(&binary, &self.config.labeling);
        let candidates = self.config.plate.select(&binary, &regions);
        tracing::debug!(
            threshold,
            regions = regions.len(),
            candidates = candidates.len(),
            policy = self.config.plate.name(),
            "plate localization done"
        );
        observer.on_plate_candidates(&candidates);
        candidates
    }

    /// Segment a grayscale plate crop into characters, in discovery order.
    pub fn segment_plate(
        &self,
        plate_gray: &GrayImage,
        observer: &mut dyn PipelineObserver,
    ) -> Segmentation {
        let config = &self.config.segmentation;
        let threshold = preprocessing::resolve_threshold(plate_gray, &config.binarize);
        let binary = preprocessing::binarize_at(plate_gray, threshold, config.binarize.polarity);
        observer.on_binarized(Stage::Segmentation, threshold, &binary);

        let segmentation =
            segmentation::segment_binary_plate(&binary, config, &self.config.labeling);
        observer.on_characters(plate_gray, &segmentation.boxes);
        segmentation
    }
}

fn into_detected(candidate: &PlateCandidate, segmentation: Segmentation) -> DetectedPlate {
    let mut entries: Vec<_> = segmentation
        .glyphs
        .into_iter()
        .zip(segmentation.columns)
        .zip(segmentation.boxes)
        .collect();
    entries.sort_by_key(|((_, column), _)| *column);

    let (glyphs, character_boxes) = entries
        .into_iter()
        .map(|((image, column), bbox)| (Glyph { image, column }, bbox))
        .unzip();

    DetectedPlate {
        bbox: candidate.bbox,
        glyphs,
        character_boxes,
    }
}
