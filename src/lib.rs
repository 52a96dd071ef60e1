pub mod classifier;
pub mod config;
pub mod detection;
pub mod error;
pub mod models;
pub mod pipeline;

pub use classifier::{ALPHABET, CharacterClassifier, KnnClassifier, TrainingCorpus};
pub use config::{
    AllCandidatesConfig, BestAspectConfig, BinarizePolicy, LabelConfig, PlatePolicy, Polarity,
    RecognitionConfig, SegmentationConfig, ThresholdSource,
};
pub use detection::DetectionPipeline;
pub use detection::observer::{DebugDump, NoopObserver, PipelineObserver, Stage};
pub use error::{PlateError, Result};
pub use models::{
    BinaryImage, BoundingBox, CharacterReading, DetectedPlate, Glyph, GlyphImage, PlateCandidate,
    PlateReading, Recognition, Region, Segmentation,
};
pub use pipeline::PlateRecognizer;
