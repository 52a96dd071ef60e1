mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from platescan for tests
pub use platescan::{
    BinaryImage, BoundingBox, CharacterClassifier, DetectionPipeline, PlatePolicy, PlateRecognizer,
    RecognitionConfig, Region, Result,
};
