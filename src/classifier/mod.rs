//! Character classification behind a small trait.
//!
//! The pipeline hands the classifier flattened canonical glyphs. The
//! conversion from a real-valued glyph to that feature vector happens here,
//! so that every classifier sees the same binary features it was trained on.

pub mod corpus;
pub mod knn;

use image::GrayImage;
use image::imageops::{self, FilterType};

use crate::config::Polarity;
use crate::detection::preprocessing::binarize_values;
use crate::error::Result;
use crate::models::GlyphImage;

pub use corpus::{Sample, TrainingCorpus};
pub use knn::{KSearch, KnnClassifier};

/// Labels a plate character can take.
pub const ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I',
    'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z',
];

pub fn is_known_label(c: char) -> bool {
    ALPHABET.contains(&c)
}

/// Anything that maps a glyph feature vector to a single character.
pub trait CharacterClassifier: Send + Sync {
    fn predict(&self, features: &[f32]) -> Result<char>;
}

/// Features for a segmented glyph (strokes are the high values).
///
/// Each pixel is compared with the glyph's own Otsu threshold: 1.0 for
/// stroke, 0.0 for background, flattened row by row.
pub fn glyph_features(glyph: &GlyphImage) -> Vec<f32> {
    binarize_values(glyph.as_raw(), Polarity::Above)
}

/// Features for a training crop with dark characters on a light background.
pub fn sample_features(gray: &GrayImage, size: u32) -> Vec<f32> {
    let real = GlyphImage::from_fn(gray.width(), gray.height(), |x, y| {
        image::Luma([gray.get_pixel(x, y)[0] as f32 / 255.0])
    });
    let resized = imageops::resize(&real, size, size, FilterType::Triangle);
    binarize_values(resized.as_raw(), Polarity::Below)
}
