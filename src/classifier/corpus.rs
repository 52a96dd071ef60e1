use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::{ALPHABET, is_known_label, sample_features};
use crate::config::check_glyph_size;
use crate::error::{PlateError, Result};
use crate::pipeline::load_image;

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

/// One labeled feature vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub label: char,
    pub features: Vec<f32>,
}

/// Labeled character samples, all of the same canonical size.
#[derive(Debug, Clone, Default)]
pub struct TrainingCorpus {
    pub glyph_size: u32,
    pub samples: Vec<Sample>,
}

impl TrainingCorpus {
    pub fn from_samples(glyph_size: u32, samples: Vec<Sample>) -> Result<Self> {
        check_samples(glyph_size, &samples)?;
        Ok(Self {
            glyph_size,
            samples,
        })
    }

    /// Load a folder-per-label corpus: `<dir>/<LABEL>/*.{png,jpg,jpeg}`.
    ///
    /// Only folders named after a character of [`ALPHABET`] are read. Missing
    /// folders and undecodable files are skipped with a warning.
    pub fn load(dir: impl AsRef<Path>, glyph_size: u32) -> Result<Self> {
        let dir = dir.as_ref();
        check_glyph_size(glyph_size)?;
        if !dir.is_dir() {
            return Err(PlateError::io(
                dir,
                std::io::Error::new(std::io::ErrorKind::NotFound, "corpus directory not found"),
            ));
        }
        tracing::info!(dir = %dir.display(), "loading training corpus");

        let mut samples = Vec::new();
        for label in ALPHABET {
            let label_dir = dir.join(label.to_string());
            if !label_dir.is_dir() {
                tracing::warn!(%label, "no folder for label, skipping");
                continue;
            }

            let mut paths: Vec<_> = fs::read_dir(&label_dir)
                .map_err(|e| PlateError::io(&label_dir, e))?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|path| has_image_extension(path))
                .collect();
            paths.sort();

            for path in paths {
                match load_image(&path) {
                    Ok(img) => samples.push(Sample {
                        label,
                        features: sample_features(&img.to_luma8(), glyph_size),
                    }),
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "failed to load sample")
                    }
                }
            }
        }

        tracing::info!(samples = samples.len(), "training corpus loaded");
        Ok(Self {
            glyph_size,
            samples,
        })
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Number of samples per label.
    pub fn class_counts(&self) -> BTreeMap<char, usize> {
        let mut counts = BTreeMap::new();
        for sample in &self.samples {
            *counts.entry(sample.label).or_insert(0) += 1;
        }
        counts
    }
}

/// Every sample must carry a known label and exactly `glyph_size²` features.
pub(crate) fn check_samples(glyph_size: u32, samples: &[Sample]) -> Result<()> {
    check_glyph_size(glyph_size)?;
    let expected = (glyph_size * glyph_size) as usize;
    for sample in samples {
        if !is_known_label(sample.label) {
            return Err(PlateError::model(format!(
                "sample label {:?} is not a plate character",
                sample.label
            )));
        }
        if sample.features.len() != expected {
            return Err(PlateError::model(format!(
                "sample '{}' has {} features, expected {}",
                sample.label,
                sample.features.len(),
                expected
            )));
        }
    }
    Ok(())
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}
