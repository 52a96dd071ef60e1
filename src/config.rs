//! Tunable thresholds for every stage of the pipeline.
//!
//! Defaults reproduce the heuristics the detector was tuned with. A JSON file
//! may override any subset of fields; anything it leaves out keeps its
//! default.

use crate::error::{PlateError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Which side of the threshold counts as foreground.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    /// Bright pixels (strictly above the threshold) are foreground.
    Above,
    /// Dark pixels (strictly below the threshold) are foreground.
    Below,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdSource {
    /// Computed per image with Otsu's method.
    Otsu,
    /// A literal intensity on the 0-255 scale.
    Fixed(f32),
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BinarizePolicy {
    pub polarity: Polarity,
    pub threshold: ThresholdSource,
}

impl BinarizePolicy {
    /// Bright regions against an Otsu threshold, used to find the plate.
    pub fn localization() -> Self {
        Self {
            polarity: Polarity::Above,
            threshold: ThresholdSource::Otsu,
        }
    }

    /// Dark strokes below mid-gray, used inside a plate crop.
    pub fn segmentation() -> Self {
        Self {
            polarity: Polarity::Below,
            threshold: ThresholdSource::Fixed(128.0),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelConfig {
    /// Skip labeling when the image has more foreground pixels than this.
    #[serde(default)]
    pub max_foreground: Option<u64>,
}

/// Single best plate: lower half of the image, aspect closest to a target.
///
/// All range checks are exclusive. Height and width bounds are fractions of
/// the image height and width.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BestAspectConfig {
    /// Candidates must start at or below this fraction of the image height.
    pub min_top_ratio: f32,
    pub min_height_ratio: f32,
    pub max_height_ratio: f32,
    pub min_width_ratio: f32,
    pub max_width_ratio: f32,
    pub min_aspect: f32,
    pub max_aspect: f32,
    pub min_area: u32,
    pub max_area: u32,
    pub target_aspect: f32,
}

impl Default for BestAspectConfig {
    fn default() -> Self {
        Self {
            min_top_ratio: 0.5,
            min_height_ratio: 0.05,
            max_height_ratio: 0.6,
            min_width_ratio: 0.10,
            max_width_ratio: 0.9,
            min_aspect: 3.5,
            max_aspect: 6.5,
            min_area: 1000,
            max_area: 15000,
            target_aspect: 4.5,
        }
    }
}

/// Every region within the size window, anywhere in the image.
///
/// Height and width checks are inclusive.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AllCandidatesConfig {
    /// Regions with fewer pixels than this are noise.
    pub min_area: u32,
    pub min_height_ratio: f32,
    pub max_height_ratio: f32,
    pub min_width_ratio: f32,
    pub max_width_ratio: f32,
    pub require_wider_than_tall: bool,
}

impl Default for AllCandidatesConfig {
    fn default() -> Self {
        Self {
            min_area: 50,
            min_height_ratio: 0.08,
            max_height_ratio: 0.2,
            min_width_ratio: 0.15,
            max_width_ratio: 0.4,
            require_wider_than_tall: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum PlatePolicy {
    BestAspect(BestAspectConfig),
    AllCandidates(AllCandidatesConfig),
}

impl Default for PlatePolicy {
    fn default() -> Self {
        Self::BestAspect(BestAspectConfig::default())
    }
}

impl PlatePolicy {
    /// Adopt the strategy of `requested`. Thresholds already set for that
    /// strategy are kept; switching strategy takes those of `requested`.
    pub fn switch_strategy(self, requested: PlatePolicy) -> PlatePolicy {
        match (self, requested) {
            (current @ PlatePolicy::BestAspect(_), PlatePolicy::BestAspect(_))
            | (current @ PlatePolicy::AllCandidates(_), PlatePolicy::AllCandidates(_)) => current,
            (_, requested) => requested,
        }
    }
}

/// Character filter and glyph resampling.
///
/// Area and aspect bounds are exclusive; height and width are strict minimums.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationConfig {
    pub binarize: BinarizePolicy,
    pub min_area: u32,
    pub max_area: u32,
    pub min_aspect: f32,
    pub max_aspect: f32,
    pub min_height: u32,
    pub min_width: u32,
    /// Side length of the square canonical glyph.
    pub glyph_size: u32,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            binarize: BinarizePolicy::segmentation(),
            min_area: 50,
            max_area: 1500,
            min_aspect: 0.1,
            max_aspect: 1.5,
            min_height: 8,
            min_width: 3,
            glyph_size: 20,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    pub localization: BinarizePolicy,
    pub labeling: LabelConfig,
    pub plate: PlatePolicy,
    pub segmentation: SegmentationConfig,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            localization: BinarizePolicy::localization(),
            labeling: LabelConfig::default(),
            plate: PlatePolicy::default(),
            segmentation: SegmentationConfig::default(),
        }
    }
}

impl Default for BinarizePolicy {
    fn default() -> Self {
        Self::localization()
    }
}

impl RecognitionConfig {
    /// Read a JSON configuration file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| PlateError::io(path, e))?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| PlateError::io(path, e))
    }

    pub fn with_plate_policy(mut self, plate: PlatePolicy) -> Self {
        self.plate = plate;
        self
    }

    pub fn validate(&self) -> Result<()> {
        match &self.plate {
            PlatePolicy::BestAspect(c) => {
                check_range("plate height ratio", c.min_height_ratio, c.max_height_ratio)?;
                check_range("plate width ratio", c.min_width_ratio, c.max_width_ratio)?;
                check_range("plate aspect", c.min_aspect, c.max_aspect)?;
                check_range("plate area", c.min_area as f32, c.max_area as f32)?;
            }
            PlatePolicy::AllCandidates(c) => {
                check_range("plate height ratio", c.min_height_ratio, c.max_height_ratio)?;
                check_range("plate width ratio", c.min_width_ratio, c.max_width_ratio)?;
            }
        }
        let s = &self.segmentation;
        check_range("character area", s.min_area as f32, s.max_area as f32)?;
        check_range("character aspect", s.min_aspect, s.max_aspect)?;
        check_glyph_size(s.glyph_size)
    }
}

/// Canonical glyphs must have at least one pixel.
pub fn check_glyph_size(glyph_size: u32) -> Result<()> {
    if glyph_size == 0 {
        return Err(PlateError::invalid_config("glyph_size must be non-zero"));
    }
    Ok(())
}

fn check_range(name: &str, min: f32, max: f32) -> Result<()> {
    if min.is_nan() || max.is_nan() || min >= max {
        return Err(PlateError::invalid_config(format!(
            "{name}: minimum {min} is not below maximum {max}"
        )));
    }
    Ok(())
}
