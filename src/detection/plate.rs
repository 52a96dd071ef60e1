use crate::config::{AllCandidatesConfig, BestAspectConfig, PlatePolicy};
use crate::models::{BinaryImage, PlateCandidate, Region};

impl PlatePolicy {
    /// Apply the configured policy to the labeled regions of `binary`.
    ///
    /// `BestAspect` yields at most one candidate; `AllCandidates` yields every
    /// accepted region in the order the regions were given.
    pub fn select(&self, binary: &BinaryImage, regions: &[Region]) -> Vec<PlateCandidate> {
        match self {
            PlatePolicy::BestAspect(config) => select_plate_candidate(binary, regions, config)
                .into_iter()
                .collect(),
            PlatePolicy::AllCandidates(config) => select_all_candidates(binary, regions, config),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            PlatePolicy::BestAspect(_) => "best-aspect",
            PlatePolicy::AllCandidates(_) => "all-candidates",
        }
    }
}

/// Pick the plate-like region whose aspect ratio is closest to the target.
///
/// Only regions starting in the lower part of the image are considered. Ties
/// keep the region seen first. Returns `None` when nothing qualifies.
pub fn select_plate_candidate(
    binary: &BinaryImage,
    regions: &[Region],
    config: &BestAspectConfig,
) -> Option<PlateCandidate> {
    let (img_width, img_height) = binary.dimensions();
    let h = img_height as f32;
    let w = img_width as f32;
    let min_top = (h * config.min_top_ratio).floor();

    let mut best: Option<(&Region, f32)> = None;

    for region in regions {
        let bbox = &region.bbox;
        let Some(aspect) = bbox.aspect_ratio() else {
            continue;
        };
        if (bbox.min_row as f32) < min_top {
            continue;
        }

        let height = bbox.height() as f32;
        let width = bbox.width() as f32;
        let accepted = config.min_height_ratio * h < height
            && height < config.max_height_ratio * h
            && config.min_width_ratio * w < width
            && width < config.max_width_ratio * w
            && config.min_aspect < aspect
            && aspect < config.max_aspect
            && config.min_area < region.area
            && region.area < config.max_area;

        if !accepted {
            continue;
        }
        tracing::debug!(
            area = region.area,
            aspect,
            min_row = bbox.min_row,
            min_col = bbox.min_col,
            max_row = bbox.max_row,
            max_col = bbox.max_col,
            "plate candidate"
        );

        let distance = (aspect - config.target_aspect).abs();
        let closer = match best {
            Some((_, best_aspect)) => distance < (best_aspect - config.target_aspect).abs(),
            None => true,
        };
        if closer {
            best = Some((region, aspect));
        }
    }

    match best {
        Some((region, aspect)) => Some(to_candidate(binary, region, aspect)),
        None => {
            tracing::debug!("no plate-like region found");
            None
        }
    }
}

/// Every region inside the size window, in encounter order.
pub fn select_all_candidates(
    binary: &BinaryImage,
    regions: &[Region],
    config: &AllCandidatesConfig,
) -> Vec<PlateCandidate> {
    let (img_width, img_height) = binary.dimensions();
    let h = img_height as f32;
    let w = img_width as f32;

    regions
        .iter()
        .filter(|region| region.area >= config.min_area)
        .filter_map(|region| {
            let aspect = region.bbox.aspect_ratio()?;
            let height = region.bbox.height() as f32;
            let width = region.bbox.width() as f32;
            let accepted = config.min_height_ratio * h <= height
                && height <= config.max_height_ratio * h
                && config.min_width_ratio * w <= width
                && width <= config.max_width_ratio * w
                && (!config.require_wider_than_tall || width > height);
            if !accepted {
                return None;
            }
            tracing::debug!(area = region.area, aspect, "plate candidate");
            Some(to_candidate(binary, region, aspect))
        })
        .collect()
}

fn to_candidate(binary: &BinaryImage, region: &Region, aspect_ratio: f32) -> PlateCandidate {
    let (img_width, img_height) = binary.dimensions();
    PlateCandidate {
        bbox: region.bbox,
        area: region.area,
        aspect_ratio,
        position: region.bbox.normalized_center(img_width, img_height),
        binary: region.bbox.crop(binary),
    }
}
