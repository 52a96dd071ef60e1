use image::Luma;
use imageproc::region_labelling::{Connectivity, connected_components};
use std::collections::BTreeMap;

use crate::config::LabelConfig;
use crate::detection::preprocessing::foreground_count;
use crate::models::{BinaryImage, BoundingBox, Region};

/// Label 8-connected foreground components and summarize each one.
///
/// Regions come back in label order, i.e. ordered by the raster position of
/// their first pixel. An all-background image yields no regions.
pub fn label(binary: &BinaryImage, config: &LabelConfig) -> Vec<Region> {
    if let Some(limit) = config.max_foreground {
        let count = foreground_count(binary);
        if count > limit {
            tracing::warn!(count, limit, "too much foreground, skipping labeling");
            return Vec::new();
        }
    }

    let labeled = connected_components(binary, Connectivity::Eight, Luma([0u8]));

    // label -> (min_x, min_y, max_x, max_y, count), max inclusive
    let mut regions: BTreeMap<u32, (u32, u32, u32, u32, u32)> = BTreeMap::new();

    for (x, y, label) in labeled.enumerate_pixels() {
        let label_val = label[0];
        if label_val == 0 {
            continue;
        }

        regions
            .entry(label_val)
            .and_modify(|(min_x, min_y, max_x, max_y, count)| {
                *min_x = (*min_x).min(x);
                *min_y = (*min_y).min(y);
                *max_x = (*max_x).max(x);
                *max_y = (*max_y).max(y);
                *count += 1;
            })
            .or_insert((x, y, x, y, 1));
    }

    regions
        .into_iter()
        .map(|(label, (min_x, min_y, max_x, max_y, count))| Region {
            label,
            bbox: BoundingBox::new(min_y, min_x, max_y + 1, max_x + 1),
            area: count,
        })
        .collect()
}
