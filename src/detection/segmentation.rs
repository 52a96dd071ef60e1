use image::GrayImage;
use image::imageops::{self, FilterType};

use crate::config::{LabelConfig, SegmentationConfig};
use crate::detection::{components, preprocessing};
use crate::models::{BinaryImage, BoundingBox, GlyphImage, Region, Segmentation};

/// Split a grayscale plate crop into character glyphs.
///
/// Glyphs and their column keys come back in discovery order; sorting them
/// into reading order is left to the caller (see
/// [`Segmentation::into_ordered`]). No qualifying region gives an empty
/// segmentation.
pub fn segment_characters(plate: &GrayImage, config: &SegmentationConfig) -> Segmentation {
    let binary = preprocessing::binarize(plate, &config.binarize);
    segment_binary_plate(&binary, config, &LabelConfig::default())
}

/// Character extraction from an already binarized plate crop.
pub fn segment_binary_plate(
    binary: &BinaryImage,
    config: &SegmentationConfig,
    labeling: &LabelConfig,
) -> Segmentation {
    let regions = components::label(binary, labeling);
    let mut segmentation = Segmentation::default();

    for region in regions.iter().filter(|r| is_character(r, config)) {
        let bbox = region.bbox;
        tracing::debug!(
            column = bbox.min_col,
            area = region.area,
            aspect = bbox.aspect_ratio().unwrap_or_default(),
            "character found"
        );
        segmentation.glyphs.push(resize_glyph(binary, &bbox, config.glyph_size));
        segmentation.columns.push(bbox.min_col);
        segmentation.boxes.push(bbox);
    }

    tracing::debug!(
        regions = regions.len(),
        characters = segmentation.len(),
        "segmentation done"
    );
    segmentation
}

fn is_character(region: &Region, config: &SegmentationConfig) -> bool {
    let Some(aspect) = region.bbox.aspect_ratio() else {
        return false;
    };
    config.min_area < region.area
        && region.area < config.max_area
        && config.min_aspect < aspect
        && aspect < config.max_aspect
        && region.bbox.height() > config.min_height
        && region.bbox.width() > config.min_width
}

/// Resample the boxed part of a binary mask to a `size`x`size` real-valued glyph.
///
/// The mask is taken as 0.0/1.0 and resized with a triangle filter, which
/// averages over the source footprint when shrinking; the result is not
/// re-binarized.
pub fn resize_glyph(binary: &BinaryImage, bbox: &BoundingBox, size: u32) -> GlyphImage {
    let mask = GlyphImage::from_fn(bbox.width(), bbox.height(), |x, y| {
        let v = binary.get_pixel(bbox.min_col + x, bbox.min_row + y)[0];
        image::Luma([if v != 0 { 1.0f32 } else { 0.0 }])
    });
    imageops::resize(&mask, size, size, FilterType::Triangle)
}
