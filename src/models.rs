use image::{GrayImage, ImageBuffer, Luma};
use imageproc::rect::Rect;
use serde::{Deserialize, Serialize};

/// Binary image: 255 marks foreground, 0 marks background.
pub type BinaryImage = GrayImage;

/// Real-valued glyph resampled to the canonical size, values in [0, 1].
pub type GlyphImage = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Axis-aligned box in pixel coordinates, half-open on the max side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_row: u32,
    pub min_col: u32,
    pub max_row: u32,
    pub max_col: u32,
}

impl BoundingBox {
    pub fn new(min_row: u32, min_col: u32, max_row: u32, max_col: u32) -> Self {
        Self {
            min_row,
            min_col,
            max_row,
            max_col,
        }
    }

    pub fn width(&self) -> u32 {
        self.max_col.saturating_sub(self.min_col)
    }

    pub fn height(&self) -> u32 {
        self.max_row.saturating_sub(self.min_row)
    }

    /// A box with no rows or no columns.
    pub fn is_degenerate(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }

    /// Width over height, `None` for degenerate boxes.
    pub fn aspect_ratio(&self) -> Option<f32> {
        if self.is_degenerate() {
            return None;
        }
        Some(self.width() as f32 / self.height() as f32)
    }

    /// Center as (row, col) fractions of an image of the given size.
    pub fn normalized_center(&self, image_width: u32, image_height: u32) -> (f32, f32) {
        let row = (self.min_row + self.max_row) as f32 / 2.0;
        let col = (self.min_col + self.max_col) as f32 / 2.0;
        (
            row / image_height.max(1) as f32,
            col / image_width.max(1) as f32,
        )
    }

    /// Copy the boxed area out of an 8-bit image.
    pub fn crop(&self, img: &GrayImage) -> GrayImage {
        image::imageops::crop_imm(img, self.min_col, self.min_row, self.width(), self.height())
            .to_image()
    }

    pub fn to_rect(&self) -> Option<Rect> {
        if self.is_degenerate() {
            return None;
        }
        Some(Rect::at(self.min_col as i32, self.min_row as i32).of_size(self.width(), self.height()))
    }
}

/// One connected component of a binary image.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub label: u32,
    pub bbox: BoundingBox,
    /// Number of foreground pixels in the component.
    pub area: u32,
}

/// A region that passed a plate selection policy.
#[derive(Debug, Clone)]
pub struct PlateCandidate {
    pub bbox: BoundingBox,
    pub area: u32,
    pub aspect_ratio: f32,
    /// Box center as (row, col) fractions of the source image.
    pub position: (f32, f32),
    /// The binary image cropped to `bbox`.
    pub binary: BinaryImage,
}

/// A character glyph together with the column it was found at.
#[derive(Debug, Clone)]
pub struct Glyph {
    pub image: GlyphImage,
    pub column: u32,
}

/// Output of character segmentation, in discovery order.
///
/// `glyphs`, `columns` and `boxes` are parallel.
#[derive(Debug, Clone, Default)]
pub struct Segmentation {
    pub glyphs: Vec<GlyphImage>,
    pub columns: Vec<u32>,
    pub boxes: Vec<BoundingBox>,
}

impl Segmentation {
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Consume the segmentation and return glyphs in left-to-right order.
    pub fn into_ordered(self) -> Vec<Glyph> {
        let mut glyphs: Vec<Glyph> = self
            .glyphs
            .into_iter()
            .zip(self.columns)
            .map(|(image, column)| Glyph { image, column })
            .collect();
        glyphs.sort_by_key(|g| g.column);
        glyphs
    }
}

/// A located plate and its ordered glyphs, before classification.
#[derive(Debug, Clone)]
pub struct DetectedPlate {
    pub bbox: BoundingBox,
    pub glyphs: Vec<Glyph>,
    /// Character boxes relative to the plate crop, left to right.
    pub character_boxes: Vec<BoundingBox>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CharacterReading {
    pub column: u32,
    pub label: char,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlateReading {
    pub bbox: BoundingBox,
    pub characters: Vec<CharacterReading>,
    pub text: String,
}

/// Result of running the full pipeline on one image.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recognition {
    pub plates: Vec<PlateReading>,
}

impl Recognition {
    /// Text of the first plate, or an empty string when none was found.
    pub fn text(&self) -> &str {
        self.plates.first().map(|p| p.text.as_str()).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.plates.is_empty()
    }
}
