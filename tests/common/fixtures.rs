use image::{DynamicImage, GrayImage, Luma};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect;
use platescan::{BinaryImage, CharacterClassifier, Result};

/// Gray levels used by the synthetic scenes.
pub const CAR_BODY: u8 = 30;
pub const PLATE_WHITE: u8 = 230;
pub const INK: u8 = 20;

/// A uniform grayscale image.
pub fn blank(width: u32, height: u32, value: u8) -> GrayImage {
    GrayImage::from_pixel(width, height, Luma([value]))
}

/// Fill a rectangle given as (row, col, height, width).
pub fn fill(img: &mut GrayImage, row: u32, col: u32, height: u32, width: u32, value: u8) {
    let rect = Rect::at(col as i32, row as i32).of_size(width, height);
    draw_filled_rect_mut(img, rect, Luma([value]));
}

/// Binary image with the given (row, col, height, width) rectangles set.
pub fn binary_with_rects(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> BinaryImage {
    let mut img = blank(width, height, 0);
    for &(row, col, h, w) in rects {
        fill(&mut img, row, col, h, w, 255);
    }
    img
}

/// Character columns inside the synthetic plate, relative to the plate.
pub const PLATE_CHAR_COLUMNS: [u32; 3] = [20, 60, 100];

/// 400x200 scene: dark body, white 150x30 plate at rows 120..150, cols
/// 100..250, with three dark 8x16 characters.
pub fn car_scene() -> GrayImage {
    let mut img = blank(400, 200, CAR_BODY);
    fill(&mut img, 120, 100, 30, 150, PLATE_WHITE);
    for col in PLATE_CHAR_COLUMNS {
        fill(&mut img, 127, 100 + col, 16, 8, INK);
    }
    img
}

pub fn car_scene_dynamic() -> DynamicImage {
    DynamicImage::ImageLuma8(car_scene())
}

/// Answers the same label for every glyph.
pub struct FixedClassifier(pub char);

impl CharacterClassifier for FixedClassifier {
    fn predict(&self, features: &[f32]) -> Result<char> {
        assert_eq!(features.len(), 400, "classifier expects 20x20 glyphs");
        assert!(features.iter().all(|&v| v == 0.0 || v == 1.0));
        Ok(self.0)
    }
}
