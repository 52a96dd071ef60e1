//! Tests for plate candidate selection.
//!
//! Tests cover:
//! - Best-aspect policy: size, aspect, area and position filters, closest
//!   aspect wins, ties keep the first region
//! - All-candidates policy: every accepted region, in order
//! - Dispatch through `PlatePolicy`

mod common;

use common::*;
use platescan::detection::components::label;
use platescan::detection::plate::{select_all_candidates, select_plate_candidate};
use platescan::{AllCandidatesConfig, BestAspectConfig, LabelConfig};

const W: u32 = 400;
const H: u32 = 200;

fn regions_of(binary: &BinaryImage) -> Vec<Region> {
    label(binary, &LabelConfig::default())
}

#[test]
fn test_closer_aspect_wins() {
    // 100x20 (aspect 5.0) and 60x20 (aspect 3.0), both in the lower half.
    let binary = binary_with_rects(W, H, &[(110, 10, 20, 60), (150, 200, 20, 100)]);
    let regions = regions_of(&binary);
    assert_eq!(regions.len(), 2);

    let plate = select_plate_candidate(&binary, &regions, &BestAspectConfig::default())
        .expect("plate should be found");

    assert_eq!(plate.bbox, BoundingBox::new(150, 200, 170, 300));
    assert!((plate.aspect_ratio - 5.0).abs() < 1e-6);
    assert_eq!(plate.area, 2000);
    assert_eq!(plate.binary.dimensions(), (100, 20));
    assert!(plate.binary.pixels().all(|p| p[0] == 255));
}

#[test]
fn test_closest_to_target_among_accepted() {
    // Aspects 6.0 and 4.0: 4.0 is nearer to 4.5.
    let binary = binary_with_rects(W, H, &[(105, 10, 20, 120), (150, 200, 20, 80)]);
    let regions = regions_of(&binary);

    let plate = select_plate_candidate(&binary, &regions, &BestAspectConfig::default())
        .expect("plate should be found");

    assert_eq!(plate.bbox.min_col, 200);
    assert!((plate.aspect_ratio - 4.0).abs() < 1e-6);
}

#[test]
fn test_equal_distance_keeps_first_region() {
    // Aspects 4.0 and 5.0 are both 0.5 away from 4.5.
    let binary = binary_with_rects(W, H, &[(110, 10, 20, 80), (150, 200, 20, 100)]);
    let regions = regions_of(&binary);

    let plate = select_plate_candidate(&binary, &regions, &BestAspectConfig::default())
        .expect("plate should be found");

    assert_eq!(plate.bbox.min_col, 10);
}

#[test]
fn test_upper_half_is_ignored() {
    let binary = binary_with_rects(W, H, &[(20, 10, 20, 100)]);
    let regions = regions_of(&binary);

    assert!(select_plate_candidate(&binary, &regions, &BestAspectConfig::default()).is_none());

    // Starting exactly at the middle row is accepted.
    let binary = binary_with_rects(W, H, &[(100, 10, 20, 100)]);
    let regions = regions_of(&binary);
    assert!(select_plate_candidate(&binary, &regions, &BestAspectConfig::default()).is_some());
}

#[test]
fn test_area_bounds_are_exclusive() {
    // 100x10 has aspect 10; 50x10 has area 500: neither qualifies.
    let binary = binary_with_rects(W, H, &[(110, 10, 10, 100), (150, 200, 11, 50)]);
    let regions = regions_of(&binary);
    assert!(select_plate_candidate(&binary, &regions, &BestAspectConfig::default()).is_none());

    // Raise the floor to exactly the region's area.
    let binary = binary_with_rects(W, H, &[(150, 200, 20, 100)]);
    let regions = regions_of(&binary);
    let config = BestAspectConfig {
        min_area: 2000,
        ..BestAspectConfig::default()
    };
    assert!(select_plate_candidate(&binary, &regions, &config).is_none());
}

#[test]
fn test_no_regions_means_no_plate() {
    let binary = blank(W, H, 0);
    assert!(select_plate_candidate(&binary, &[], &BestAspectConfig::default()).is_none());
}

#[test]
fn test_degenerate_region_is_rejected() {
    let binary = blank(W, H, 0);
    let regions = vec![Region {
        label: 1,
        bbox: BoundingBox::new(150, 10, 150, 110),
        area: 2000,
    }];
    assert!(select_plate_candidate(&binary, &regions, &BestAspectConfig::default()).is_none());
    assert!(select_all_candidates(&binary, &regions, &AllCandidatesConfig::default()).is_empty());
}

#[test]
fn test_all_candidates_returns_every_match_in_order() {
    // Height window [16, 40], width window [60, 160] on a 400x200 image.
    let binary = binary_with_rects(
        W,
        H,
        &[
            (5, 5, 20, 80),     // accepted, upper half is fine here
            (60, 150, 30, 30),  // too narrow
            (100, 10, 16, 61),  // accepted, height on the inclusive bound
            (150, 250, 10, 70), // too short
            (170, 100, 25, 100),
        ],
    );
    let regions = regions_of(&binary);
    assert_eq!(regions.len(), 5);

    let plates = select_all_candidates(&binary, &regions, &AllCandidatesConfig::default());

    let boxes: Vec<BoundingBox> = plates.iter().map(|p| p.bbox).collect();
    assert_eq!(
        boxes,
        vec![
            BoundingBox::new(5, 5, 25, 85),
            BoundingBox::new(100, 10, 116, 71),
            BoundingBox::new(170, 100, 195, 200),
        ]
    );
    assert_eq!(plates[1].binary.dimensions(), (61, 16));
}

#[test]
fn test_all_candidates_noise_floor() {
    let binary = binary_with_rects(W, H, &[(10, 10, 20, 80)]);
    let regions = vec![Region {
        label: 1,
        bbox: BoundingBox::new(10, 10, 30, 90),
        area: 49,
    }];
    assert!(select_all_candidates(&binary, &regions, &AllCandidatesConfig::default()).is_empty());
}

#[test]
fn test_policy_dispatch() {
    let binary = binary_with_rects(W, H, &[(110, 10, 20, 80), (150, 200, 20, 100)]);
    let regions = regions_of(&binary);

    let best = PlatePolicy::default().select(&binary, &regions);
    assert_eq!(best.len(), 1);

    let all =
        PlatePolicy::AllCandidates(AllCandidatesConfig::default()).select(&binary, &regions);
    assert_eq!(all.len(), 2);
}

#[test]
fn test_candidate_position_is_normalized() {
    let binary = binary_with_rects(W, H, &[(150, 200, 20, 100)]);
    let regions = regions_of(&binary);
    let plate = select_plate_candidate(&binary, &regions, &BestAspectConfig::default())
        .expect("plate should be found");

    let (row, col) = plate.position;
    assert!((row - 0.8).abs() < 1e-6);
    assert!((col - 0.625).abs() < 1e-6);
}

#[test]
fn test_all_candidates_requires_wider_than_tall() {
    let binary = binary_with_rects(W, H, &[(10, 10, 30, 30)]);
    let regions = regions_of(&binary);
    let config = AllCandidatesConfig {
        min_width_ratio: 0.05,
        ..AllCandidatesConfig::default()
    };
    assert!(select_all_candidates(&binary, &regions, &config).is_empty());

    let config = AllCandidatesConfig {
        require_wider_than_tall: false,
        ..config
    };
    assert_eq!(select_all_candidates(&binary, &regions, &config).len(), 1);
}
