use image::{DynamicImage, GrayImage, Luma};

use crate::config::{BinarizePolicy, Polarity, ThresholdSource};
use crate::models::BinaryImage;

const OTSU_BINS: usize = 256;

/// Convert image to grayscale
pub fn to_grayscale(img: &DynamicImage) -> GrayImage {
    img.to_luma8()
}

/// Otsu threshold over arbitrary real-valued samples.
///
/// Values are bucketed into 256 bins spanning the observed range and the
/// returned threshold is a bin center: samples above it form the upper
/// class. When a run of adjacent splits ties for the maximum between-class
/// variance, the midpoint of the run is returned. A constant input returns
/// its value; an empty input returns 0.
pub fn otsu_threshold(values: &[f32]) -> f32 {
    let Some((min, max)) = value_range(values) else {
        return 0.0;
    };
    if min == max {
        return min;
    }

    let bin_width = (max - min) / OTSU_BINS as f32;
    let mut hist = [0u64; OTSU_BINS];
    for &v in values {
        let idx = (((v - min) / bin_width) as usize).min(OTSU_BINS - 1);
        hist[idx] += 1;
    }
    let centers: Vec<f64> = (0..OTSU_BINS)
        .map(|i| (min + (i as f32 + 0.5) * bin_width) as f64)
        .collect();

    let total: u64 = hist.iter().sum();
    let total_sum: f64 = hist
        .iter()
        .zip(&centers)
        .map(|(&count, &center)| count as f64 * center)
        .sum();

    // variance[i] is the between-class variance when bins 0..=i are the lower class
    let mut variance = [0.0f64; OTSU_BINS - 1];
    let mut weight_low = 0u64;
    let mut sum_low = 0.0f64;
    for i in 0..OTSU_BINS - 1 {
        weight_low += hist[i];
        sum_low += hist[i] as f64 * centers[i];
        let weight_high = total - weight_low;
        if weight_low == 0 || weight_high == 0 {
            continue;
        }
        let mean_low = sum_low / weight_low as f64;
        let mean_high = (total_sum - sum_low) / weight_high as f64;
        variance[i] = weight_low as f64 * weight_high as f64 * (mean_low - mean_high).powi(2);
    }

    let best = variance.iter().cloned().fold(0.0f64, f64::max);
    let tolerance = best * 1e-9;
    let Some(first) = variance.iter().position(|&v| best - v <= tolerance) else {
        return min;
    };
    let last = variance[first..]
        .iter()
        .position(|&v| best - v > tolerance)
        .map(|offset| first + offset - 1)
        .unwrap_or(OTSU_BINS - 2);

    ((centers[first] + centers[last]) / 2.0) as f32
}

/// Otsu threshold of an 8-bit image, on the 0-255 scale.
pub fn otsu_level(img: &GrayImage) -> f32 {
    let values: Vec<f32> = img.pixels().map(|p| p[0] as f32).collect();
    otsu_threshold(&values)
}

/// Resolve the threshold a policy applies to this image.
pub fn resolve_threshold(img: &GrayImage, policy: &BinarizePolicy) -> f32 {
    match policy.threshold {
        ThresholdSource::Otsu => otsu_level(img),
        ThresholdSource::Fixed(t) => t,
    }
}

/// Binarize with the given policy; foreground pixels become 255.
pub fn binarize(img: &GrayImage, policy: &BinarizePolicy) -> BinaryImage {
    let threshold = resolve_threshold(img, policy);
    binarize_at(img, threshold, policy.polarity)
}

pub fn binarize_at(img: &GrayImage, threshold: f32, polarity: Polarity) -> BinaryImage {
    BinaryImage::from_fn(img.width(), img.height(), |x, y| {
        let v = img.get_pixel(x, y)[0] as f32;
        if is_foreground(v, threshold, polarity) {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    })
}

/// Map real values to 1.0 (foreground) or 0.0 against their own Otsu threshold.
///
/// A constant input has no split; it is treated as all foreground when the
/// value lies on the foreground side of 0.5.
pub fn binarize_values(values: &[f32], polarity: Polarity) -> Vec<f32> {
    let Some((min, max)) = value_range(values) else {
        return Vec::new();
    };
    let threshold = if min == max { 0.5 } else { otsu_threshold(values) };
    values
        .iter()
        .map(|&v| {
            let fg = if min == max {
                match polarity {
                    Polarity::Above => v >= threshold,
                    Polarity::Below => v < threshold,
                }
            } else {
                is_foreground(v, threshold, polarity)
            };
            if fg { 1.0 } else { 0.0 }
        })
        .collect()
}

pub fn foreground_count(binary: &BinaryImage) -> u64 {
    binary.pixels().filter(|p| p[0] != 0).count() as u64
}

fn is_foreground(v: f32, threshold: f32, polarity: Polarity) -> bool {
    match polarity {
        Polarity::Above => v > threshold,
        Polarity::Below => v < threshold,
    }
}

fn value_range(values: &[f32]) -> Option<(f32, f32)> {
    let mut iter = values.iter().copied().filter(|v| v.is_finite());
    let first = iter.next()?;
    Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}
