//! Angle utilities for the wheel.
//! Sector `i` of an `n`-sector wheel spans `[i * 2π/n, (i+1) * 2π/n)` before rotation
//! is applied; rotation increases clockwise in screen coordinates.

use std::f64::consts::{PI, TAU};

/// Fixed pointer position: the top of the wheel in canvas coordinates (y grows downward).
pub const POINTER_ANGLE: f64 = 1.5 * PI;

/// Map any angle into `[0, 2π)`.
pub fn normalize(theta: f64) -> f64 {
    let r = theta.rem_euclid(TAU);
    // rem_euclid rounds tiny negative inputs up to exactly TAU
    if r >= TAU {
        0.0
    } else {
        r
    }
}

/// Angular width of one sector
pub fn sector_width(option_count: usize) -> f64 {
    TAU / option_count as f64
}

/// Angle of the middle of sector `index` before rotation
pub fn sector_center(index: usize, option_count: usize) -> f64 {
    index as f64 * sector_width(option_count) + PI / option_count as f64
}

/// Which sector sits under the pointer when the wheel rests at `rotation`.
/// Returns None for an empty wheel.
pub fn locate(rotation: f64, option_count: usize) -> Option<usize> {
    if option_count == 0 {
        return None;
    }
    let adjusted = normalize(rotation);
    let diff = normalize(POINTER_ANGLE - adjusted);
    let index = (diff / sector_width(option_count)).floor() as usize;
    Some(index % option_count)
}

/// Rotation that puts the center of sector `index` exactly under the pointer.
pub fn centered_rotation(index: usize, option_count: usize) -> f64 {
    normalize(POINTER_ANGLE - sector_center(index, option_count))
}
