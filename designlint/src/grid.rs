//! Grid alignment predicate and the corrective snap used by fix mode.
//!
//! Coordinates read from design files carry floating-point noise, so
//! alignment is judged at two-decimal (0.01 mm) precision rather than
//! bit-exactly.

/// Round to two decimal places.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Whether `value` sits on a multiple of `grid`, at two-decimal precision.
pub fn is_aligned(value: f64, grid: f64) -> bool {
    round2((value / grid).round() * grid) == round2(value)
}

/// Snap `value` up to the grid.
///
/// Misaligned values always move in the positive direction to the next
/// multiple, never to the nearest one. Values already on the grid are
/// re-rounded onto it; ceiling a multiple that is exact only up to float
/// noise would jump it a whole grid step, which would make repeated fixes
/// walk a coordinate across the document.
pub fn snap(value: f64, grid: f64) -> f64 {
    if is_aligned(value, grid) {
        (value / grid).round() * grid
    } else {
        (value / grid).ceil() * grid
    }
}

pub fn inch_to_mm(inches: f64) -> f64 {
    inches * 25.4
}

pub fn mm_to_inch(mm: f64) -> f64 {
    mm / 25.4
}
