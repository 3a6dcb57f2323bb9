//! Sea level series quality check.
//!
//! Grid cells on tidal flats dry out at low water. The model then holds the
//! sea level nearly constant (the bed level) until the water returns, so the
//! series shows flat stretches instead of a smooth trough and the low tide
//! time cannot be read from it.

/// True if any three consecutive values all lie within `tolerance` of each other.
///
/// # Example
/// ```
/// use bay_tides_lib::quality::is_flat;
///
/// assert!(is_flat(&[1.00, 1.02, 1.01], 0.05));
/// assert!(!is_flat(&[1.0, 1.6, 2.2], 0.05));
/// ```
pub fn is_flat(levels: &[f64], tolerance: f64) -> bool {
    levels.windows(3).any(|w| {
        let (z0, z1, z2) = (w[0], w[1], w[2]);
        (z1 - z0).abs() < tolerance && (z2 - z1).abs() < tolerance && (z2 - z0).abs() < tolerance
    })
}

/// A series is usable for tide times when it has no flat stretch.
pub fn is_usable(levels: &[f64], tolerance: f64) -> bool {
    !is_flat(levels, tolerance)
}
