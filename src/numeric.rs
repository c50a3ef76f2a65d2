//! Basic numerical concepts used throughout the crate

/// Calibration fits, efficiency histograms and event weights are all produced
/// and consumed in double precision
pub type Float = f64;
