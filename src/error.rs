//! Error type shared across the crate
//!
//! Configuration problems (an unknown process tag, a missing or malformed
//! table file, an operating point without calibration) are the only
//! recoverable-as-`Err` failures here. Per-jet numerical accidents are
//! deliberately *not* errors: they are neutralized locally by the weighting
//! engine so that a batch job over many events never aborts on one bad jet.

use crate::tag::OperatingPoint;

use thiserror::Error;

use std::path::PathBuf;

/// Failures reported by table loading and weight evaluation
#[derive(Error, Debug)]
pub enum Error {
    /// Engine configuration that can never produce usable weights
    #[error("configuration error: {0}")]
    Config(String),

    /// A calibration or efficiency file could not be read
    #[error("could not read {}: {source}", path.display())]
    Io {
        /// File that failed to open or read
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// A calibration or efficiency file failed to parse
    #[error("{}:{line}: {message}", path.display())]
    Malformed {
        /// File the offending line came from
        path: PathBuf,
        /// 1-based line number of the offending line
        line: usize,
        /// What was wrong with it
        message: String,
    },

    /// An operating point with no calibration curves, efficiency histogram
    /// or discriminant cut behind it
    #[error("operating point {0:?} carries no calibration")]
    UnusableOperatingPoint(OperatingPoint),
}

/// Crate-wide result shorthand
pub type Result<T> = std::result::Result<T, Error>;
