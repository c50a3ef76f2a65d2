//! B-tag scale-factor reweighting and jet-selection utilities
//!
//!
//! # Introduction (for the physicist)
//!
//! Simulated samples do not reproduce the measured b-tagging performance of
//! the detector, so analyses reweight each simulated event by a product of
//! per-jet data/MC correction factors. This crate implements that
//! reweighting: it classifies each jet's tag category from its discriminant
//! score, looks up the MC tagging efficiency and the calibrated scale
//! factors at the bounding operating points (with independent systematic
//! variations for the heavy- and light-flavor families, and an extra
//! correction for fast-simulation samples), and combines them with the
//! two-point interpolation recipe of the b-tag calibration group.
//!
//!
//! # Introduction (for the numerical guy)
//!
//! Everything here is table lookups with carefully specified edge behavior:
//! scale-factor evaluation clamps kinematics onto the fit boundary instead
//! of extrapolating, efficiency histograms answer out-of-range queries from
//! their outermost bin, and the per-jet combination guards its one division
//! so that a degenerate efficiency gap yields a neutral weight of exactly 1
//! instead of a NaN that would poison the event product.
//!
//!
//! # Introduction (for the computer guy)
//!
//! The crate is a library with no I/O beyond eagerly loading its calibration
//! and efficiency tables at construction. The engine is immutable once
//! built and computes through `&self` only, so it can be shared read-only
//! across threads by the host framework. Jets enter through the small
//! [`jet::Jet`] trait; errors that make the engine unusable surface as
//! [`Error`], while per-jet numerical accidents are recovered locally.

#![warn(missing_docs)]

pub mod calib;
pub mod config;
pub mod efficiency;
mod error;
pub mod jet;
mod numeric;
pub mod select;
pub mod tag;
pub mod weighter;

pub use crate::{
    calib::{CalibEntry, CalibrationReader, CalibrationTable},
    config::{CalibrationFiles, Process, WeighterConfig},
    efficiency::{EfficiencySet, Hist3},
    error::{Error, Result},
    jet::{Jet, JetCandidate},
    numeric::Float,
    tag::{Era, Flavor, OperatingPoint, RunRange, TagThresholds, Tagger},
    weighter::{BTagWeighter, ReaderSet, Systematics, TaggerTables, WeightOptions},
};
