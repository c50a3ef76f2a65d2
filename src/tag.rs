//! The b-tagging vocabulary: operating points, truth flavors, run ranges,
//! discriminant algorithms and their cut thresholds

use crate::{
    error::{Error, Result},
    numeric::Float,
};

/// Discrete tag-strictness levels, ordered from loosest to tightest
///
/// Only `Loose`, `Medium` and `Tight` carry calibration curves, efficiency
/// histograms and discriminant cuts. `Reshaping` names the continuous
/// shape-calibration mode of the upstream fit files; asking the weighting
/// engine to use it as a tag category is a configuration error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperatingPoint {
    /// ~10% light-jet mistag rate
    Loose,
    /// ~1% light-jet mistag rate
    Medium,
    /// ~0.1% light-jet mistag rate
    Tight,
    /// Continuous discriminant-shape calibration
    Reshaping,
}
//
impl OperatingPoint {
    /// The points that carry calibration curves and efficiency histograms
    pub const CALIBRATED: [OperatingPoint; 3] = [
        OperatingPoint::Loose,
        OperatingPoint::Medium,
        OperatingPoint::Tight,
    ];

    /// Index into per-operating-point table arrays
    pub(crate) fn table_index(self) -> Result<usize> {
        match self {
            OperatingPoint::Loose => Ok(0),
            OperatingPoint::Medium => Ok(1),
            OperatingPoint::Tight => Ok(2),
            OperatingPoint::Reshaping => Err(Error::UnusableOperatingPoint(self)),
        }
    }

    /// Lower-case label used in table files and histogram names
    pub fn label(self) -> &'static str {
        match self {
            OperatingPoint::Loose => "loose",
            OperatingPoint::Medium => "medium",
            OperatingPoint::Tight => "tight",
            OperatingPoint::Reshaping => "reshaping",
        }
    }
}

/// Truth-level jet flavor classes
///
/// In the ghost-clustering scheme used to assign truth flavor there are only
/// b, c and "everything else" classes, so the collapse from a flavor code is
/// total and unrecognized codes cannot occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flavor {
    /// b-quark jets (truth code ±5)
    B,
    /// c-quark jets (truth code ±4)
    C,
    /// Light quarks, gluons and everything else
    Udsg,
}
//
impl Flavor {
    /// Classify a jet from its truth parton/hadron flavor code
    pub fn from_truth_code(code: i32) -> Self {
        match code.abs() {
            5 => Flavor::B,
            4 => Flavor::C,
            _ => Flavor::Udsg,
        }
    }

    /// Whether this flavor draws from the heavy-flavor systematic budget
    ///
    /// b and c jets share one uncertainty family, light jets have their own.
    pub fn is_heavy(self) -> bool {
        matches!(self, Flavor::B | Flavor::C)
    }

    /// Label used in calibration table files
    pub fn label(self) -> &'static str {
        match self {
            Flavor::B => "b",
            Flavor::C => "c",
            Flavor::Udsg => "udsg",
        }
    }
}

/// Data-taking sub-ranges with independently fit calibrations
///
/// `All` is the fit over the full dataset; the others are luminosity
/// sub-periods. DeepCSV fits exist only for `All`, `BToF` and `GToH`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunRange {
    /// Full dataset
    All,
    /// Runs B through F
    BToF,
    /// Runs G and H
    GToH,
    /// Run B alone
    B,
    /// Runs C and D
    CToD,
    /// Runs E and F
    EToF,
}

/// Discriminant algorithm whose score the jets carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tagger {
    /// Combined inclusive secondary-vertex tagger, v2
    Csvv2,
    /// Its deep-network successor
    DeepCsv,
}

/// Reconstruction-era convention selecting the discriminant cut constants
///
/// The working-point cuts were re-measured when the reconstruction changed,
/// so the numeric thresholds depend on which software era produced the
/// samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Era {
    /// Legacy CMSSW 7 reconstruction
    Cmssw7,
    /// Current reconstruction
    Cmssw8,
}

/// Discriminant cut thresholds for the three calibrated operating points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TagThresholds {
    /// Loose working-point cut
    pub loose: Float,
    /// Medium working-point cut
    pub medium: Float,
    /// Tight working-point cut
    pub tight: Float,
}
//
impl TagThresholds {
    /// The measured working-point cuts for a tagger in a given era
    ///
    /// DeepCSV did not exist in the CMSSW 7 era; its cuts there are zero.
    pub fn defaults(tagger: Tagger, era: Era) -> Self {
        match (tagger, era) {
            (Tagger::Csvv2, Era::Cmssw7) => TagThresholds {
                loose: 0.605,
                medium: 0.890,
                tight: 0.970,
            },
            (Tagger::Csvv2, Era::Cmssw8) => TagThresholds {
                loose: 0.5426,
                medium: 0.8484,
                tight: 0.9535,
            },
            (Tagger::DeepCsv, Era::Cmssw7) => TagThresholds {
                loose: 0.,
                medium: 0.,
                tight: 0.,
            },
            (Tagger::DeepCsv, Era::Cmssw8) => TagThresholds {
                loose: 0.2219,
                medium: 0.6324,
                tight: 0.8958,
            },
        }
    }

    /// Cut for one operating point; `Reshaping` has none
    pub fn cut(&self, op: OperatingPoint) -> Result<Float> {
        match op {
            OperatingPoint::Loose => Ok(self.loose),
            OperatingPoint::Medium => Ok(self.medium),
            OperatingPoint::Tight => Ok(self.tight),
            OperatingPoint::Reshaping => Err(Error::UnusableOperatingPoint(op)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truth_code_collapse() {
        assert_eq!(Flavor::from_truth_code(5), Flavor::B);
        assert_eq!(Flavor::from_truth_code(-5), Flavor::B);
        assert_eq!(Flavor::from_truth_code(4), Flavor::C);
        assert_eq!(Flavor::from_truth_code(-4), Flavor::C);
        assert_eq!(Flavor::from_truth_code(21), Flavor::Udsg);
        assert_eq!(Flavor::from_truth_code(3), Flavor::Udsg);
        assert_eq!(Flavor::from_truth_code(0), Flavor::Udsg);
    }

    #[test]
    fn heavy_flavor_family() {
        assert!(Flavor::B.is_heavy());
        assert!(Flavor::C.is_heavy());
        assert!(!Flavor::Udsg.is_heavy());
    }

    #[test]
    fn threshold_constants() {
        let cuts = TagThresholds::defaults(Tagger::Csvv2, Era::Cmssw8);
        assert_eq!(cuts.loose, 0.5426);
        assert_eq!(cuts.medium, 0.8484);
        assert_eq!(cuts.tight, 0.9535);
        let legacy_deep = TagThresholds::defaults(Tagger::DeepCsv, Era::Cmssw7);
        assert_eq!(legacy_deep.tight, 0.);
    }

    #[test]
    fn reshaping_has_no_cut() {
        let cuts = TagThresholds::defaults(Tagger::DeepCsv, Era::Cmssw8);
        assert!(cuts.cut(OperatingPoint::Reshaping).is_err());
        assert_eq!(cuts.cut(OperatingPoint::Medium).ok(), Some(0.6324));
    }
}
