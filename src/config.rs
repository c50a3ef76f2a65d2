//! Construction-time configuration of the weighting engine
//!
//! Everything the engine hardwires is gathered here instead: the analysis
//! process, the simulation mode, the reconstruction era, the discriminant
//! thresholds and the location of every table file. This keeps the engine
//! buildable against mock tables in tests and against non-standard file
//! layouts in production.

use crate::{
    error::{Error, Result},
    tag::{Era, TagThresholds, Tagger},
};

use std::{path::PathBuf, str::FromStr};

/// Analysis processes with dedicated efficiency histograms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Process {
    /// Top-quark pair production
    TtBar,
    /// QCD multijet production
    Qcd,
    /// W boson + jets production
    WJets,
}
//
impl Process {
    /// Tag used in efficiency file names
    pub fn tag(self) -> &'static str {
        match self {
            Process::TtBar => "tt",
            Process::Qcd => "qcd",
            Process::WJets => "wjets",
        }
    }
}
//
impl FromStr for Process {
    type Err = Error;

    /// Decode a process tag; anything unrecognized is fatal, the engine
    /// must not start misconfigured
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tt" => Ok(Process::TtBar),
            "qcd" => Ok(Process::Qcd),
            "wjets" => Ok(Process::WJets),
            other => Err(Error::Config(format!(
                "process {:?} not found, valid processes are tt, qcd and wjets",
                other
            ))),
        }
    }
}

/// Locations of every calibration and efficiency input
///
/// Full-simulation scale factors come in one table per fit epoch; DeepCSV
/// was only ever fit for the full dataset and the two major sub-periods.
#[derive(Debug, Clone)]
pub struct CalibrationFiles {
    /// CSVv2 full-simulation table, full dataset
    pub csvv2_full: PathBuf,
    /// CSVv2 full-simulation table, runs B-F
    pub csvv2_full_bf: PathBuf,
    /// CSVv2 full-simulation table, runs G-H
    pub csvv2_full_gh: PathBuf,
    /// CSVv2 full-simulation table, run B
    pub csvv2_run_b: PathBuf,
    /// CSVv2 full-simulation table, runs C-D
    pub csvv2_run_cd: PathBuf,
    /// CSVv2 full-simulation table, runs E-F
    pub csvv2_run_ef: PathBuf,
    /// CSVv2 fast-simulation correction table
    pub csvv2_fastsim: PathBuf,
    /// DeepCSV full-simulation table, full dataset
    pub deep_full: PathBuf,
    /// DeepCSV full-simulation table, runs B-F
    pub deep_full_bf: PathBuf,
    /// DeepCSV full-simulation table, runs G-H
    pub deep_full_gh: PathBuf,
    /// DeepCSV fast-simulation correction table
    pub deep_fastsim: PathBuf,
    /// CSVv2 efficiency histograms, all processes combined
    pub efficiency: PathBuf,
    /// DeepCSV efficiency histograms, all processes combined
    pub efficiency_deep: PathBuf,
    /// CSVv2 efficiency histograms for the configured process
    pub efficiency_proc: PathBuf,
    /// DeepCSV efficiency histograms for the configured process
    pub efficiency_deep_proc: PathBuf,
}
//
impl CalibrationFiles {
    /// The conventional file layout under a data directory
    pub fn conventional(data_dir: impl Into<PathBuf>, process: Process) -> Self {
        let dir = data_dir.into();
        let path = |name: &str| dir.join(name);
        CalibrationFiles {
            csvv2_full: path("csvv2_full.tbl"),
            csvv2_full_bf: path("csvv2_full_bf.tbl"),
            csvv2_full_gh: path("csvv2_full_gh.tbl"),
            csvv2_run_b: path("csvv2_run_b.tbl"),
            csvv2_run_cd: path("csvv2_run_cd.tbl"),
            csvv2_run_ef: path("csvv2_run_ef.tbl"),
            csvv2_fastsim: path("csvv2_fastsim.tbl"),
            deep_full: path("deepcsv_full.tbl"),
            deep_full_bf: path("deepcsv_full_bf.tbl"),
            deep_full_gh: path("deepcsv_full_gh.tbl"),
            deep_fastsim: path("deepcsv_fastsim.tbl"),
            efficiency: path("btag_efficiency.hst"),
            efficiency_deep: path("btag_efficiency_deep.hst"),
            efficiency_proc: path(&format!("btag_efficiency_{}.hst", process.tag())),
            efficiency_deep_proc: path(&format!("btag_efficiency_deep_{}.hst", process.tag())),
        }
    }
}

/// Everything the engine needs in order to build its tables
#[derive(Debug, Clone)]
pub struct WeighterConfig {
    /// Analysis process whose dedicated efficiency histograms to load
    pub process: Process,

    /// Whether the sample was produced with the approximate detector
    /// simulation (enables the fast-simulation correction factors)
    pub is_fast_sim: bool,

    /// Reconstruction-era convention for the discriminant cut constants
    pub era: Era,

    /// CSVv2 discriminant thresholds (defaults to the measured cuts)
    pub csvv2_thresholds: TagThresholds,

    /// DeepCSV discriminant thresholds (defaults to the measured cuts)
    pub deep_thresholds: TagThresholds,

    /// Table file locations
    pub files: CalibrationFiles,
}
//
impl WeighterConfig {
    /// Conventional configuration for a process, simulation mode and era,
    /// with table files under `data_dir`
    pub fn new(
        process: Process,
        is_fast_sim: bool,
        era: Era,
        data_dir: impl Into<PathBuf>,
    ) -> Self {
        WeighterConfig {
            process,
            is_fast_sim,
            era,
            csvv2_thresholds: TagThresholds::defaults(Tagger::Csvv2, era),
            deep_thresholds: TagThresholds::defaults(Tagger::DeepCsv, era),
            files: CalibrationFiles::conventional(data_dir, process),
        }
    }

    /// Threshold set in effect for one tagger
    pub fn thresholds(&self, tagger: Tagger) -> &TagThresholds {
        match tagger {
            Tagger::Csvv2 => &self.csvv2_thresholds,
            Tagger::DeepCsv => &self.deep_thresholds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn process_tags_round_trip() {
        for process in [Process::TtBar, Process::Qcd, Process::WJets] {
            assert_eq!(process.tag().parse::<Process>().ok(), Some(process));
        }
    }

    #[test]
    fn unknown_process_is_fatal() {
        assert!("zprime".parse::<Process>().is_err());
    }

    #[test]
    fn conventional_layout_is_per_process() {
        let files = CalibrationFiles::conventional("data", Process::Qcd);
        assert!(files.efficiency_proc.ends_with("btag_efficiency_qcd.hst"));
        assert!(files.efficiency_deep_proc.ends_with("btag_efficiency_deep_qcd.hst"));
    }

    #[test]
    fn default_thresholds_follow_the_era() {
        let cfg = WeighterConfig::new(Process::TtBar, false, Era::Cmssw8, "data");
        assert_eq!(cfg.thresholds(Tagger::Csvv2).medium, 0.8484);
        assert_eq!(cfg.thresholds(Tagger::DeepCsv).medium, 0.6324);
    }
}
