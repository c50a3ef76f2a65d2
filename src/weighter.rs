//! The b-tag event-weight engine
//!
//! Simulated samples do not tag jets at quite the data-measured rates, so
//! every simulated event gets a multiplicative correction. For each jet, the
//! engine works out which tag category its discriminant lands in, then
//! interpolates between the data/MC scale factors of the two operating
//! points bounding that category (the standard event-reweighting recipe of
//! the b-tag calibration group). The per-event weight is the product of the
//! per-jet weights.
//!
//! All tables are loaded once at construction and never mutated; every
//! computation is a pure `&self` function of its inputs, so a host
//! application may freely share one engine across threads.

use crate::{
    calib::{CalibrationReader, CalibrationTable},
    config::WeighterConfig,
    efficiency::EfficiencySet,
    error::Result,
    jet::Jet,
    numeric::Float,
    tag::{Flavor, OperatingPoint, RunRange, TagThresholds, Tagger},
};

use prefix_num_ops::real::*;

use tracing::error;

use std::path::Path;

/// Systematic-variation labels for one weight computation
///
/// The b/c family and the light-flavor family carry independent uncertainty
/// budgets, and the fast-simulation correction varies independently again.
#[derive(Debug, Clone, Copy)]
pub struct Systematics<'a> {
    /// Variation for b and c jets, full-simulation scale factors
    pub heavy: &'a str,

    /// Variation for light jets, full-simulation scale factors
    pub light: &'a str,

    /// Variation for b and c jets, fast-simulation correction
    pub heavy_fast: &'a str,

    /// Variation for light jets, fast-simulation correction
    pub light_fast: &'a str,
}
//
impl Systematics<'static> {
    /// The nominal calibration everywhere
    pub const CENTRAL: Self = Systematics {
        heavy: "central",
        light: "central",
        heavy_fast: "central",
        light_fast: "central",
    };
}
//
impl<'a> Systematics<'a> {
    /// Full-simulation variations, keeping the fast-sim correction nominal
    pub fn full_sim(heavy: &'a str, light: &'a str) -> Self {
        Systematics {
            heavy,
            light,
            heavy_fast: "central",
            light_fast: "central",
        }
    }
}
//
impl Default for Systematics<'_> {
    fn default() -> Self {
        Systematics::CENTRAL
    }
}

/// Per-call switches of a weight computation
#[derive(Debug, Clone, Copy)]
pub struct WeightOptions {
    /// Which discriminant algorithm the jets' scores come from
    pub tagger: Tagger,

    /// Use the efficiency histograms dedicated to the configured process
    /// instead of the all-process ones
    pub by_process: bool,

    /// Calibration epoch to evaluate against
    pub runs: RunRange,
}
//
impl Default for WeightOptions {
    fn default() -> Self {
        WeightOptions {
            tagger: Tagger::Csvv2,
            by_process: false,
            runs: RunRange::All,
        }
    }
}

/// The calibrated readers of one fit epoch, ordered loose, medium, tight
#[derive(Debug, Clone)]
pub struct ReaderSet {
    readers: [CalibrationReader; 3],
}
//
impl ReaderSet {
    /// Build one reader per calibrated operating point
    pub fn from_table(table: &CalibrationTable) -> Self {
        let readers = OperatingPoint::CALIBRATED.map(|op| CalibrationReader::new(table, op));
        Self { readers }
    }

    /// Load the epoch's table file and build its readers
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::from_table(&CalibrationTable::load(path)?))
    }

    /// Reader for one operating point
    pub fn reader(&self, op: OperatingPoint) -> Result<&CalibrationReader> {
        Ok(&self.readers[op.table_index()?])
    }
}

/// Pre-built reader sets and efficiency histograms for one tagger
#[derive(Debug, Clone)]
pub struct TaggerTables {
    /// Full-simulation readers, full dataset
    pub full: ReaderSet,

    /// Full-simulation readers, runs B-F
    pub full_bf: ReaderSet,

    /// Full-simulation readers, runs G-H
    pub full_gh: ReaderSet,

    /// Single-period full-simulation readers (B, C-D, E-F), for taggers
    /// with per-period fits
    pub per_run: Option<[ReaderSet; 3]>,

    /// Fast-simulation correction readers
    pub fast: ReaderSet,

    /// Efficiency histograms, all processes combined
    pub efficiency: EfficiencySet,

    /// Efficiency histograms dedicated to the configured process
    pub efficiency_proc: EfficiencySet,
}
//
impl TaggerTables {
    /// Readers for a full-simulation epoch, if this tagger was fit for it
    fn full_sim_readers(&self, runs: RunRange) -> Option<&ReaderSet> {
        match runs {
            RunRange::All => Some(&self.full),
            RunRange::BToF => Some(&self.full_bf),
            RunRange::GToH => Some(&self.full_gh),
            RunRange::B => self.per_run.as_ref().map(|sets| &sets[0]),
            RunRange::CToD => self.per_run.as_ref().map(|sets| &sets[1]),
            RunRange::EToF => self.per_run.as_ref().map(|sets| &sets[2]),
        }
    }
}

/// The b-tag scale-factor reweighting engine
#[derive(Debug, Clone)]
pub struct BTagWeighter {
    is_fast_sim: bool,
    csvv2_thresholds: TagThresholds,
    deep_thresholds: TagThresholds,
    csvv2: TaggerTables,
    deep: TaggerTables,
}
//
impl BTagWeighter {
    /// Load every calibration table and efficiency histogram named by the
    /// configuration
    ///
    /// Any missing or malformed file aborts construction: no weight can be
    /// trusted without the full table set.
    pub fn new(config: &WeighterConfig) -> Result<Self> {
        let files = &config.files;
        let csvv2 = TaggerTables {
            full: ReaderSet::load(&files.csvv2_full)?,
            full_bf: ReaderSet::load(&files.csvv2_full_bf)?,
            full_gh: ReaderSet::load(&files.csvv2_full_gh)?,
            per_run: Some([
                ReaderSet::load(&files.csvv2_run_b)?,
                ReaderSet::load(&files.csvv2_run_cd)?,
                ReaderSet::load(&files.csvv2_run_ef)?,
            ]),
            fast: ReaderSet::load(&files.csvv2_fastsim)?,
            efficiency: EfficiencySet::load(&files.efficiency)?,
            efficiency_proc: EfficiencySet::load(&files.efficiency_proc)?,
        };
        let deep = TaggerTables {
            full: ReaderSet::load(&files.deep_full)?,
            full_bf: ReaderSet::load(&files.deep_full_bf)?,
            full_gh: ReaderSet::load(&files.deep_full_gh)?,
            per_run: None,
            fast: ReaderSet::load(&files.deep_fastsim)?,
            efficiency: EfficiencySet::load(&files.efficiency_deep)?,
            efficiency_proc: EfficiencySet::load(&files.efficiency_deep_proc)?,
        };
        Ok(Self::from_tables(config, csvv2, deep))
    }

    /// Build the engine from already-loaded tables
    ///
    /// This is the constructor to use with mock tables in tests, or when the
    /// host application manages table files itself.
    pub fn from_tables(config: &WeighterConfig, csvv2: TaggerTables, deep: TaggerTables) -> Self {
        Self {
            is_fast_sim: config.is_fast_sim,
            csvv2_thresholds: config.csvv2_thresholds,
            deep_thresholds: config.deep_thresholds,
            csvv2,
            deep,
        }
    }

    /// Weight correcting the simulated tag-category population of one event
    ///
    /// Strict product of the per-jet weights; an empty collection weighs
    /// exactly 1.
    pub fn event_weight<J: Jet>(
        &self,
        jets: &[J],
        ops: &[OperatingPoint],
        systematics: &Systematics,
        options: &WeightOptions,
    ) -> Result<Float> {
        let mut product = 1.;
        for jet in jets {
            product *= self.jet_weight(jet, ops, systematics, options)?;
        }
        Ok(product)
    }

    /// Event weight for a single tag boundary, with nominal fast-simulation
    /// corrections
    pub fn event_weight_at<J: Jet>(
        &self,
        jets: &[J],
        op: OperatingPoint,
        heavy_systematic: &str,
        light_systematic: &str,
        options: &WeightOptions,
    ) -> Result<Float> {
        self.event_weight(
            jets,
            &[op],
            &Systematics::full_sim(heavy_systematic, light_systematic),
            options,
        )
    }

    /// Weight correcting the simulated tag-category population of one jet
    ///
    /// `ops` is the ordered operating-point list defining the tag-category
    /// boundaries; the jet's category is the highest-index point whose
    /// threshold its discriminant exceeds. The weight interpolates between
    /// the scale factors at that point and at the next-tighter one,
    /// following the event-reweighting recipe of the b-tag calibration
    /// group. The result is always finite.
    pub fn jet_weight(
        &self,
        jet: &impl Jet,
        ops: &[OperatingPoint],
        systematics: &Systematics,
        options: &WeightOptions,
    ) -> Result<Float> {
        let flavor = Flavor::from_truth_code(jet.flavor_code());
        let (full_syst, fast_syst) = if flavor.is_heavy() {
            (systematics.heavy, systematics.heavy_fast)
        } else {
            (systematics.light, systematics.light_fast)
        };

        let thresholds = self.thresholds(options.tagger);
        let mut cuts = Vec::with_capacity(ops.len());
        for op in ops {
            cuts.push(thresholds.cut(*op)?);
        }

        let discriminant = jet.discriminant();
        let mut tag = None;
        for (index, cut) in cuts.iter().enumerate() {
            if discriminant > *cut {
                tag = Some(index);
            }
        }

        let full = self.full_sim_readers(options.runs, options.tagger);
        let fast = &self.tables(options.tagger).fast;

        let (pt, eta) = (jet.pt(), jet.eta());
        let (mut eff1, mut eff2) = (1., 0.);
        let (mut sf1, mut sf2) = (1., 1.);
        let (mut sf1_fs, mut sf2_fs) = (1., 1.);
        if let Some(index) = tag {
            let op = ops[index];
            eff1 = self.mc_tag_efficiency(
                jet.flavor_code(),
                pt,
                eta,
                op,
                options.tagger,
                options.by_process,
            )?;
            sf1 = full.reader(op)?.eval_auto_bounds(full_syst, flavor, eta, pt);
            if self.is_fast_sim {
                sf1_fs = fast.reader(op)?.eval_auto_bounds(fast_syst, flavor, eta, pt);
            }
        }
        let next = tag.map_or(0, |index| index + 1);
        if next < ops.len() {
            let op = ops[next];
            eff2 = self.mc_tag_efficiency(
                jet.flavor_code(),
                pt,
                eta,
                op,
                options.tagger,
                options.by_process,
            )?;
            sf2 = full.reader(op)?.eval_auto_bounds(full_syst, flavor, eta, pt);
            if self.is_fast_sim {
                sf2_fs = fast.reader(op)?.eval_auto_bounds(fast_syst, flavor, eta, pt);
            }
        }

        let eff1_fs = eff1 / sf1_fs;
        let eff2_fs = eff2 / sf2_fs;
        let result =
            (sf1 * sf1_fs * eff1_fs - sf2 * sf2_fs * eff2_fs) / (eff1_fs - eff2_fs);
        // A vanishing efficiency gap is expected at table boundaries; one
        // degenerate jet must not poison the whole event product.
        if !result.is_finite() {
            return Ok(1.);
        }
        Ok(result)
    }

    /// Jet weight for a single tag boundary, with nominal fast-simulation
    /// corrections
    pub fn jet_weight_at(
        &self,
        jet: &impl Jet,
        op: OperatingPoint,
        heavy_systematic: &str,
        light_systematic: &str,
        options: &WeightOptions,
    ) -> Result<Float> {
        self.jet_weight(
            jet,
            &[op],
            &Systematics::full_sim(heavy_systematic, light_systematic),
            options,
        )
    }

    /// MC truth tagging efficiency at one operating point
    pub fn mc_tag_efficiency(
        &self,
        truth_code: i32,
        pt: Float,
        eta: Float,
        op: OperatingPoint,
        tagger: Tagger,
        by_process: bool,
    ) -> Result<Float> {
        // Anything not exactly b or c was filled as "other" (0) upstream,
        // and must collapse the same way here or the lookup mis-bins.
        let code = match truth_code.abs() {
            4 => 4,
            5 => 5,
            _ => 0,
        };
        let tables = self.tables(tagger);
        let set = if by_process {
            &tables.efficiency_proc
        } else {
            &tables.efficiency
        };
        let hist = set.histogram(op)?;
        Ok(hist.value_at(abs(eta), pt, code as Float))
    }

    /// Full-simulation reader set for one epoch
    ///
    /// DeepCSV has no single-period fits; requesting one is reported and
    /// answered with the CSVv2 fit for the same period, which keeps the
    /// batch running but is numerically unreliable.
    fn full_sim_readers(&self, runs: RunRange, tagger: Tagger) -> &ReaderSet {
        if let Some(readers) = self.tables(tagger).full_sim_readers(runs) {
            return readers;
        }
        error!(?runs, "DeepCSV has not been calibrated for this run range");
        self.csvv2.full_sim_readers(runs).unwrap_or(&self.csvv2.full)
    }

    fn tables(&self, tagger: Tagger) -> &TaggerTables {
        match tagger {
            Tagger::Csvv2 => &self.csvv2,
            Tagger::DeepCsv => &self.deep,
        }
    }

    fn thresholds(&self, tagger: Tagger) -> &TagThresholds {
        match tagger {
            Tagger::Csvv2 => &self.csvv2_thresholds,
            Tagger::DeepCsv => &self.deep_thresholds,
        }
    }
}
