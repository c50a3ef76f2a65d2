//! Scale-factor calibration tables and their per-operating-point readers
//!
//! A calibration is a set of measured cells: for each (operating point,
//! flavor, systematic variation), a data/MC scale factor valid over an
//! (|eta|, pT) rectangle. One [`CalibrationReader`] serves a single
//! operating point and evaluates with "auto bounds": kinematics outside the
//! measured range are clamped onto its boundary instead of extrapolated.

use crate::{
    error::{Error, Result},
    numeric::Float,
    tag::{Flavor, OperatingPoint},
};

use prefix_num_ops::real::*;

use std::{fs, path::Path};

/// One calibrated cell: a scale factor valid over an (|eta|, pT) rectangle
#[derive(Debug, Clone, PartialEq)]
pub struct CalibEntry {
    /// Operating point the measurement was performed at
    pub operating_point: OperatingPoint,

    /// Jet flavor the measurement applies to
    pub flavor: Flavor,

    /// Systematic variation label ("central", "up", "down", ...)
    pub systematic: String,

    /// Lower |eta| edge of the validity cell
    pub eta_min: Float,

    /// Upper |eta| edge of the validity cell
    pub eta_max: Float,

    /// Lower pT edge of the validity cell (GeV)
    pub pt_min: Float,

    /// Upper pT edge of the validity cell (GeV)
    pub pt_max: Float,

    /// Data/MC scale factor over the cell
    pub scale_factor: Float,
}

/// Every measured cell from one calibration epoch
///
/// Immutable once loaded; readers borrow their curves from it at
/// construction time and never write back.
#[derive(Debug, Clone, Default)]
pub struct CalibrationTable {
    entries: Vec<CalibEntry>,
}
//
impl CalibrationTable {
    /// Wrap a set of measured cells
    pub fn new(entries: Vec<CalibEntry>) -> Self {
        Self { entries }
    }

    /// Load a calibration from its table file
    ///
    /// The format is one cell per line,
    /// `op flavor systematic eta_min eta_max pt_min pt_max scale_factor`,
    /// with `#` starting a comment. A missing or malformed file is fatal:
    /// there is no sensible weight to compute without the calibration.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::parse(&text).map_err(|(line, message)| Error::Malformed {
            path: path.to_owned(),
            line,
            message,
        })
    }

    /// Decode the table file contents, reporting errors as (line, message)
    fn parse(text: &str) -> std::result::Result<Self, (usize, String)> {
        let mut entries = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let entry = parse_entry(line).map_err(|message| (idx + 1, message))?;
            entries.push(entry);
        }
        Ok(Self::new(entries))
    }

    /// Access the measured cells
    pub fn entries(&self) -> &[CalibEntry] {
        &self.entries
    }
}

/// Decode one table line into a cell
fn parse_entry(line: &str) -> std::result::Result<CalibEntry, String> {
    let mut fields = line.split_whitespace();
    let mut next = |name: &'static str| {
        fields
            .next()
            .ok_or_else(|| format!("missing {} column", name))
    };

    let operating_point = match next("operating point")? {
        "loose" => OperatingPoint::Loose,
        "medium" => OperatingPoint::Medium,
        "tight" => OperatingPoint::Tight,
        "reshaping" => OperatingPoint::Reshaping,
        other => return Err(format!("unknown operating point {:?}", other)),
    };
    let flavor = match next("flavor")? {
        "b" => Flavor::B,
        "c" => Flavor::C,
        "udsg" => Flavor::Udsg,
        other => return Err(format!("unknown flavor {:?}", other)),
    };
    let systematic = next("systematic")?.to_owned();
    let eta_min = parse_float("eta_min", next("eta_min")?)?;
    let eta_max = parse_float("eta_max", next("eta_max")?)?;
    let pt_min = parse_float("pt_min", next("pt_min")?)?;
    let pt_max = parse_float("pt_max", next("pt_max")?)?;
    let scale_factor = parse_float("scale factor", next("scale factor")?)?;
    if fields.next().is_some() {
        return Err("trailing data after the scale factor".to_owned());
    }

    Ok(CalibEntry {
        operating_point,
        flavor,
        systematic,
        eta_min,
        eta_max,
        pt_min,
        pt_max,
        scale_factor,
    })
}

/// Parse a floating-point field, naming it on failure
fn parse_float(name: &'static str, data: &str) -> std::result::Result<Float, String> {
    data.parse::<Float>()
        .map_err(|_| format!("could not parse {} from {:?}", name, data))
}

/// Scale-factor evaluator for a single operating point
///
/// Owns the curves for all three flavors and every systematic variation the
/// source table carries at this point. Immutable once built.
#[derive(Debug, Clone)]
pub struct CalibrationReader {
    operating_point: OperatingPoint,
    entries: Vec<CalibEntry>,
}
//
impl CalibrationReader {
    /// Extract the curves for one operating point from a loaded calibration
    pub fn new(table: &CalibrationTable, operating_point: OperatingPoint) -> Self {
        let entries = table
            .entries()
            .iter()
            .filter(|e| e.operating_point == operating_point)
            .cloned()
            .collect();
        Self {
            operating_point,
            entries,
        }
    }

    /// Operating point this reader was built for
    pub fn operating_point(&self) -> OperatingPoint {
        self.operating_point
    }

    /// Evaluate the scale factor, clamping kinematics into the fit range
    ///
    /// Queries outside the measured (|eta|, pT) range reuse the boundary
    /// value. An unknown variation, or a gap in the measured cells,
    /// evaluates to 0 like the upstream calibration files do; the weighting
    /// engine's finiteness guard then neutralizes the jet.
    pub fn eval_auto_bounds(
        &self,
        systematic: &str,
        flavor: Flavor,
        eta: Float,
        pt: Float,
    ) -> Float {
        let mut eta_range = (Float::INFINITY, Float::NEG_INFINITY);
        let mut pt_range = (Float::INFINITY, Float::NEG_INFINITY);
        let mut measured = false;
        for e in self.curves(flavor, systematic) {
            measured = true;
            eta_range = (eta_range.0.min(e.eta_min), eta_range.1.max(e.eta_max));
            pt_range = (pt_range.0.min(e.pt_min), pt_range.1.max(e.pt_max));
        }
        if !measured {
            return 0.;
        }

        let abs_eta = abs(eta).clamp(eta_range.0, eta_range.1);
        let pt = pt.clamp(pt_range.0, pt_range.1);
        for e in self.curves(flavor, systematic) {
            if abs_eta >= e.eta_min
                && abs_eta <= e.eta_max
                && pt >= e.pt_min
                && pt <= e.pt_max
            {
                return e.scale_factor;
            }
        }
        0.
    }

    /// Measured cells for one (flavor, systematic) pair
    fn curves<'r>(
        &'r self,
        flavor: Flavor,
        systematic: &'r str,
    ) -> impl Iterator<Item = &'r CalibEntry> + 'r {
        self.entries
            .iter()
            .filter(move |e| e.flavor == flavor && e.systematic == systematic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(
        flavor: Flavor,
        systematic: &str,
        eta: (Float, Float),
        pt: (Float, Float),
        scale_factor: Float,
    ) -> CalibEntry {
        CalibEntry {
            operating_point: OperatingPoint::Medium,
            flavor,
            systematic: systematic.to_owned(),
            eta_min: eta.0,
            eta_max: eta.1,
            pt_min: pt.0,
            pt_max: pt.1,
            scale_factor,
        }
    }

    #[test]
    fn out_of_range_kinematics_reuse_the_boundary() {
        let table = CalibrationTable::new(vec![cell(
            Flavor::B,
            "central",
            (0., 2.4),
            (30., 670.),
            1.1,
        )]);
        let reader = CalibrationReader::new(&table, OperatingPoint::Medium);
        let at_boundary = reader.eval_auto_bounds("central", Flavor::B, 2.4, 670.);
        let far_outside = reader.eval_auto_bounds("central", Flavor::B, 10., 5000.);
        assert_eq!(far_outside, at_boundary);
        assert_eq!(at_boundary, 1.1);
    }

    #[test]
    fn negative_eta_evaluates_as_absolute() {
        let table = CalibrationTable::new(vec![cell(
            Flavor::C,
            "central",
            (0., 2.4),
            (20., 1000.),
            0.93,
        )]);
        let reader = CalibrationReader::new(&table, OperatingPoint::Medium);
        assert_eq!(reader.eval_auto_bounds("central", Flavor::C, -1.3, 45.), 0.93);
    }

    #[test]
    fn cells_are_resolved_by_kinematics() {
        let table = CalibrationTable::new(vec![
            cell(Flavor::Udsg, "central", (0., 2.4), (20., 100.), 1.02),
            cell(Flavor::Udsg, "central", (0., 2.4), (100., 670.), 1.08),
        ]);
        let reader = CalibrationReader::new(&table, OperatingPoint::Medium);
        assert_eq!(reader.eval_auto_bounds("central", Flavor::Udsg, 0.5, 50.), 1.02);
        assert_eq!(reader.eval_auto_bounds("central", Flavor::Udsg, 0.5, 300.), 1.08);
        // Below the lowest measured pT: clamp into the first cell
        assert_eq!(reader.eval_auto_bounds("central", Flavor::Udsg, 0.5, 5.), 1.02);
    }

    #[test]
    fn unknown_variation_evaluates_to_zero() {
        let table = CalibrationTable::new(vec![cell(
            Flavor::B,
            "central",
            (0., 2.4),
            (20., 1000.),
            1.0,
        )]);
        let reader = CalibrationReader::new(&table, OperatingPoint::Medium);
        assert_eq!(reader.eval_auto_bounds("sideways", Flavor::B, 1., 50.), 0.);
    }

    #[test]
    fn table_text_decodes() {
        let text = "\
            # epoch: full dataset\n\
            medium b central 0.0 2.4 20.0 1000.0 0.95\n\
            medium b up 0.0 2.4 20.0 1000.0 1.05  # +1 sigma\n\
            \n\
            loose udsg central 0.0 2.4 20.0 1000.0 1.12\n";
        let table = CalibrationTable::parse(text).unwrap();
        assert_eq!(table.entries().len(), 3);
        assert_eq!(table.entries()[1].systematic, "up");
        assert_eq!(table.entries()[2].operating_point, OperatingPoint::Loose);
    }

    #[test]
    fn malformed_lines_are_reported_with_their_number() {
        let text = "medium b central 0.0 2.4 20.0 1000.0 0.95\nmedium b central zero 2.4 20.0 1000.0 0.95\n";
        let err = CalibrationTable::parse(text).unwrap_err();
        assert_eq!(err.0, 2);
        assert!(err.1.contains("eta_min"));
    }
}
