//! MC tagging-efficiency histograms
//!
//! Efficiencies are stored as 3-D fixed-binning histograms over
//! (|eta|, pT, flavor class), one histogram per calibrated operating point.
//! Lookups clamp out-of-range coordinates onto the outermost bin of each
//! axis — nearest-bin, never extrapolation — matching the behavior of the
//! histogramming library the tables were produced with.

use crate::{
    error::{Error, Result},
    numeric::Float,
    tag::OperatingPoint,
};

use std::{fs, path::Path};

/// A binned axis defined by its bin edges
#[derive(Debug, Clone)]
pub struct Axis {
    edges: Vec<Float>,
}
//
impl Axis {
    /// Build an axis from its bin edges (at least two, strictly increasing)
    pub fn new(edges: Vec<Float>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::Config(
                "a histogram axis needs at least two bin edges".to_owned(),
            ));
        }
        if edges.windows(2).any(|w| w[1] <= w[0]) {
            return Err(Error::Config(
                "histogram axis edges must be strictly increasing".to_owned(),
            ));
        }
        Ok(Self { edges })
    }

    /// Number of bins
    pub fn num_bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// Bin holding `x`, clamping out-of-range values to the outermost bin
    pub fn bin_of(&self, x: Float) -> usize {
        let mut bin = 0;
        for (i, lo) in self.edges[..self.edges.len() - 1].iter().enumerate() {
            if x >= *lo {
                bin = i;
            }
        }
        bin
    }
}

/// 3-D histogram over (|eta|, pT, flavor class)
#[derive(Debug, Clone)]
pub struct Hist3 {
    eta: Axis,
    pt: Axis,
    flavor: Axis,
    contents: Vec<Float>,
}
//
impl Hist3 {
    /// Build an empty (all-zero) histogram over the given bin edges
    pub fn new(
        eta_edges: Vec<Float>,
        pt_edges: Vec<Float>,
        flavor_edges: Vec<Float>,
    ) -> Result<Self> {
        let eta = Axis::new(eta_edges)?;
        let pt = Axis::new(pt_edges)?;
        let flavor = Axis::new(flavor_edges)?;
        let contents = vec![0.; eta.num_bins() * pt.num_bins() * flavor.num_bins()];
        Ok(Self {
            eta,
            pt,
            flavor,
            contents,
        })
    }

    /// Fill one bin by (eta, pT, flavor) bin indices
    pub fn set(&mut self, eta_bin: usize, pt_bin: usize, flavor_bin: usize, value: Float) -> Result<()> {
        if eta_bin >= self.eta.num_bins()
            || pt_bin >= self.pt.num_bins()
            || flavor_bin >= self.flavor.num_bins()
        {
            return Err(Error::Config(format!(
                "bin ({}, {}, {}) is outside a ({}, {}, {})-bin histogram",
                eta_bin,
                pt_bin,
                flavor_bin,
                self.eta.num_bins(),
                self.pt.num_bins(),
                self.flavor.num_bins()
            )));
        }
        let idx = self.index(eta_bin, pt_bin, flavor_bin);
        self.contents[idx] = value;
        Ok(())
    }

    /// Content of the bin holding the given coordinates
    ///
    /// Out-of-range coordinates land in the outermost bin of the offending
    /// axis.
    pub fn value_at(&self, eta: Float, pt: Float, flavor: Float) -> Float {
        let idx = self.index(self.eta.bin_of(eta), self.pt.bin_of(pt), self.flavor.bin_of(flavor));
        self.contents[idx]
    }

    fn index(&self, eta_bin: usize, pt_bin: usize, flavor_bin: usize) -> usize {
        (eta_bin * self.pt.num_bins() + pt_bin) * self.flavor.num_bins() + flavor_bin
    }
}

/// The efficiency histograms for the three calibrated operating points of
/// one tagger (overall or dedicated to one analysis process)
#[derive(Debug, Clone)]
pub struct EfficiencySet {
    histograms: [Hist3; 3],
}
//
impl EfficiencySet {
    /// Wrap pre-built histograms, ordered loose, medium, tight
    pub fn from_histograms(histograms: [Hist3; 3]) -> Self {
        Self { histograms }
    }

    /// Load a set from its histogram file
    ///
    /// The file must define histograms named `loose`, `medium` and `tight`.
    /// A missing file or a missing histogram is fatal at construction time.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_owned(),
            source,
        })?;
        let named = parse_histograms(&text).map_err(|(line, message)| Error::Malformed {
            path: path.to_owned(),
            line,
            message,
        })?;
        let find = |label: &str| {
            named
                .iter()
                .find(|(name, _)| name == label)
                .map(|(_, hist)| hist.clone())
                .ok_or_else(|| {
                    Error::Config(format!(
                        "{}: no histogram named {:?}",
                        path.display(),
                        label
                    ))
                })
        };
        Ok(Self::from_histograms([
            find("loose")?,
            find("medium")?,
            find("tight")?,
        ]))
    }

    /// Histogram for one operating point
    pub fn histogram(&self, op: OperatingPoint) -> Result<&Hist3> {
        Ok(&self.histograms[op.table_index()?])
    }
}

/// In-progress histogram while decoding a file
struct HistBuilder {
    start_line: usize,
    name: String,
    eta: Option<Vec<Float>>,
    pt: Option<Vec<Float>>,
    flavor: Option<Vec<Float>>,
    bins: Vec<(usize, usize, usize, Float)>,
}
//
impl HistBuilder {
    fn new(start_line: usize, name: String) -> Self {
        Self {
            start_line,
            name,
            eta: None,
            pt: None,
            flavor: None,
            bins: Vec::new(),
        }
    }

    fn finish(self) -> std::result::Result<(String, Hist3), (usize, String)> {
        let missing = |axis: &str| {
            (
                self.start_line,
                format!("histogram {:?} has no {} edges", self.name, axis),
            )
        };
        let eta = self.eta.ok_or_else(|| missing("eta"))?;
        let pt = self.pt.ok_or_else(|| missing("pt"))?;
        let flavor = self.flavor.ok_or_else(|| missing("flavor"))?;
        let mut hist =
            Hist3::new(eta, pt, flavor).map_err(|e| (self.start_line, e.to_string()))?;
        for (eta_bin, pt_bin, flavor_bin, value) in self.bins {
            hist.set(eta_bin, pt_bin, flavor_bin, value)
                .map_err(|e| (self.start_line, e.to_string()))?;
        }
        Ok((self.name, hist))
    }
}

/// Decode a histogram file, reporting errors as (line, message)
///
/// Directives: `hist <name>` opens a histogram, `eta`/`pt`/`flavor` list its
/// bin edges, `bin <ieta> <ipt> <iflavor> <value>` fills one bin. Unlisted
/// bins stay at zero. `#` starts a comment.
fn parse_histograms(text: &str) -> std::result::Result<Vec<(String, Hist3)>, (usize, String)> {
    let mut result = Vec::new();
    let mut current: Option<HistBuilder> = None;
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let num = idx + 1;
        let mut fields = line.split_whitespace();
        let directive = fields.next().unwrap_or("");
        match directive {
            "hist" => {
                if let Some(builder) = current.take() {
                    result.push(builder.finish()?);
                }
                let name = fields
                    .next()
                    .ok_or_else(|| (num, "hist directive without a name".to_owned()))?;
                current = Some(HistBuilder::new(num, name.to_owned()));
            }
            "eta" | "pt" | "flavor" => {
                let builder = current
                    .as_mut()
                    .ok_or_else(|| (num, format!("{} edges before any hist directive", directive)))?;
                let edges = fields
                    .map(|s| {
                        s.parse::<Float>()
                            .map_err(|_| (num, format!("could not parse edge {:?}", s)))
                    })
                    .collect::<std::result::Result<Vec<_>, _>>()?;
                match directive {
                    "eta" => builder.eta = Some(edges),
                    "pt" => builder.pt = Some(edges),
                    _ => builder.flavor = Some(edges),
                }
            }
            "bin" => {
                let builder = current
                    .as_mut()
                    .ok_or_else(|| (num, "bin before any hist directive".to_owned()))?;
                let mut next_index = |name: &'static str| {
                    fields
                        .next()
                        .ok_or_else(|| (num, format!("missing {} bin index", name)))?
                        .parse::<usize>()
                        .map_err(|_| (num, format!("could not parse {} bin index", name)))
                };
                let eta_bin = next_index("eta")?;
                let pt_bin = next_index("pt")?;
                let flavor_bin = next_index("flavor")?;
                let value = fields
                    .next()
                    .ok_or_else(|| (num, "missing bin value".to_owned()))?
                    .parse::<Float>()
                    .map_err(|_| (num, "could not parse bin value".to_owned()))?;
                builder.bins.push((eta_bin, pt_bin, flavor_bin, value));
            }
            other => return Err((num, format!("unknown directive {:?}", other))),
        }
    }
    if let Some(builder) = current.take() {
        result.push(builder.finish()?);
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flavor_axis() -> Vec<Float> {
        vec![-0.5, 0.5, 4.5, 5.5]
    }

    #[test]
    fn axis_lookup_clamps_to_outermost_bins() {
        let axis = Axis::new(vec![20., 30., 50., 100.]).unwrap();
        assert_eq!(axis.bin_of(25.), 0);
        assert_eq!(axis.bin_of(75.), 2);
        // Below and above range: nearest bin, not an error
        assert_eq!(axis.bin_of(5.), 0);
        assert_eq!(axis.bin_of(500.), 2);
    }

    #[test]
    fn axis_edges_must_increase() {
        assert!(Axis::new(vec![0., 0., 1.]).is_err());
        assert!(Axis::new(vec![1.]).is_err());
    }

    #[test]
    fn histogram_lookup_by_coordinates() {
        let mut hist = Hist3::new(vec![0., 1.2, 2.4], vec![20., 100., 670.], flavor_axis()).unwrap();
        hist.set(0, 1, 2, 0.71).unwrap();
        assert_eq!(hist.value_at(0.4, 150., 5.), 0.71);
        // Unfilled bins are zero
        assert_eq!(hist.value_at(0.4, 30., 5.), 0.);
        // Out-of-range pT clamps onto the last bin
        assert_eq!(hist.value_at(0.4, 2000., 5.), 0.71);
    }

    #[test]
    fn histogram_file_decodes() {
        let text = "\
            # tagging efficiencies\n\
            hist loose\n\
            eta 0.0 2.4\n\
            pt 20 670\n\
            flavor -0.5 0.5 4.5 5.5\n\
            bin 0 0 2 0.85\n\
            hist medium\n\
            eta 0.0 2.4\n\
            pt 20 670\n\
            flavor -0.5 0.5 4.5 5.5\n\
            bin 0 0 2 0.65\n";
        let named = parse_histograms(text).unwrap();
        assert_eq!(named.len(), 2);
        assert_eq!(named[0].0, "loose");
        assert_eq!(named[0].1.value_at(1., 100., 5.), 0.85);
        assert_eq!(named[1].1.value_at(1., 100., 5.), 0.65);
    }

    #[test]
    fn stray_directives_are_rejected() {
        assert!(parse_histograms("eta 0.0 2.4\n").is_err());
        assert!(parse_histograms("hist x\nwat 1 2\n").is_err());
        let missing_axes = parse_histograms("hist x\neta 0.0 2.4\n");
        assert!(missing_axes.is_err());
    }
}
