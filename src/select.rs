//! Supporting utilities over jet collections: kinematic selection and the
//! orderings analysis code keeps re-deriving

use crate::{jet::Jet, numeric::Float};

use prefix_num_ops::real::*;

/// Sort a collection by descending transverse momentum
pub fn sorted_by_pt<J: Jet>(mut jets: Vec<J>) -> Vec<J> {
    jets.sort_by(|a, b| b.pt().total_cmp(&a.pt()));
    jets
}

/// Sort a collection by descending b-tag discriminant
pub fn sorted_by_discriminant<J: Jet>(mut jets: Vec<J>) -> Vec<J> {
    jets.sort_by(|a, b| b.discriminant().total_cmp(&a.discriminant()));
    jets
}

/// Kinematic jet selection
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JetSelection {
    /// Minimum transverse momentum (GeV)
    pub min_pt: Float,

    /// Maximum |eta|
    pub max_abs_eta: Float,
}
//
impl JetSelection {
    /// Decide whether one jet passes the selection
    pub fn keep<J: Jet>(&self, jet: &J) -> bool {
        jet.pt() > self.min_pt && abs(jet.eta()) < self.max_abs_eta
    }

    /// Keep the passing jets, preserving their order
    pub fn select<J: Jet>(&self, jets: Vec<J>) -> Vec<J> {
        jets.into_iter().filter(|jet| self.keep(jet)).collect()
    }
}
