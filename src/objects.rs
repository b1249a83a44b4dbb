//! Object-quality criteria for jets and leptons
//!
//! Every predicate is a pure function of one object's kinematic and
//! identification fields. They are evaluated once per batch by the
//! augmentation stage and cached as `is_good` / `is_veto` flags; re-applying
//! them to an already flagged object yields the same answer.

use crate::{
    event::{Electron, FatJet, Jet, Muon},
    numeric::Float,
};

/// Quality thresholds for jets and veto leptons
pub struct ObjectCuts {
    /// Minimum AK4 jet transverse momentum (GeV)
    pub ak4_pt_min: Float,
    /// Maximum AK4 jet absolute pseudorapidity
    pub ak4_abs_eta_max: Float,
    /// Minimum AK8 jet transverse momentum (GeV)
    pub ak8_pt_min: Float,
    /// Maximum AK8 jet absolute pseudorapidity
    pub ak8_abs_eta_max: Float,
    /// Minimum veto-electron transverse momentum (GeV)
    pub electron_pt_min: Float,
    /// Maximum veto-electron absolute pseudorapidity
    pub electron_abs_eta_max: Float,
    /// Maximum veto-electron mini-isolation
    pub electron_mini_iso_max: Float,
    /// Minimum veto-muon transverse momentum (GeV)
    pub muon_pt_min: Float,
    /// Maximum veto-muon absolute pseudorapidity
    pub muon_abs_eta_max: Float,
    /// Maximum veto-muon mini-isolation
    pub muon_mini_iso_max: Float,
}
//
impl Default for ObjectCuts {
    /// Thresholds of the nominal t-channel objects definition
    fn default() -> Self {
        Self {
            ak4_pt_min: 30.,
            ak4_abs_eta_max: 2.4,
            ak8_pt_min: 170.,
            ak8_abs_eta_max: 2.4,
            electron_pt_min: 10.,
            electron_abs_eta_max: 2.5,
            electron_mini_iso_max: 0.1,
            muon_pt_min: 10.,
            muon_abs_eta_max: 2.4,
            muon_mini_iso_max: 0.4,
        }
    }
}
//
impl ObjectCuts {
    /// Decide whether an AK4 jet is analysis quality
    pub fn is_good_ak4(&self, jet: &Jet) -> bool {
        jet.id && jet.pt > self.ak4_pt_min && jet.eta.abs() < self.ak4_abs_eta_max
    }

    /// Decide whether an AK8 jet is analysis quality
    pub fn is_good_ak8(&self, jet: &FatJet) -> bool {
        jet.id && jet.pt > self.ak8_pt_min && jet.eta.abs() < self.ak8_abs_eta_max
    }

    /// Decide whether an electron counts as a mini-isolated veto lepton
    pub fn is_veto_electron(&self, electron: &Electron) -> bool {
        electron.pt > self.electron_pt_min
            && electron.eta.abs() < self.electron_abs_eta_max
            && electron.mini_iso < self.electron_mini_iso_max
    }

    /// Decide whether a muon counts as a mini-isolated veto lepton
    pub fn is_veto_muon(&self, muon: &Muon) -> bool {
        muon.pt > self.muon_pt_min
            && muon.eta.abs() < self.muon_abs_eta_max
            && muon.mini_iso < self.muon_mini_iso_max
    }
}
