//! Storage for batched collision events
//!
//! A batch bundles per-event scalars with variable-length object collections
//! (AK4 jets, AK8 "fat" jets, electrons, muons). The batch is row-structured:
//! every per-event quantity lives inside one [`Event`] record, so the
//! invariant that all columns share the same leading length holds by
//! construction. Filtering always goes through [`EventBatch::select`], which
//! consumes a fully materialized boolean mask.

use crate::numeric::Float;

/// One reconstructed AK4 jet
#[derive(Clone, Debug, PartialEq)]
pub struct Jet {
    /// Transverse momentum (GeV)
    pub pt: Float,
    /// Pseudorapidity
    pub eta: Float,
    /// Azimuthal angle (radians)
    pub phi: Float,
    /// Jet mass (GeV)
    pub mass: Float,
    /// Tight jet identification decision
    pub id: bool,
    /// Transverse momentum with the jet energy scale shifted up (GeV)
    pub pt_jes_up: Float,
    /// Transverse momentum with the jet energy scale shifted down (GeV)
    pub pt_jes_down: Float,
    /// Transverse momentum with the jet energy resolution shifted up (GeV)
    pub pt_jer_up: Float,
    /// Transverse momentum with the jet energy resolution shifted down (GeV)
    pub pt_jer_down: Float,
    /// Quality flag, attached by the augmentation stage
    pub is_good: bool,
}
//
impl Jet {
    /// Build a jet passing identification, with all shifted momenta equal to
    /// the nominal one
    pub fn new(pt: Float, eta: Float, phi: Float, mass: Float) -> Self {
        Self {
            pt,
            eta,
            phi,
            mass,
            id: true,
            pt_jes_up: pt,
            pt_jes_down: pt,
            pt_jer_up: pt,
            pt_jer_down: pt,
            is_good: false,
        }
    }
}

/// One reconstructed AK8 (fat) jet
#[derive(Clone, Debug, PartialEq)]
pub struct FatJet {
    /// Transverse momentum (GeV)
    pub pt: Float,
    /// Pseudorapidity
    pub eta: Float,
    /// Azimuthal angle (radians)
    pub phi: Float,
    /// Soft-drop jet mass (GeV)
    pub mass: Float,
    /// Tight jet identification decision
    pub id: bool,
    /// Transverse momentum with the jet energy scale shifted up (GeV)
    pub pt_jes_up: Float,
    /// Transverse momentum with the jet energy scale shifted down (GeV)
    pub pt_jes_down: Float,
    /// Transverse momentum with the jet energy resolution shifted up (GeV)
    pub pt_jer_up: Float,
    /// Transverse momentum with the jet energy resolution shifted down (GeV)
    pub pt_jer_down: Float,
    /// Quality flag, attached by the augmentation stage
    pub is_good: bool,
    /// Substructure classifier score, attached by the optional tagger stage
    pub tagger_score: Option<Float>,
}
//
impl FatJet {
    /// Build a fat jet passing identification, with all shifted momenta equal
    /// to the nominal one
    pub fn new(pt: Float, eta: Float, phi: Float, mass: Float) -> Self {
        Self {
            pt,
            eta,
            phi,
            mass,
            id: true,
            pt_jes_up: pt,
            pt_jes_down: pt,
            pt_jer_up: pt,
            pt_jer_down: pt,
            is_good: false,
            tagger_score: None,
        }
    }
}

/// One reconstructed electron
#[derive(Clone, Debug, PartialEq)]
pub struct Electron {
    /// Transverse momentum (GeV)
    pub pt: Float,
    /// Pseudorapidity
    pub eta: Float,
    /// Azimuthal angle (radians)
    pub phi: Float,
    /// Mini-isolation variable
    pub mini_iso: Float,
    /// Veto-quality flag, attached by the augmentation stage
    pub is_veto: bool,
}
//
impl Electron {
    /// Build an electron candidate
    pub fn new(pt: Float, eta: Float, phi: Float, mini_iso: Float) -> Self {
        Self { pt, eta, phi, mini_iso, is_veto: false }
    }
}

/// One reconstructed muon
#[derive(Clone, Debug, PartialEq)]
pub struct Muon {
    /// Transverse momentum (GeV)
    pub pt: Float,
    /// Pseudorapidity
    pub eta: Float,
    /// Azimuthal angle (radians)
    pub phi: Float,
    /// Mini-isolation variable
    pub mini_iso: Float,
    /// Veto-quality flag, attached by the augmentation stage
    pub is_veto: bool,
}
//
impl Muon {
    /// Build a muon candidate
    pub fn new(pt: Float, eta: Float, phi: Float, mini_iso: Float) -> Self {
        Self { pt, eta, phi, mini_iso, is_veto: false }
    }
}

/// One recorded or simulated collision event
#[derive(Clone, Debug, Default)]
pub struct Event {
    /// Missing transverse energy (GeV)
    pub met: Float,
    /// Azimuthal angle of the missing transverse energy (radians)
    pub met_phi: Float,
    /// Total hadronic transverse energy (GeV)
    pub ht: Float,
    /// Scalar sum MET + HT (GeV), attached by the augmentation stage
    pub st: Float,
    /// Event weight, carried through untouched for downstream analysis
    pub weight: Float,
    /// HEM dead-region overlap flag, attached for simulated 2018 events
    pub hem_veto: bool,
    /// Minimum azimuthal separation between MET and the good fat jets,
    /// attached by the delta-phi-min stage for surviving events
    pub delta_phi_min: Option<Float>,
    /// Trigger decisions, aligned with the batch's trigger name table
    pub trigger_pass: Vec<bool>,
    /// Noise-filter decisions, aligned with the batch's MET filter name table
    pub met_filter_pass: Vec<bool>,
    /// AK4 jet collection
    pub jets: Vec<Jet>,
    /// AK8 fat jet collection
    pub fat_jets: Vec<FatJet>,
    /// Electron collection
    pub electrons: Vec<Electron>,
    /// Muon collection
    pub muons: Vec<Muon>,
}
//
impl Event {
    /// Good fat jets, in collection order
    pub fn good_fat_jets(&self) -> impl Iterator<Item = &FatJet> {
        self.fat_jets.iter().filter(|jet| jet.is_good)
    }

    /// Good AK4 jets, in collection order
    pub fn good_jets(&self) -> impl Iterator<Item = &Jet> {
        self.jets.iter().filter(|jet| jet.is_good)
    }
}

/// An ordered batch of events with its trigger and filter name tables
///
/// The name tables describe which trigger / MET-filter bit each position of
/// the per-event decision vectors corresponds to. They are shared by every
/// event of the batch.
#[derive(Clone, Debug, Default)]
pub struct EventBatch {
    /// Whether this batch holds recorded (as opposed to simulated) events
    pub is_data: bool,
    /// Names of the trigger bits stored per event, in bit order
    pub trigger_names: Vec<String>,
    /// Names of the MET filter bits stored per event, in bit order
    pub met_filter_names: Vec<String>,
    /// The events themselves
    pub events: Vec<Event>,
}
//
impl EventBatch {
    /// Build a batch from its name tables and events
    pub fn new(
        is_data: bool,
        trigger_names: Vec<String>,
        met_filter_names: Vec<String>,
        events: Vec<Event>,
    ) -> Self {
        Self { is_data, trigger_names, met_filter_names, events }
    }

    /// Number of events currently in the batch
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the batch holds no events
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Position of a named trigger bit in the per-event decision vectors
    pub fn trigger_index(&self, name: &str) -> Option<usize> {
        self.trigger_names.iter().position(|n| n == name)
    }

    /// Position of a named MET filter bit in the per-event decision vectors
    pub fn met_filter_index(&self, name: &str) -> Option<usize> {
        self.met_filter_names.iter().position(|n| n == name)
    }

    /// Keep only the events whose mask entry is true
    ///
    /// The mask must be fully materialized and cover every event. Masks are
    /// always consumed here rather than indexed lazily, so degenerate
    /// all-true / all-false masks behave like any other.
    ///
    pub fn select(&mut self, mask: &[bool]) {
        assert_eq!(
            mask.len(),
            self.events.len(),
            "selection mask length must match the batch length"
        );
        let mut keep = mask.iter().copied();
        self.events.retain(|_| keep.next().unwrap_or(false));
    }
}
