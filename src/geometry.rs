//! Four-vector construction and angular separations
//!
//! The selection only ever needs azimuthal separations, so the vector type
//! stays a plain value built from the (pt, eta, phi, mass) branches and is
//! never persisted into the batch.

use crate::numeric::{floats::consts::PI, Float};

/// Four-vector value built from transverse momentum, pseudorapidity,
/// azimuthal angle and mass
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PtEtaPhiM {
    /// Transverse momentum (GeV)
    pub pt: Float,
    /// Pseudorapidity
    pub eta: Float,
    /// Azimuthal angle (radians)
    pub phi: Float,
    /// Invariant mass (GeV)
    pub mass: Float,
}
//
impl PtEtaPhiM {
    /// Build a four-vector from its kinematic components
    pub fn new(pt: Float, eta: Float, phi: Float, mass: Float) -> Self {
        Self { pt, eta, phi, mass }
    }

    /// Build the massless transverse vector pointing along the missing
    /// transverse energy direction
    pub fn from_met(met: Float, met_phi: Float) -> Self {
        Self::new(met, 0., met_phi, 0.)
    }

    /// Azimuthal separation with another vector, wrapped into (-pi, pi]
    pub fn delta_phi(&self, other: &Self) -> Float {
        wrap_delta_phi(self.phi - other.phi)
    }
}

/// Fold an azimuthal angle difference into (-pi, pi]
pub fn wrap_delta_phi(dphi: Float) -> Float {
    PI - (PI - dphi).rem_euclid(2. * PI)
}

/// Minimum absolute azimuthal separation between one reference vector and a
/// variable-length jet collection
///
/// Returns `None` for an empty collection: the reduction has no identity
/// element, and callers must decide what an event without jets means for the
/// cut at hand.
///
pub fn delta_phi_min(
    reference: &PtEtaPhiM,
    jets: impl IntoIterator<Item = PtEtaPhiM>,
) -> Option<Float> {
    jets.into_iter()
        .map(|jet| jet.delta_phi(reference).abs())
        .fold(None, |min, dphi| match min {
            Some(m) if m <= dphi => Some(m),
            _ => Some(dphi),
        })
}
