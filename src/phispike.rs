//! Phi-spike hot-spot lookup table
//!
//! Certain (eta, phi) regions of the calorimeter produce instrumental noise
//! that mimics high-momentum jets. The per-year exclusion regions are
//! precomputed and shipped as a JSON table; events whose leading good AK4
//! jets fall inside any region are removed. The table is loaded once and is
//! immutable afterwards, safe to share across concurrently processed batches.

use crate::{numeric::Float, Error, Result};

use serde::{Deserialize, Serialize};

use std::{collections::HashMap, fs::File, io::BufReader, path::Path};

/// One rectangular (eta, phi) exclusion region
#[derive(Clone, Copy, Debug, Deserialize, Serialize)]
pub struct HotSpotRegion {
    /// Lower pseudorapidity bound
    pub eta_min: Float,
    /// Upper pseudorapidity bound
    pub eta_max: Float,
    /// Lower azimuthal bound (radians)
    pub phi_min: Float,
    /// Upper azimuthal bound (radians)
    pub phi_max: Float,
}
//
impl HotSpotRegion {
    /// Whether a jet axis falls inside this region
    pub fn contains(&self, eta: Float, phi: Float) -> bool {
        eta >= self.eta_min && eta < self.eta_max && phi >= self.phi_min && phi < self.phi_max
    }
}

/// Exclusion regions and leading-jet count for one data-taking year
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct YearHotSpots {
    /// Regions to exclude
    pub regions: Vec<HotSpotRegion>,
    /// Number of leading good AK4 jets checked against the regions
    #[serde(default = "default_n_jets")]
    pub n_jets: usize,
}

fn default_n_jets() -> usize {
    4
}

/// Per-year hot-spot lookup table
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(transparent)]
pub struct PhiSpikeTable {
    years: HashMap<String, YearHotSpots>,
}
//
impl PhiSpikeTable {
    /// Build a table from explicit per-year entries
    pub fn new(years: HashMap<String, YearHotSpots>) -> Self {
        Self { years }
    }

    /// Load a table from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let table = serde_json::from_reader(BufReader::new(file))?;
        Ok(table)
    }

    /// Exclusion regions for a year
    pub fn for_year(&self, year: &str) -> Result<&YearHotSpots> {
        self.years
            .get(year)
            .ok_or_else(|| Error::MissingHotSpots(year.to_owned()))
    }
}
