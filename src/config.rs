//! Year- and run-mode-specific selection configuration
//!
//! Each data-taking year comes with its own trigger list, MET noise-filter
//! list, HEM applicability and primary-dataset priority order. The mapping
//! from year key to configuration record is explicit: an unknown year is a
//! typed configuration error raised before any event is processed.

use crate::{Error, Result};

use serde::{Deserialize, Serialize};

/// One primary dataset (trigger stream) and the triggers that define it
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct PrimaryDataset {
    /// Stream name, e.g. "JetHT"
    pub name: String,
    /// Triggers claiming events for this stream
    pub triggers: Vec<String>,
}

/// Selection configuration for one data-taking year
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct YearConfig {
    /// Year key this configuration was resolved for
    pub year: String,
    /// Triggers whose logical OR defines the selection
    pub triggers: Vec<String>,
    /// Noise filters whose logical AND events must pass
    pub met_filters: Vec<String>,
    /// Whether the HEM dead-region handling applies to this year
    pub hem_veto: bool,
    /// Primary datasets in decreasing claim priority, for overlap removal
    pub primary_datasets: Vec<PrimaryDataset>,
}
//
impl YearConfig {
    /// Resolve the configuration for a data-taking year
    pub fn for_year(year: &str) -> Result<Self> {
        let (triggers, met_filters, hem_veto) = match year {
            "2016" | "2016APV" => (
                vec![
                    "HLT_PFHT800_v",
                    "HLT_PFHT900_v",
                    "HLT_PFJet450_v",
                    "HLT_AK8PFJet450_v",
                ],
                base_met_filters(),
                false,
            ),
            "2017" => (
                vec!["HLT_PFHT1050_v", "HLT_PFJet500_v", "HLT_AK8PFJet500_v"],
                with_ecal_bad_calib(base_met_filters()),
                false,
            ),
            "2018" => (
                vec!["HLT_PFHT1050_v", "HLT_PFJet500_v", "HLT_AK8PFJet500_v"],
                with_ecal_bad_calib(base_met_filters()),
                true,
            ),
            _ => return Err(Error::UnknownYear(year.to_owned())),
        };

        let config = Self {
            year: year.to_owned(),
            triggers: triggers.into_iter().map(str::to_owned).collect(),
            met_filters,
            hem_veto,
            primary_datasets: primary_datasets(year),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the pipeline relies on
    ///
    /// A year with no triggers or no MET filters cannot select anything, so
    /// such a configuration is rejected up front rather than silently
    /// passing or dropping every event.
    ///
    pub fn validate(&self) -> Result<()> {
        if self.triggers.is_empty() {
            return Err(Error::EmptyTriggerList(self.year.clone()));
        }
        if self.met_filters.is_empty() {
            return Err(Error::EmptyMetFilterList(self.year.clone()));
        }
        Ok(())
    }

    /// Triggers of every stream with higher claim priority than a dataset
    ///
    /// Events of `dataset` firing any of these triggers are already claimed
    /// by another stream and must be dropped to avoid double counting.
    ///
    pub fn higher_priority_triggers(&self, dataset: &str) -> Result<Vec<&str>> {
        let position = self
            .primary_datasets
            .iter()
            .position(|stream| stream.name == dataset)
            .ok_or_else(|| Error::UnknownDataset {
                dataset: dataset.to_owned(),
                year: self.year.clone(),
            })?;
        Ok(self.primary_datasets[..position]
            .iter()
            .flat_map(|stream| stream.triggers.iter().map(String::as_str))
            .collect())
    }
}

/// MET noise filters common to all years
fn base_met_filters() -> Vec<String> {
    [
        "globalSuperTightHalo2016Filter",
        "HBHENoiseFilter",
        "HBHEIsoNoiseFilter",
        "EcalDeadCellTriggerPrimitiveFilter",
        "BadPFMuonFilter",
        "PrimaryVertexFilter",
        "eeBadScFilter",
    ]
    .into_iter()
    .map(str::to_owned)
    .collect()
}

/// Extra calorimeter filter deployed for the later years
fn with_ecal_bad_calib(mut filters: Vec<String>) -> Vec<String> {
    filters.push("ecalBadCalibFilter".to_owned());
    filters
}

/// Primary-dataset claim order for one year
///
/// The hadronic streams overlap through their HT and single-jet triggers;
/// JetHT claims first.
///
fn primary_datasets(year: &str) -> Vec<PrimaryDataset> {
    let (jet_ht, met): (&[&str], &[&str]) = match year {
        "2016" | "2016APV" => (
            &["HLT_PFHT800_v", "HLT_PFHT900_v", "HLT_PFJet450_v", "HLT_AK8PFJet450_v"],
            &["HLT_PFMET110_PFMHT110_IDTight_v"],
        ),
        _ => (
            &["HLT_PFHT1050_v", "HLT_PFJet500_v", "HLT_AK8PFJet500_v"],
            &["HLT_PFMET120_PFMHT120_IDTight_v"],
        ),
    };
    vec![
        PrimaryDataset {
            name: "JetHT".to_owned(),
            triggers: jet_ht.iter().map(|&t| t.to_owned()).collect(),
        },
        PrimaryDataset {
            name: "MET".to_owned(),
            triggers: met.iter().map(|&t| t.to_owned()).collect(),
        },
    ]
}
