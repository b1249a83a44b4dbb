//! The sequential pre-selection pipeline
//!
//! The pipeline applies a fixed, ordered chain of filtering and tagging
//! stages to an event batch, shrinking it monotonically and recording the
//! surviving count after every filtering stage in a [`CutFlow`] ledger. All
//! year- and dataset-keyed configuration is resolved when the pipeline is
//! built, so a bad year or dataset key fails before any event is touched.
//!
//! Stages run strictly in order because each consumes the filtered output of
//! the previous one. A single pipeline value is read-only during processing
//! and can be shared across threads to process independent batches
//! concurrently.

use crate::{
    config::YearConfig,
    cutflow::CutFlow,
    event::{Event, EventBatch, FatJet},
    geometry::{delta_phi_min, PtEtaPhiM},
    numeric::Float,
    objects::ObjectCuts,
    phispike::{PhiSpikeTable, YearHotSpots},
    Error, Result,
};

/// ST threshold below which the triggers are not fully efficient (GeV)
const ST_MIN: Float = 1300.;

/// Missing transverse energy threshold (GeV)
const MET_MIN: Float = 200.;

/// Upper cut on the minimum MET-to-jet azimuthal separation (radians)
const DELTA_PHI_MIN_MAX: Float = 1.5;

/// Minimum number of good fat jets
const MIN_GOOD_FAT_JETS: usize = 2;

/// HEM dead-region pseudorapidity window
const HEM_ETA: (Float, Float) = (-3.05, -1.35);

/// HEM dead-region azimuthal window (radians)
const HEM_PHI: (Float, Float) = (-1.62, -0.82);

/// Systematic variation of the jet kinematic branches
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Variation {
    /// Jet energy scale shifted up
    JesUp,
    /// Jet energy scale shifted down
    JesDown,
    /// Jet energy resolution shifted up
    JerUp,
    /// Jet energy resolution shifted down
    JerDown,
}

/// Jet-substructure classifier scoring one fat jet
///
/// Model inference is an external concern; the pipeline only attaches the
/// returned score to the jet record.
pub trait JetTagger {
    /// Score one fat jet
    fn score(&self, jet: &FatJet) -> Float;
}

/// Optional knobs of a pipeline run
#[derive(Default)]
pub struct PipelineOptions {
    /// Primary dataset name, required when processing data
    pub primary_dataset: Option<String>,
    /// Systematic variation to apply before any selection, if any
    pub variation: Option<Variation>,
    /// Substructure tagger scoring good fat jets after selection, if any
    pub tagger: Option<Box<dyn JetTagger + Send + Sync>>,
    /// Object-quality thresholds
    pub object_cuts: ObjectCuts,
}

/// The pre-selection pipeline for one year and one set of options
pub struct Pipeline {
    config: YearConfig,
    hot_spots: YearHotSpots,
    options: PipelineOptions,
}
//
impl Pipeline {
    /// Build a pipeline, resolving all year-keyed configuration up front
    pub fn new(
        year: &str,
        phi_spike_table: &PhiSpikeTable,
        options: PipelineOptions,
    ) -> Result<Self> {
        let config = YearConfig::for_year(year)?;
        let hot_spots = phi_spike_table.for_year(year)?.clone();
        // Fail on a bad dataset key now rather than mid-run
        if let Some(dataset) = options.primary_dataset.as_deref() {
            config.higher_priority_triggers(dataset)?;
        }
        Ok(Self { config, hot_spots, options })
    }

    /// Year this pipeline was configured for
    pub fn year(&self) -> &str {
        &self.config.year
    }

    /// Run the full selection on one batch
    ///
    /// Returns the surviving events with pruned collections; the ledger
    /// receives one entry per filtering stage, in stage order. An empty
    /// input batch flows through every stage and yields an all-zero ledger.
    ///
    pub fn process(&self, mut batch: EventBatch, cut_flow: &mut CutFlow) -> Result<EventBatch> {
        log::info!(
            "pre-selecting {} {} events for year {}",
            batch.len(),
            if batch.is_data { "data" } else { "simulated" },
            self.config.year,
        );

        // Resolve every trigger and filter name against the batch's name
        // tables before any event is touched
        let triggers = resolve_triggers(&batch, &self.config.triggers)?;
        let met_filters = resolve_met_filters(&batch, &self.config.met_filters)?;

        // Overlapping trigger streams: drop data events already claimed by a
        // higher-priority primary dataset
        if batch.is_data {
            let dataset = self
                .options
                .primary_dataset
                .as_deref()
                .ok_or_else(|| Error::MissingPrimaryDataset(self.config.year.clone()))?;
            let claimed = self.config.higher_priority_triggers(dataset)?;
            let claimed = resolve_triggers(&batch, &claimed)?;
            let keep = mask(&batch, |event| {
                !claimed.iter().any(|&bit| event.trigger_pass[bit])
            });
            batch.select(&keep);
            cut_flow.record("PrimaryDatasetOverlap", batch.len());
        }

        // Swap in shifted kinematic branches before anything selects on them
        if let Some(variation) = self.options.variation {
            apply_variation(&mut batch, variation);
        }

        // Attach the object-quality flags and derived scalars every later
        // stage reads instead of recomputing
        self.augment(&mut batch);

        // Trigger selection
        let keep = mask(&batch, |event| {
            triggers.iter().any(|&bit| event.trigger_pass[bit])
        });
        batch.select(&keep);
        cut_flow.record("Trigger", batch.len());

        // ST cut for the triggers to be fully efficient
        let keep = mask(&batch, |event| event.st > ST_MIN);
        batch.select(&keep);
        cut_flow.record("STGt1300GeV", batch.len());

        // HEM dead region: a hard cut for data, a stored flag for simulation
        // (downstream reweights instead of cutting)
        if self.config.hem_veto {
            if batch.is_data {
                let keep = mask(&batch, |event| !hem_overlap(event));
                batch.select(&keep);
                cut_flow.record("HEMVeto", batch.len());
            } else {
                for event in &mut batch.events {
                    event.hem_veto = hem_overlap(event);
                }
            }
        }

        // Baseline good fat jet requirement
        let keep = mask(&batch, |event| event.good_fat_jets().next().is_some());
        batch.select(&keep);
        cut_flow.record("GoodJetsAK8", batch.len());

        // Fat jet multiplicity
        let keep = mask(&batch, |event| {
            event.good_fat_jets().count() >= MIN_GOOD_FAT_JETS
        });
        batch.select(&keep);
        cut_flow.record("NJetsAK8Gt2", batch.len());

        // Veto events with mini-isolated leptons
        let keep = mask(&batch, |event| {
            !event.electrons.iter().any(|e| e.is_veto) && !event.muons.iter().any(|m| m.is_veto)
        });
        batch.select(&keep);
        cut_flow.record("LeptonVeto", batch.len());

        // Minimum azimuthal separation between MET and the good fat jets.
        // Skipped wholesale on an empty batch; the ledger entry is still due.
        if !batch.is_empty() {
            for event in &mut batch.events {
                event.delta_phi_min = delta_phi_min_good_fat_jets(event);
            }
            let keep = mask(&batch, |event| {
                event.delta_phi_min.map_or(false, |dphi| dphi < DELTA_PHI_MIN_MAX)
            });
            batch.select(&keep);
        }
        cut_flow.record("DeltaPhiMinLt1p5", batch.len());

        // MET cut
        let keep = mask(&batch, |event| event.met > MET_MIN);
        batch.select(&keep);
        cut_flow.record("METGt200GeV", batch.len());

        // MET noise filters
        let keep = mask(&batch, |event| {
            met_filters.iter().all(|&bit| event.met_filter_pass[bit])
        });
        batch.select(&keep);
        cut_flow.record("METFilters", batch.len());

        // Phi-spike hot spots among the leading good AK4 jets
        let keep = mask(&batch, |event| !self.hits_hot_spot(event));
        batch.select(&keep);
        cut_flow.record("PhiSpikeFilter", batch.len());

        // Derived quantities for downstream analysis only
        add_analysis_branches(&mut batch);

        // Optional substructure tagging of the surviving good fat jets
        if let Some(tagger) = self.options.tagger.as_deref() {
            for event in &mut batch.events {
                for jet in event.fat_jets.iter_mut().filter(|jet| jet.is_good) {
                    jet.tagger_score = Some(tagger.score(jet));
                }
            }
        }

        prune_collections(&mut batch);
        Ok(batch)
    }

    /// Compute and cache every object-quality flag and derived scalar
    fn augment(&self, batch: &mut EventBatch) {
        let cuts = &self.options.object_cuts;
        for event in &mut batch.events {
            for jet in &mut event.jets {
                jet.is_good = cuts.is_good_ak4(jet);
            }
            for jet in &mut event.fat_jets {
                jet.is_good = cuts.is_good_ak8(jet);
            }
            for electron in &mut event.electrons {
                electron.is_veto = cuts.is_veto_electron(electron);
            }
            for muon in &mut event.muons {
                muon.is_veto = cuts.is_veto_muon(muon);
            }
            event.st = event.met + event.ht;
        }
    }

    /// Whether any leading good AK4 jet sits in a hot-spot region
    fn hits_hot_spot(&self, event: &Event) -> bool {
        event
            .good_jets()
            .take(self.hot_spots.n_jets)
            .any(|jet| {
                self.hot_spots
                    .regions
                    .iter()
                    .any(|region| region.contains(jet.eta, jet.phi))
            })
    }
}

/// Materialize a boolean selection mask over a batch
///
/// Masks are always realized as a concrete `Vec<bool>` before indexing, so
/// all-true and all-false outcomes go through the same code path as any
/// other mask.
fn mask(batch: &EventBatch, predicate: impl Fn(&Event) -> bool) -> Vec<bool> {
    batch.events.iter().map(predicate).collect()
}

/// Replace the nominal jet momenta with a shifted variant
fn apply_variation(batch: &mut EventBatch, variation: Variation) {
    log::debug!("applying systematic variation {variation:?}");
    for event in &mut batch.events {
        for jet in &mut event.jets {
            jet.pt = match variation {
                Variation::JesUp => jet.pt_jes_up,
                Variation::JesDown => jet.pt_jes_down,
                Variation::JerUp => jet.pt_jer_up,
                Variation::JerDown => jet.pt_jer_down,
            };
        }
        for jet in &mut event.fat_jets {
            jet.pt = match variation {
                Variation::JesUp => jet.pt_jes_up,
                Variation::JesDown => jet.pt_jes_down,
                Variation::JerUp => jet.pt_jer_up,
                Variation::JerDown => jet.pt_jer_down,
            };
        }
    }
}

/// Whether a good jet or veto lepton overlaps the HEM dead region
///
/// Evaluated on the quality flags cached at augmentation time, not on a
/// later-filtered subset.
fn hem_overlap(event: &Event) -> bool {
    let in_region = |eta: Float, phi: Float| {
        eta > HEM_ETA.0 && eta < HEM_ETA.1 && phi > HEM_PHI.0 && phi < HEM_PHI.1
    };
    event.good_jets().any(|jet| in_region(jet.eta, jet.phi))
        || event
            .electrons
            .iter()
            .filter(|e| e.is_veto)
            .any(|e| in_region(e.eta, e.phi))
        || event
            .muons
            .iter()
            .filter(|m| m.is_veto)
            .any(|m| in_region(m.eta, m.phi))
}

/// Minimum azimuthal separation between MET and an event's good fat jets
///
/// `None` when the event has no good fat jet.
pub fn delta_phi_min_good_fat_jets(event: &Event) -> Option<Float> {
    let met = PtEtaPhiM::from_met(event.met, event.met_phi);
    delta_phi_min(
        &met,
        event
            .good_fat_jets()
            .map(|jet| PtEtaPhiM::new(jet.pt, jet.eta, jet.phi, jet.mass)),
    )
}

/// Attach quantities needed by downstream analysis but not by the selection
fn add_analysis_branches(batch: &mut EventBatch) {
    for event in &mut batch.events {
        // The delta-phi-min branch is normally filled by its cut stage; fill
        // it here for any event that reached this point without one so both
        // computation paths expose the same branch
        if event.delta_phi_min.is_none() {
            event.delta_phi_min = delta_phi_min_good_fat_jets(event);
        }
    }
}

/// Drop the branches downstream analysis never reads to bound output size
fn prune_collections(batch: &mut EventBatch) {
    batch.trigger_names = Vec::new();
    batch.met_filter_names = Vec::new();
    for event in &mut batch.events {
        event.trigger_pass = Vec::new();
        event.met_filter_pass = Vec::new();
        event.jets = Vec::new();
        event.electrons = Vec::new();
        event.muons = Vec::new();
    }
}

/// Resolve trigger names to bit positions in the batch's name table
fn resolve_triggers(batch: &EventBatch, names: &[impl AsRef<str>]) -> Result<Vec<usize>> {
    names
        .iter()
        .map(|name| {
            batch
                .trigger_index(name.as_ref())
                .ok_or_else(|| Error::UnknownTrigger(name.as_ref().to_owned()))
        })
        .collect()
}

/// Resolve MET filter names to bit positions in the batch's name table
fn resolve_met_filters(batch: &EventBatch, names: &[impl AsRef<str>]) -> Result<Vec<usize>> {
    names
        .iter()
        .map(|name| {
            batch
                .met_filter_index(name.as_ref())
                .ok_or_else(|| Error::UnknownMetFilter(name.as_ref().to_owned()))
        })
        .collect()
}
