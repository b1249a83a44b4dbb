//! End-to-end tests of the pre-selection pipeline

use tchannel_presel::{
    config::YearConfig,
    cutflow::CutFlow,
    event::{Electron, Event, EventBatch, FatJet, Jet, Muon},
    numeric::Float,
    phispike::{HotSpotRegion, PhiSpikeTable, YearHotSpots},
    pipeline::{delta_phi_min_good_fat_jets, JetTagger, Pipeline, PipelineOptions, Variation},
    Error,
};

use std::collections::HashMap;

const TOLERANCE: Float = 1e-6;

/// Trigger of the MET stream, present in the batch for overlap-removal tests
const MET_STREAM_TRIGGER: &str = "HLT_PFMET120_PFMHT120_IDTight_v";

/// Hot-spot table covering every year, with the given regions for 2018
fn hot_spot_table(regions_2018: Vec<HotSpotRegion>) -> PhiSpikeTable {
    let mut years = HashMap::new();
    for year in ["2016", "2016APV", "2017", "2018"] {
        let regions = if year == "2018" { regions_2018.clone() } else { Vec::new() };
        years.insert(year.to_owned(), YearHotSpots { regions, n_jets: 4 });
    }
    PhiSpikeTable::new(years)
}

/// Empty batch carrying the full 2018 trigger and MET-filter name tables
fn batch_2018(is_data: bool) -> EventBatch {
    let config = YearConfig::for_year("2018").unwrap();
    let mut trigger_names = config.triggers.clone();
    trigger_names.push(MET_STREAM_TRIGGER.to_owned());
    EventBatch::new(is_data, trigger_names, config.met_filters.clone(), Vec::new())
}

/// Event passing the whole 2018 selection
fn passing_event(batch: &EventBatch) -> Event {
    let mut trigger_pass = vec![false; batch.trigger_names.len()];
    // Fires the HT trigger only
    trigger_pass[0] = true;
    Event {
        met: 300.,
        met_phi: 0.,
        ht: 1200.,
        weight: 1.,
        trigger_pass,
        met_filter_pass: vec![true; batch.met_filter_names.len()],
        jets: vec![Jet::new(100., 1.0, 0.5, 10.)],
        fat_jets: vec![
            FatJet::new(400., 0.5, 0.3, 80.),
            FatJet::new(300., -0.5, 2.8, 70.),
        ],
        ..Event::default()
    }
}

fn pipeline_2018(is_data: bool) -> Pipeline {
    let options = PipelineOptions {
        primary_dataset: is_data.then(|| "JetHT".to_owned()),
        ..PipelineOptions::default()
    };
    Pipeline::new("2018", &hot_spot_table(Vec::new()), options).unwrap()
}

#[test]
fn trigger_and_st_scenario() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut batch = batch_2018(true);

    // Event A fails the trigger selection
    let mut a = passing_event(&batch);
    a.trigger_pass.iter_mut().for_each(|bit| *bit = false);
    // Event B passes the trigger but sits below the ST threshold
    let mut b = passing_event(&batch);
    b.ht = 700.;
    // Event C passes everything
    let c = passing_event(&batch);
    batch.events = vec![a, b, c];

    let mut cut_flow = CutFlow::new();
    let survivors = pipeline_2018(true).process(batch, &mut cut_flow).unwrap();

    assert_eq!(cut_flow.get("PrimaryDatasetOverlap"), Some(3));
    assert_eq!(cut_flow.get("Trigger"), Some(2));
    assert_eq!(cut_flow.get("STGt1300GeV"), Some(1));
    assert!(cut_flow.is_monotonic());
    assert_eq!(survivors.len(), 1);
    assert!((survivors.events[0].st - 1500.).abs() < TOLERANCE);
}

#[test]
fn ledger_has_the_fixed_stage_order_for_data() {
    let mut batch = batch_2018(true);
    batch.events = vec![passing_event(&batch)];
    let mut cut_flow = CutFlow::new();
    pipeline_2018(true).process(batch, &mut cut_flow).unwrap();

    let stages: Vec<_> = cut_flow.iter().map(|(name, _)| name.to_owned()).collect();
    assert_eq!(
        stages,
        [
            "PrimaryDatasetOverlap",
            "Trigger",
            "STGt1300GeV",
            "HEMVeto",
            "GoodJetsAK8",
            "NJetsAK8Gt2",
            "LeptonVeto",
            "DeltaPhiMinLt1p5",
            "METGt200GeV",
            "METFilters",
            "PhiSpikeFilter",
        ]
    );
}

#[test]
fn empty_batch_flows_through_every_stage() {
    let batch = batch_2018(false);
    let mut cut_flow = CutFlow::new();
    let survivors = pipeline_2018(false).process(batch, &mut cut_flow).unwrap();

    assert!(survivors.is_empty());
    // Simulation skips the overlap and HEM ledger entries
    assert_eq!(cut_flow.len(), 9);
    assert!(cut_flow.iter().all(|(_, count)| count == 0));
    assert!(cut_flow.is_monotonic());
}

#[test]
fn hem_overlap_cuts_data_but_only_flags_simulation() {
    // A good AK4 jet sitting inside the HEM dead region
    let hem_jet = Jet::new(100., -2.0, -1.0, 10.);

    let mut batch = batch_2018(true);
    let mut event = passing_event(&batch);
    event.jets.push(hem_jet.clone());
    batch.events = vec![event];
    let mut cut_flow = CutFlow::new();
    let survivors = pipeline_2018(true).process(batch, &mut cut_flow).unwrap();
    assert_eq!(cut_flow.get("HEMVeto"), Some(0));
    assert!(survivors.is_empty());

    let mut batch = batch_2018(false);
    let mut event = passing_event(&batch);
    event.jets.push(hem_jet);
    batch.events = vec![event];
    let mut cut_flow = CutFlow::new();
    let survivors = pipeline_2018(false).process(batch, &mut cut_flow).unwrap();
    assert_eq!(cut_flow.get("HEMVeto"), None);
    assert_eq!(survivors.len(), 1);
    assert!(survivors.events[0].hem_veto);
}

#[test]
fn lepton_veto_removes_events_with_isolated_leptons() {
    let mut batch = batch_2018(false);
    let mut with_muon = passing_event(&batch);
    with_muon.muons.push(Muon::new(20., 0.5, 1.0, 0.1));
    let mut with_loose_electron = passing_event(&batch);
    // Isolation too poor to count as a veto lepton
    with_loose_electron.electrons.push(Electron::new(20., 0.5, 1.0, 0.5));
    batch.events = vec![with_muon, with_loose_electron];

    let mut cut_flow = CutFlow::new();
    let survivors = pipeline_2018(false).process(batch, &mut cut_flow).unwrap();
    assert_eq!(cut_flow.get("LeptonVeto"), Some(1));
    assert_eq!(survivors.len(), 1);
}

#[test]
fn delta_phi_min_branch_and_cut() {
    let mut batch = batch_2018(false);
    // Closest good fat jet at phi = 0.3, MET at phi = 0
    let aligned = passing_event(&batch);
    // Both fat jets far from MET in azimuth
    let mut back_to_back = passing_event(&batch);
    back_to_back.fat_jets = vec![
        FatJet::new(400., 0.5, 2.0, 80.),
        FatJet::new(300., -0.5, 2.5, 70.),
    ];
    batch.events = vec![aligned, back_to_back];

    let mut cut_flow = CutFlow::new();
    let survivors = pipeline_2018(false).process(batch, &mut cut_flow).unwrap();
    assert_eq!(cut_flow.get("DeltaPhiMinLt1p5"), Some(1));
    assert_eq!(survivors.len(), 1);
    let dphi = survivors.events[0].delta_phi_min.unwrap();
    assert!((dphi - 0.3).abs() < TOLERANCE);
}

#[test]
fn both_delta_phi_min_paths_agree() {
    let batch = batch_2018(false);
    let mut event = passing_event(&batch);
    // Flag the jets the way the augmentation stage would
    for jet in &mut event.fat_jets {
        jet.is_good = true;
    }

    // Inline recomputation over the good fat jets
    let inline: Float = event
        .fat_jets
        .iter()
        .filter(|jet| jet.is_good)
        .map(|jet| {
            use tchannel_presel::geometry::PtEtaPhiM;
            let met = PtEtaPhiM::from_met(event.met, event.met_phi);
            PtEtaPhiM::new(jet.pt, jet.eta, jet.phi, jet.mass).delta_phi(&met).abs()
        })
        .fold(Float::INFINITY, Float::min);

    // Precomputed-branch path
    let branch = delta_phi_min_good_fat_jets(&event).unwrap();
    assert!((inline - branch).abs() < TOLERANCE);
}

#[test]
fn phi_spike_hot_spot_removes_leading_jets() {
    let region = HotSpotRegion { eta_min: 0.0, eta_max: 0.1, phi_min: 2.9, phi_max: 3.0 };
    let table = hot_spot_table(vec![region]);
    let pipeline = Pipeline::new("2018", &table, PipelineOptions::default()).unwrap();

    let mut batch = batch_2018(false);
    let mut spiked = passing_event(&batch);
    spiked.jets.push(Jet::new(80., 0.05, 2.95, 8.));
    let mut clean = passing_event(&batch);
    // Same jet with its phi shifted 1.0 rad outside the region
    clean.jets.push(Jet::new(80., 0.05, 1.95, 8.));
    batch.events = vec![spiked, clean];

    let mut cut_flow = CutFlow::new();
    let survivors = pipeline.process(batch, &mut cut_flow).unwrap();
    assert_eq!(cut_flow.get("PhiSpikeFilter"), Some(1));
    assert_eq!(survivors.len(), 1);
}

#[test]
fn dataset_overlap_removal_is_idempotent() {
    // The MET stream yields to JetHT: events firing a JetHT trigger go
    let options = PipelineOptions {
        primary_dataset: Some("MET".to_owned()),
        ..PipelineOptions::default()
    };
    let pipeline = Pipeline::new("2018", &hot_spot_table(Vec::new()), options).unwrap();

    let mut batch = batch_2018(true);
    // Claimed by JetHT through the HT trigger
    let claimed = passing_event(&batch);
    // Fires only the MET stream trigger
    let mut unclaimed = passing_event(&batch);
    unclaimed.trigger_pass.iter_mut().for_each(|bit| *bit = false);
    let met_bit = batch.trigger_index(MET_STREAM_TRIGGER).unwrap();
    unclaimed.trigger_pass[met_bit] = true;
    batch.events = vec![claimed, unclaimed.clone()];

    let mut cut_flow = CutFlow::new();
    pipeline.process(batch, &mut cut_flow).unwrap();
    assert_eq!(cut_flow.get("PrimaryDatasetOverlap"), Some(1));

    // A second pass over the surviving set removes nothing further
    let mut batch = batch_2018(true);
    batch.events = vec![unclaimed];
    let mut cut_flow = CutFlow::new();
    pipeline.process(batch, &mut cut_flow).unwrap();
    assert_eq!(cut_flow.get("PrimaryDatasetOverlap"), Some(1));
}

#[test]
fn systematic_variation_shifts_the_selection() {
    let mut batch = batch_2018(false);
    let mut event = passing_event(&batch);
    // A downward energy-scale shift drops both fat jets below quality
    for jet in &mut event.fat_jets {
        jet.pt_jes_down = 150.;
    }
    batch.events = vec![event.clone()];

    let mut cut_flow = CutFlow::new();
    let survivors = pipeline_2018(false).process(batch, &mut cut_flow).unwrap();
    assert_eq!(survivors.len(), 1);

    let options = PipelineOptions {
        variation: Some(Variation::JesDown),
        ..PipelineOptions::default()
    };
    let pipeline = Pipeline::new("2018", &hot_spot_table(Vec::new()), options).unwrap();
    let mut batch = batch_2018(false);
    batch.events = vec![event];
    let mut cut_flow = CutFlow::new();
    let survivors = pipeline.process(batch, &mut cut_flow).unwrap();
    assert_eq!(cut_flow.get("GoodJetsAK8"), Some(0));
    assert!(survivors.is_empty());
}

struct ConstantTagger(Float);

impl JetTagger for ConstantTagger {
    fn score(&self, _jet: &FatJet) -> Float {
        self.0
    }
}

#[test]
fn tagger_scores_surviving_good_fat_jets() {
    let options = PipelineOptions {
        tagger: Some(Box::new(ConstantTagger(0.7))),
        ..PipelineOptions::default()
    };
    let pipeline = Pipeline::new("2018", &hot_spot_table(Vec::new()), options).unwrap();

    let mut batch = batch_2018(false);
    let mut event = passing_event(&batch);
    // A third, forward fat jet that fails quality must stay unscored
    event.fat_jets.push(FatJet::new(300., 4.0, 1.0, 60.));
    batch.events = vec![event];

    let mut cut_flow = CutFlow::new();
    let survivors = pipeline.process(batch, &mut cut_flow).unwrap();
    assert_eq!(survivors.len(), 1);
    let jets = &survivors.events[0].fat_jets;
    assert_eq!(jets[0].tagger_score, Some(0.7));
    assert_eq!(jets[1].tagger_score, Some(0.7));
    assert_eq!(jets[2].tagger_score, None);
}

#[test]
fn collections_are_pruned_from_the_output() {
    let mut batch = batch_2018(false);
    batch.events = vec![passing_event(&batch)];
    let mut cut_flow = CutFlow::new();
    let survivors = pipeline_2018(false).process(batch, &mut cut_flow).unwrap();

    assert!(survivors.trigger_names.is_empty());
    assert!(survivors.met_filter_names.is_empty());
    let event = &survivors.events[0];
    assert!(event.trigger_pass.is_empty());
    assert!(event.met_filter_pass.is_empty());
    assert!(event.jets.is_empty());
    assert!(event.electrons.is_empty());
    assert!(event.muons.is_empty());
    // The fat jets and derived branches survive pruning
    assert_eq!(event.fat_jets.len(), 2);
    assert!(event.delta_phi_min.is_some());
}

#[test]
fn met_filters_are_anded() {
    let mut batch = batch_2018(false);
    let mut noisy = passing_event(&batch);
    // One failing noise filter is enough to drop the event
    noisy.met_filter_pass[0] = false;
    batch.events = vec![noisy, passing_event(&batch)];

    let mut cut_flow = CutFlow::new();
    let survivors = pipeline_2018(false).process(batch, &mut cut_flow).unwrap();
    assert_eq!(cut_flow.get("METFilters"), Some(1));
    assert_eq!(survivors.len(), 1);
}

#[test]
fn batch_missing_a_configured_trigger_is_rejected() {
    let mut batch = batch_2018(false);
    batch.events = vec![passing_event(&batch)];
    batch.trigger_names.remove(0);
    for event in &mut batch.events {
        event.trigger_pass.remove(0);
    }

    let mut cut_flow = CutFlow::new();
    let result = pipeline_2018(false).process(batch, &mut cut_flow);
    assert!(matches!(result, Err(Error::UnknownTrigger(_))));
    assert!(cut_flow.is_empty());
}

#[test]
fn configuration_errors_fail_before_processing() {
    let table = hot_spot_table(Vec::new());
    assert!(matches!(
        Pipeline::new("2015", &table, PipelineOptions::default()),
        Err(Error::UnknownYear(_))
    ));

    let options = PipelineOptions {
        primary_dataset: Some("SingleElectron".to_owned()),
        ..PipelineOptions::default()
    };
    assert!(matches!(
        Pipeline::new("2018", &table, options),
        Err(Error::UnknownDataset { .. })
    ));

    assert!(matches!(
        Pipeline::new("2018", &PhiSpikeTable::default(), PipelineOptions::default()),
        Err(Error::MissingHotSpots(_))
    ));

    // Data without a primary dataset name is rejected before any event
    let mut batch = batch_2018(true);
    batch.events = vec![passing_event(&batch)];
    let mut cut_flow = CutFlow::new();
    let result = pipeline_2018(false).process(batch, &mut cut_flow);
    assert!(matches!(result, Err(Error::MissingPrimaryDataset(_))));
    assert!(cut_flow.is_empty());
}
