//! Pre-selection skimming for a t-channel semi-visible-jet search
//!
//!
//! # Introduction (for the physicist)
//!
//! This crate narrows a batch of recorded or simulated collision events down
//! to the ones worth keeping for a t-channel dark-shower search: hadronic
//! triggers, an ST threshold where those triggers are fully efficient, at
//! least two good wide jets, no isolated leptons, missing transverse energy
//! aligned with a jet and above threshold, and the usual detector-noise
//! guards (MET filters, the 2018 HEM dead region, phi-spike hot spots).
//!
//! Every filtering stage records the surviving event count in a cut-flow
//! ledger so the selection can be audited afterwards.
//!
//!
//! # Introduction (for the computer guy)
//!
//! The pipeline is a pure, synchronous reduction over one event batch:
//!
//! * resolve all year-keyed configuration (trigger lists, noise-filter
//!   lists, hot-spot regions) up front, failing fast on a bad key,
//! * attach derived flags and scalars once so later stages only read them,
//! * apply the fixed chain of filters, each consuming the previous stage's
//!   surviving batch and appending to the ledger,
//! * prune the branches downstream analysis never reads.
//!
//! A [`pipeline::Pipeline`] is immutable once built, so independent batches
//! (different datasets, different systematic variations) can be processed
//! concurrently from the same pipeline value.

#![warn(missing_docs)]

pub mod config;
pub mod cutflow;
pub mod event;
pub mod geometry;
pub mod numeric;
pub mod objects;
pub mod phispike;
pub mod pipeline;

mod error;

pub use error::{Error, Result};
