//! Error types for the pre-selection pipeline
//!
//! Configuration problems (an unknown data-taking year, a primary dataset
//! that is not part of the year's stream priority list, a trigger name that
//! the input batch does not carry) are fatal and must surface before any
//! event is touched. Nothing in this crate retries.

use thiserror::Error;

/// Pre-selection error type
#[derive(Error, Debug)]
pub enum Error {
    /// Data-taking year with no configuration entry
    #[error("no pre-selection configuration for year {0:?}")]
    UnknownYear(String),

    /// Primary dataset name absent from the year's stream priority list
    #[error("unknown primary dataset {dataset:?} for year {year:?}")]
    UnknownDataset {
        /// Requested primary dataset name
        dataset: String,
        /// Year whose priority list was consulted
        year: String,
    },

    /// Data batch processed without naming its primary dataset
    #[error("a primary dataset name is required to process data for year {0:?}")]
    MissingPrimaryDataset(String),

    /// Trigger name required by the configuration but absent from the batch
    #[error("trigger {0:?} not present in the input batch")]
    UnknownTrigger(String),

    /// MET filter name required by the configuration but absent from the batch
    #[error("MET filter {0:?} not present in the input batch")]
    UnknownMetFilter(String),

    /// A year configuration with no triggers cannot select anything
    #[error("empty trigger list configured for year {0:?}")]
    EmptyTriggerList(String),

    /// A year configuration with no MET filters cannot be applied
    #[error("empty MET filter list configured for year {0:?}")]
    EmptyMetFilterList(String),

    /// Year missing from a phi-spike hot-spot table
    #[error("phi-spike hot-spot table has no entry for year {0:?}")]
    MissingHotSpots(String),

    /// I/O error while loading a hot-spot table
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error while loading a hot-spot table
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
