//! Cut-flow accounting for the selection pipeline
//!
//! The ledger maps each filtering stage to the number of events surviving it,
//! in the order the stages ran. It is write-only while the pipeline runs and
//! audited afterwards, so it enforces its own append-only contract instead of
//! relying on caller discipline.

use std::fmt;

/// Append-only ledger of surviving event counts per selection stage
#[derive(Clone, Debug, Default)]
pub struct CutFlow {
    entries: Vec<(String, usize)>,
}
//
impl CutFlow {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the surviving event count after a named stage
    ///
    /// Panics on a duplicate stage name: downstream reporting assumes exactly
    /// one count per stage per run, so recording twice is a programming error
    /// in the pipeline definition, not a recoverable condition.
    ///
    pub fn record(&mut self, stage: &str, surviving: usize) {
        assert!(
            self.get(stage).is_none(),
            "stage {stage:?} recorded twice in one pipeline run"
        );
        log::debug!("cut flow: {surviving} events after {stage}");
        self.entries.push((stage.to_owned(), surviving));
    }

    /// Surviving count for a stage, if that stage was recorded
    pub fn get(&self, stage: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|(name, _)| name == stage)
            .map(|&(_, count)| count)
    }

    /// Stages and counts in recording order
    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.entries.iter().map(|(name, count)| (name.as_str(), *count))
    }

    /// Number of recorded stages
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no stage was recorded yet
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that counts never increase from one stage to the next
    ///
    /// A violation means a stage grew the batch, which breaks the scientific
    /// validity of the ledger.
    ///
    pub fn is_monotonic(&self) -> bool {
        self.entries
            .windows(2)
            .all(|pair| pair[1].1 <= pair[0].1)
    }
}

impl fmt::Display for CutFlow {
    /// Dump the ledger as an aligned two-column table
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .entries
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0);
        for (name, count) in &self.entries {
            writeln!(fmt, "{name:width$}  {count}")?;
        }
        Ok(())
    }
}
