//! Core data model for tracemark.
//!
//! These types describe what flows through a recording session:
//! test outcome events coming in, item references to match them against,
//! and the result values written back to traceability items.

mod outcome;
mod references;

pub use outcome::{Outcome, OutcomeEvent, Phase, TestResult};
pub use references::{Descriptor, References};

/// A persisted result field on a traceability item.
///
/// The names are fixed: existing Doorstop trees already carry them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultField {
    /// Revision the item was last exercised at, whatever the outcome.
    CommitLatest,

    /// Revision the item last genuinely passed at.
    CommitLastPassed,

    /// Most recent [`TestResult`].
    ResultLatest,
}

impl ResultField {
    pub const ALL: [Self; 3] = [Self::CommitLatest, Self::CommitLastPassed, Self::ResultLatest];

    /// The YAML key this field is stored under.
    pub fn key(self) -> &'static str {
        match self {
            Self::CommitLatest => "test_commit_latest",
            Self::CommitLastPassed => "test_commit_last_passed",
            Self::ResultLatest => "test_result_latest",
        }
    }
}
