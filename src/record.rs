//! Outcome recording: decide which result fields change, then write them.
//!
//! | expected failure | outcome | result_latest | commit_latest | commit_last_passed |
//! |------------------|---------|---------------|---------------|--------------------|
//! | no               | passed  | passed        | revision      | revision           |
//! | no               | failed  | failed        | revision      | unchanged          |
//! | no               | skipped | skipped       | revision      | unchanged          |
//! | yes              | passed  | xpass         | revision      | unchanged          |
//! | yes              | failed  | unchanged     | revision      | unchanged          |
//! | yes              | skipped | xfail         | revision      | unchanged          |
//!
//! `test_commit_last_passed` only ever advances on a genuine pass.

use crate::{
    model::{Outcome, ResultField, TestResult},
    storage::{self, Item},
};

/// The field values one outcome writes to an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultUpdate {
    pub commit_latest: String,

    /// `None` leaves `test_result_latest` as it was.
    pub result_latest: Option<TestResult>,

    /// `None` leaves `test_commit_last_passed` as it was.
    pub commit_last_passed: Option<String>,
}

impl ResultUpdate {
    pub fn for_outcome(outcome: Outcome, expected_failure: bool, revision: &str) -> Self {
        let result_latest = match (expected_failure, outcome) {
            (false, Outcome::Passed) => Some(TestResult::Passed),
            (false, Outcome::Failed) => Some(TestResult::Failed),
            (false, Outcome::Skipped) => Some(TestResult::Skipped),
            (true, Outcome::Passed) => Some(TestResult::Xpass),
            // Still broken, as expected. No status word for that.
            (true, Outcome::Failed) => None,
            (true, Outcome::Skipped) => Some(TestResult::Xfail),
        };
        let genuine_pass = !expected_failure && outcome == Outcome::Passed;

        Self {
            commit_latest: revision.to_string(),
            result_latest,
            commit_last_passed: genuine_pass.then(|| revision.to_string()),
        }
    }

    /// The fields to set, in write order.
    pub fn fields(&self) -> Vec<(ResultField, &str)> {
        let mut fields = vec![(ResultField::CommitLatest, self.commit_latest.as_str())];
        if let Some(commit) = &self.commit_last_passed {
            fields.push((ResultField::CommitLastPassed, commit.as_str()));
        }
        if let Some(result) = self.result_latest {
            fields.push((ResultField::ResultLatest, result.as_str()));
        }
        fields
    }
}

/// Record an outcome on `item`, persisting it in one write.
///
/// Returns the new `test_result_latest`, or `None` when the outcome leaves
/// it unchanged.
pub fn record(
    item: &mut Item,
    outcome: Outcome,
    expected_failure: bool,
    revision: &str,
) -> storage::Result<Option<TestResult>> {
    let update = ResultUpdate::for_outcome(outcome, expected_failure, revision);
    let changed = item.set_results(&update.fields())?;

    tracing::info!(
        uid = item.uid(),
        result = update.result_latest.map_or("unchanged", TestResult::as_str),
        revision,
        changed,
        "recorded outcome"
    );

    Ok(update.result_latest)
}
