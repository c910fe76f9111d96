//! Outcome types: what a test run reports and what an item stores.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle phase that produced an outcome event.
///
/// Only [`Phase::Call`] runs the test body, so only it is recorded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Setup,
    #[default]
    Call,
    Teardown,
}

/// Raw outcome of one test phase, as the test runner reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
    Skipped,
}

/// Result value stored in `test_result_latest`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TestResult {
    Passed,
    Failed,
    Skipped,

    /// An expected failure that did fail.
    Xfail,

    /// An expected failure that unexpectedly passed.
    Xpass,
}

impl TestResult {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
            Self::Xfail => "xfail",
            Self::Xpass => "xpass",
        }
    }

    /// Parse a stored result value. Unknown values yield `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "passed" => Some(Self::Passed),
            "failed" => Some(Self::Failed),
            "skipped" => Some(Self::Skipped),
            "xfail" => Some(Self::Xfail),
            "xpass" => Some(Self::Xpass),
            _ => None,
        }
    }
}

impl fmt::Display for TestResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One completed test phase, as emitted by the test runner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeEvent {
    /// Hierarchical test path, e.g. `tests/test_api.py::test_login`
    /// or `api::tests::login`.
    #[serde(rename = "test")]
    pub test_identifier: String,

    #[serde(default)]
    pub phase: Phase,

    pub outcome: Outcome,

    /// The test was declared as expected to fail.
    #[serde(default)]
    pub expected_failure: bool,
}

impl OutcomeEvent {
    /// A call-phase event, the common case.
    pub fn call(
        test_identifier: impl Into<String>,
        outcome: Outcome,
        expected_failure: bool,
    ) -> Self {
        Self {
            test_identifier: test_identifier.into(),
            phase: Phase::Call,
            outcome,
            expected_failure,
        }
    }
}
