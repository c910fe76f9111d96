//! libtest JSON events.
//!
//! Produced by `cargo test -- -Z unstable-options --format json` and by
//! `cargo nextest run --message-format libtest-json`:
//!
//! ```text
//! { "type": "suite", "event": "started", "test_count": 2 }
//! { "type": "test", "event": "started", "name": "api::tests::login" }
//! { "type": "test", "name": "api::tests::login", "event": "ok", "exec_time": 0.01 }
//! { "type": "test", "name": "api::tests::slow", "event": "ignored" }
//! { "type": "suite", "event": "ok", "passed": 1, "failed": 0, "ignored": 1, ... }
//! ```
//!
//! libtest has no notion of an expected failure, so those are supplied by
//! the caller and folded in the way pytest reports them: an expected
//! failure that fails comes through as `skipped`.

use serde::Deserialize;

use crate::model::{Outcome, OutcomeEvent, Phase};

const KIND_TEST: &str = "test";

const EVENT_OK: &str = "ok";
const EVENT_FAILED: &str = "failed";
const EVENT_IGNORED: &str = "ignored";

/// The fields of a libtest line we care about. Everything else is ignored.
#[derive(Debug, Deserialize)]
pub(super) struct LibtestLine {
    #[serde(rename = "type")]
    kind: String,
    event: Option<String>,
    name: Option<String>,
}

impl LibtestLine {
    pub(super) fn test_name(&self) -> Option<&str> {
        if self.kind == KIND_TEST {
            self.name.as_deref()
        } else {
            None
        }
    }

    /// Convert a terminal test event. Suite, `started`, and unknown events
    /// yield `None`.
    pub(super) fn into_event(self, expected_failure: bool) -> Option<OutcomeEvent> {
        if self.kind != KIND_TEST {
            return None;
        }
        let name = self.name?;
        let (phase, outcome) = match self.event.as_deref()? {
            EVENT_OK => (Phase::Call, Outcome::Passed),
            EVENT_FAILED if expected_failure => (Phase::Call, Outcome::Skipped),
            EVENT_FAILED => (Phase::Call, Outcome::Failed),
            // The body never ran.
            EVENT_IGNORED => (Phase::Setup, Outcome::Skipped),
            _ => return None,
        };

        Some(OutcomeEvent {
            test_identifier: name,
            phase,
            outcome,
            expected_failure,
        })
    }
}
