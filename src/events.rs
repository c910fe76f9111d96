//! Outcome event input: one JSON object per line.
//!
//! Two line formats are understood:
//!
//! - `native`: an [`OutcomeEvent`] as JSON,
//!   `{"test": "tests/test_api.py::test_login", "phase": "call", "outcome": "passed", "expected_failure": false}`.
//!   `phase` defaults to `call` and `expected_failure` to `false`.
//! - `libtest`: the JSON event stream of the Rust test harness (see [`libtest`]).
//!
//! Tests named in the expected-failure list are flagged as such in either
//! format, matched by full identifier or by innermost test name.

mod libtest;

use std::{
    collections::HashSet,
    io::{self, BufRead},
};

use serde::{Deserialize, Serialize};

use crate::{model::OutcomeEvent, resolve::test_name};

use libtest::LibtestLine;

/// Errors reading an event stream.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    #[error("failed to read events: {0}")]
    Io(#[from] io::Error),

    #[error("invalid event on line {line}: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
}

/// Line format of an event stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventFormat {
    #[default]
    Native,
    Libtest,
}

/// Reads [`OutcomeEvent`]s from a line-oriented stream.
///
/// Blank lines are skipped. In libtest mode, lines that are not JSON objects
/// (captured test output printed with `--nocapture`) and non-terminal events
/// are skipped too.
pub struct EventReader<R> {
    lines: io::Lines<R>,
    line: usize,
    format: EventFormat,
    expected_failures: HashSet<String>,
}

impl<R: BufRead> EventReader<R> {
    pub fn new(reader: R, format: EventFormat) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
            format,
            expected_failures: HashSet::new(),
        }
    }

    /// Flag the named tests as expected failures.
    #[must_use]
    pub fn with_expected_failures<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expected_failures
            .extend(names.into_iter().map(Into::into));
        self
    }

    fn is_expected_failure(&self, test_identifier: &str) -> bool {
        self.expected_failures.contains(test_identifier)
            || self.expected_failures.contains(test_name(test_identifier))
    }

    fn parse_line(&self, text: &str) -> Result<Option<OutcomeEvent>, EventError> {
        let parse_err = |source| EventError::Parse {
            line: self.line,
            source,
        };

        match self.format {
            EventFormat::Native => {
                let mut event: OutcomeEvent = serde_json::from_str(text).map_err(parse_err)?;
                event.expected_failure |= self.is_expected_failure(&event.test_identifier);
                Ok(Some(event))
            }
            EventFormat::Libtest => {
                if !text.starts_with('{') {
                    tracing::trace!(line = self.line, "skipping non-JSON libtest output");
                    return Ok(None);
                }
                let line: LibtestLine = serde_json::from_str(text).map_err(parse_err)?;
                let expected = line
                    .test_name()
                    .is_some_and(|name| self.is_expected_failure(name));
                Ok(line.into_event(expected))
            }
        }
    }
}

impl<R: BufRead> Iterator for EventReader<R> {
    type Item = Result<OutcomeEvent, EventError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let text = match self.lines.next()? {
                Ok(text) => text,
                Err(e) => return Some(Err(e.into())),
            };
            self.line += 1;

            let text = text.trim();
            if text.is_empty() {
                continue;
            }
            match self.parse_line(text) {
                Ok(Some(event)) => return Some(Ok(event)),
                Ok(None) => {}
                Err(e) => return Some(Err(e)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::model::{Outcome, Phase};

    fn read_all(input: &str, format: EventFormat, xfail: &[&str]) -> Vec<OutcomeEvent> {
        EventReader::new(input.as_bytes(), format)
            .with_expected_failures(xfail.iter().copied())
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn native_stream_with_blank_lines() {
        let input = "\
{\"test\": \"t.py::test_pass\", \"outcome\": \"passed\"}

{\"test\": \"t.py::test_pass\", \"phase\": \"teardown\", \"outcome\": \"passed\"}
{\"test\": \"t.py::test_xpass\", \"outcome\": \"passed\", \"expected_failure\": true}
";
        let events = read_all(input, EventFormat::Native, &[]);

        assert_eq!(events.len(), 3);
        assert_eq!(events[0], OutcomeEvent::call("t.py::test_pass", Outcome::Passed, false));
        assert_eq!(events[1].phase, Phase::Teardown);
        assert!(events[2].expected_failure);
    }

    #[test]
    fn native_expected_failure_list_applies() {
        let input = r#"{"test": "t.py::test_flaky", "outcome": "skipped"}"#;

        let events = read_all(input, EventFormat::Native, &["test_flaky"]);

        assert!(events[0].expected_failure);
    }

    #[test]
    fn libtest_stream_keeps_only_terminal_test_events() {
        let input = r#"{ "type": "suite", "event": "started", "test_count": 3 }
{ "type": "test", "event": "started", "name": "api::tests::login" }
{ "type": "test", "name": "api::tests::login", "event": "ok", "exec_time": 0.001 }
{ "type": "test", "event": "started", "name": "api::tests::logout" }
thread 'api::tests::logout' panicked at src/api.rs:10:5
{ "type": "test", "name": "api::tests::logout", "event": "failed", "exec_time": 0.002 }
{ "type": "test", "name": "api::tests::slow", "event": "ignored" }
{ "type": "suite", "event": "failed", "passed": 1, "failed": 1, "ignored": 1, "measured": 0, "filtered_out": 0, "exec_time": 0.01 }
"#;
        let events = read_all(input, EventFormat::Libtest, &["api::tests::logout"]);

        assert_eq!(
            events,
            [
                OutcomeEvent::call("api::tests::login", Outcome::Passed, false),
                OutcomeEvent::call("api::tests::logout", Outcome::Skipped, true),
                OutcomeEvent {
                    test_identifier: "api::tests::slow".into(),
                    phase: Phase::Setup,
                    outcome: Outcome::Skipped,
                    expected_failure: false,
                },
            ]
        );
    }

    #[test]
    fn malformed_line_reports_its_number() {
        let input = "{\"test\": \"a\", \"outcome\": \"passed\"}\n{\"test\": \"b\", \"outcome\": \"exploded\"}\n";

        let results: Vec<_> = EventReader::new(input.as_bytes(), EventFormat::Native).collect();

        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(EventError::Parse { line: 2, .. })));
    }
}
