//! Recording sessions.
//!
//! A session fixes one revision and one document up front, then routes each
//! outcome event through resolution and recording. Nothing else carries over
//! between events.

use std::path::{Path, PathBuf};

use crate::{
    model::{OutcomeEvent, Phase, TestResult},
    record, resolve,
    revision::{self, RevisionError},
    storage::{self, Document, DocumentError, Locator, StorageError},
};

/// Errors starting a session. All of them are fatal before any test runs.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Revision(#[from] RevisionError),

    #[error("{source} (while resolving {locator})")]
    Document {
        locator: Locator,
        source: DocumentError,
    },
}

/// What happened to one event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handled {
    /// The outcome was written to an item.
    Recorded {
        uid: String,
        path: PathBuf,
        /// New `test_result_latest`; `None` when it was left unchanged.
        result: Option<TestResult>,
    },

    /// No item references this test.
    Unmapped { test: String },

    /// Not a call-phase event.
    NotCall,

    /// The session has no document to record into.
    Inactive,
}

/// Counts for a whole event stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub recorded: usize,
    pub unmapped: usize,
    pub ignored: usize,
}

impl RunSummary {
    fn add(&mut self, handled: &Handled) {
        match handled {
            Handled::Recorded { .. } => self.recorded += 1,
            Handled::Unmapped { .. } => self.unmapped += 1,
            Handled::NotCall | Handled::Inactive => self.ignored += 1,
        }
    }
}

/// The revision and document shared by every event in a run.
#[derive(Debug)]
pub struct Session {
    revision: String,
    document: Option<Document>,
}

impl Session {
    pub fn new(revision: impl Into<String>, document: Option<Document>) -> Self {
        Self {
            revision: revision.into(),
            document,
        }
    }

    /// Resolve the revision (unless given) and open the document once.
    ///
    /// `repo_dir` is where the git lookup starts; `root` is where prefix
    /// discovery starts.
    pub fn start(
        locator: &Locator,
        root: &Path,
        revision: Option<String>,
        repo_dir: &Path,
    ) -> Result<Self, SessionError> {
        let revision = match revision {
            Some(revision) => revision,
            None => revision::current_revision(repo_dir)?,
        };
        let document = storage::open(locator, root).map_err(|source| SessionError::Document {
            locator: locator.clone(),
            source,
        })?;

        tracing::info!(
            %revision,
            prefix = document.prefix(),
            items = document.len(),
            "session started"
        );
        Ok(Self::new(revision, Some(document)))
    }

    pub fn revision(&self) -> &str {
        &self.revision
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Resolve and record one event.
    ///
    /// A test with no item is reported, not an error. Persistence failures
    /// are returned for the caller to decide on.
    pub fn handle(&mut self, event: &OutcomeEvent) -> Result<Handled, StorageError> {
        let Some(document) = self.document.as_mut() else {
            return Ok(Handled::Inactive);
        };
        if event.phase != Phase::Call {
            return Ok(Handled::NotCall);
        }

        let Some(index) = resolve::resolve(&event.test_identifier, document) else {
            tracing::debug!(test = %event.test_identifier, "no item references this test");
            return Ok(Handled::Unmapped {
                test: event.test_identifier.clone(),
            });
        };
        let Some(item) = document.item_mut(index) else {
            return Ok(Handled::Unmapped {
                test: event.test_identifier.clone(),
            });
        };

        let result = record::record(item, event.outcome, event.expected_failure, &self.revision)?;
        Ok(Handled::Recorded {
            uid: item.uid().to_string(),
            path: item.path().to_path_buf(),
            result,
        })
    }

    /// Handle every event in order, calling `on_event` after each one.
    ///
    /// Stops at the first persistence failure.
    pub fn run<I, F>(&mut self, events: I, mut on_event: F) -> Result<RunSummary, StorageError>
    where
        I: IntoIterator<Item = OutcomeEvent>,
        F: FnMut(&OutcomeEvent, &Handled),
    {
        let mut summary = RunSummary::default();
        for event in events {
            let handled = self.handle(&event)?;
            on_event(&event, &handled);
            summary.add(&handled);
        }
        Ok(summary)
    }
}
