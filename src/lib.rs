//! tracemark: record test outcomes in Doorstop traceability items.
//!
//! For every test that runs, tracemark finds the item whose references name
//! the test and stamps it with the revision under test and the result:
//!
//! - `test_commit_latest`: revision the item was last exercised at
//! - `test_result_latest`: `passed`, `failed`, `skipped`, `xfail`, or `xpass`
//! - `test_commit_last_passed`: revision the item last genuinely passed at
//!
//! The pieces:
//!
//! - [`resolve`] maps a test identifier to an item.
//! - [`record`] decides which fields change and writes them.
//! - [`session`] ties both to one revision and one document.
//! - [`storage`], [`revision`], and [`events`] talk to the outside world.

pub mod cli;
pub mod config;
pub mod events;
pub mod logging;
pub mod model;
pub mod record;
pub mod resolve;
pub mod revision;
pub mod session;
pub mod storage;

pub use model::{Outcome, OutcomeEvent, Phase, ResultField, TestResult};
pub use session::{Handled, RunSummary, Session};
pub use storage::{Document, Item, Locator};
