//! CLI interface for tracemark.
//!
//! Non-interactive: events in, item files updated, a short report on stderr.
//!
//! - `tracemark record`: read outcome events and record them.
//! - `tracemark list`: show the result fields of every item in the document.
//!
//! The document is chosen with `--prefix` or `--path` (see [`crate::config`]
//! for the full resolution chain).

mod format;

use std::{
    env,
    fs::File,
    io::{self, BufRead, BufReader},
    path::{Path, PathBuf},
};

use clap::{Parser, Subcommand, ValueEnum};

use crate::{
    config::{self, Config},
    events::{EventFormat, EventReader},
    logging,
    model::OutcomeEvent,
    session::{Handled, RunSummary, Session},
    storage::{self, Locator},
};

use format::{format_handled, format_item_row, format_summary};

/// tracemark: record test outcomes in Doorstop items.
#[derive(Debug, Parser)]
#[command(name = "tracemark", version, after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Prefix of the document to record into (e.g. `TST`).
    /// Takes precedence over `--path`.
    #[arg(long, global = true)]
    prefix: Option<String>,

    /// Document directory, or a directory with one under an immediate child.
    /// Defaults to the current directory.
    #[arg(long, global = true)]
    path: Option<PathBuf>,

    /// Where prefix discovery starts. Defaults to the current directory.
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Report every recording and every test without an item.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: recording a Rust test run
  cargo test -- -Z unstable-options --format json \
    | tracemark --prefix TST record --format libtest

  cargo nextest run --message-format libtest-json \
    | tracemark --prefix TST record --format libtest --xfail known_broken

Native events (one JSON object per line):
  {"test": "tests/test_api.py::test_login", "outcome": "passed"}
  {"test": "tests/test_api.py::test_flaky", "outcome": "skipped", "expected_failure": true}"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record outcome events into the document.
    ///
    /// Events are read from INPUT, or stdin when omitted.
    /// Tests without an item are skipped; a failed write aborts the run.
    Record {
        /// Event file. Reads stdin when omitted.
        input: Option<PathBuf>,

        /// Line format of the events.
        #[arg(long, value_enum)]
        format: Option<FormatArg>,

        /// Test expected to fail, by full identifier or innermost name.
        /// Can be specified multiple times.
        #[arg(long)]
        xfail: Vec<String>,

        /// Revision to stamp instead of git's `HEAD`.
        #[arg(long)]
        revision: Option<String>,
    },

    /// List every item with its recorded results.
    List,
}

/// CLI-facing event format, mapped to the domain `EventFormat`.
#[derive(Debug, Clone, ValueEnum)]
pub enum FormatArg {
    /// tracemark's own event objects.
    Native,
    /// The Rust test harness JSON stream.
    Libtest,
}

impl FormatArg {
    fn to_domain(&self) -> EventFormat {
        match self {
            Self::Native => EventFormat::Native,
            Self::Libtest => EventFormat::Libtest,
        }
    }
}

/// Run the CLI, returning an error message on failure.
pub fn run() -> Result<(), String> {
    let cli = Cli::parse();

    let cwd = env::current_dir()
        .map_err(|e| format!("could not determine current directory: {e}"))?;
    let config = Config::load(&cwd).map_err(|e| e.to_string())?;
    let verbose = cli.verbose || config.verbose;
    logging::init(verbose);

    let locator =
        config::resolve_locator(cli.prefix.as_deref(), cli.path.as_deref(), &config, &cwd);
    let root = cli
        .root
        .clone()
        .or_else(|| config.root.clone())
        .unwrap_or_else(|| cwd.clone());

    match cli.command {
        Command::Record {
            input,
            format,
            xfail,
            revision,
        } => {
            let format = format.map_or(config.format, |f| f.to_domain());
            let expected_failures = config.expected_failures.iter().cloned().chain(xfail);
            let session = Session::start(
                &locator,
                &root,
                config::resolve_revision(revision.as_deref()),
                &cwd,
            )
            .map_err(|e| e.to_string())?;

            let reader = open_input(input.as_deref())?;
            let events =
                EventReader::new(reader, format).with_expected_failures(expected_failures);
            cmd_record(session, events, verbose)
        }
        Command::List => cmd_list(&locator, &root),
    }
}

fn open_input(input: Option<&Path>) -> Result<Box<dyn BufRead>, String> {
    match input {
        Some(path) => {
            let file =
                File::open(path).map_err(|e| format!("failed to open {}: {e}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => Ok(Box::new(io::stdin().lock())),
    }
}

fn cmd_record<R: BufRead>(
    mut session: Session,
    events: EventReader<R>,
    verbose: bool,
) -> Result<(), String> {
    let summary = record_stream(&mut session, events, |_, handled| {
        if verbose && let Some(line) = format_handled(handled) {
            eprintln!("{line}");
        }
    })?;

    let prefix = session.document().map_or("", |doc| doc.prefix());
    eprintln!("{}", format_summary(prefix, session.revision(), &summary));
    Ok(())
}

/// Record events as they arrive. A bad line stops the stream there; the
/// events before it stay recorded and the read error is returned.
fn record_stream<R, F>(
    session: &mut Session,
    events: EventReader<R>,
    on_event: F,
) -> Result<RunSummary, String>
where
    R: BufRead,
    F: FnMut(&OutcomeEvent, &Handled),
{
    let mut read_error = None;
    let events = events.map_while(|event| event.map_err(|e| read_error = Some(e)).ok());

    let summary = session
        .run(events, on_event)
        .map_err(|e| format!("failed to record outcome: {e}"))?;

    match read_error {
        Some(e) => Err(e.to_string()),
        None => Ok(summary),
    }
}

fn cmd_list(locator: &Locator, root: &Path) -> Result<(), String> {
    let document = storage::open(locator, root)
        .map_err(|e| format!("{e} (while resolving {locator})"))?;

    if document.is_empty() {
        println!("No items in {}", document.prefix());
        return Ok(());
    }

    for item in document.items() {
        println!("{}", format_item_row(item));
    }
    Ok(())
}
