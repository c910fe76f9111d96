//! Output formatting for CLI display.

use crate::{
    model::ResultField,
    revision::short,
    session::{Handled, RunSummary},
    storage::Item,
};

/// One verbose line per event worth reporting.
pub(super) fn format_handled(handled: &Handled) -> Option<String> {
    match handled {
        Handled::Recorded { uid, path, result } => {
            let result = result.map_or("result unchanged", |r| r.as_str());
            Some(format!(
                "Writing outcome ({result}) for item {uid} ({})",
                path.display()
            ))
        }
        Handled::Unmapped { test } => {
            Some(format!("Could not locate a traceability item for {test}"))
        }
        Handled::NotCall | Handled::Inactive => None,
    }
}

pub(super) fn format_summary(prefix: &str, revision: &str, summary: &RunSummary) -> String {
    let mut line = format!(
        "Recorded {} outcome(s) in {prefix} at {}",
        summary.recorded,
        short(revision)
    );
    if summary.unmapped > 0 {
        line.push_str(&format!("; {} test(s) without an item", summary.unmapped));
    }
    line
}

/// `UID  result  latest  last-passed`, with `-` for absent fields.
pub(super) fn format_item_row(item: &Item) -> String {
    let field = |f| item.result_field(f).unwrap_or("-");
    let commit = |f| item.result_field(f).map_or("-", short);
    format!(
        "{:<12} {:<8} {:<8} {}",
        item.uid(),
        field(ResultField::ResultLatest),
        commit(ResultField::CommitLatest),
        commit(ResultField::CommitLastPassed),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{fs, path::PathBuf};

    use tempfile::TempDir;

    use crate::model::TestResult;

    #[test]
    fn recorded_line_names_result_and_item() {
        let handled = Handled::Recorded {
            uid: "TST0001".into(),
            path: PathBuf::from("TstPlan/TST0001.yml"),
            result: Some(TestResult::Passed),
        };

        assert_eq!(
            format_handled(&handled).unwrap(),
            "Writing outcome (passed) for item TST0001 (TstPlan/TST0001.yml)"
        );
    }

    #[test]
    fn unmapped_line_names_the_test() {
        let handled = Handled::Unmapped {
            test: "test_missing_item.py::test_missing".into(),
        };

        assert_eq!(
            format_handled(&handled).unwrap(),
            "Could not locate a traceability item for test_missing_item.py::test_missing"
        );
        assert_eq!(format_handled(&Handled::NotCall), None);
    }

    #[test]
    fn summary_mentions_unmapped_only_when_present() {
        let mut summary = RunSummary {
            recorded: 4,
            unmapped: 0,
            ignored: 2,
        };
        let revision = "d670460b4b4aece5915caf5c68d12f560a9fe3e4";

        assert_eq!(
            format_summary("TST", revision, &summary),
            "Recorded 4 outcome(s) in TST at d670460b"
        );

        summary.unmapped = 1;
        assert!(format_summary("TST", revision, &summary).ends_with("; 1 test(s) without an item"));
    }

    #[test]
    fn item_row_shows_dashes_for_missing_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("TST0002.yml");
        fs::write(
            &path,
            "test_commit_latest: d670460b4b4aece5915caf5c68d12f560a9fe3e4\ntest_result_latest: failed\n",
        )
        .unwrap();
        let item = Item::load(&path).unwrap();

        assert_eq!(
            format_item_row(&item),
            "TST0002      failed   d670460b -"
        );
    }
}
