//! Item resolution: map a test identifier to the item that references it.
//!
//! Matching is by substring of the innermost test name against an item's
//! flattened references, first match in document order. Two tests sharing
//! an innermost name in different scopes resolve to the same item; so does
//! a test whose name is a substring of another item's reference text when
//! that item comes first. Both are accepted ambiguities of the scheme.

use crate::storage::{Document, Item};

/// Separates scopes in a hierarchical test path.
const SCOPE_SEPARATOR: &str = "::";

/// The innermost test name: everything after the last `::`.
///
/// `tests/test_api.py::TestLogin::test_ok` → `test_ok`.
pub fn test_name(test_identifier: &str) -> &str {
    test_identifier
        .rsplit_once(SCOPE_SEPARATOR)
        .map_or(test_identifier, |(_, name)| name)
}

/// Index of the first item whose references mention the test.
///
/// `None` when no item matches, including when the innermost name is empty.
pub fn resolve(test_identifier: &str, document: &Document) -> Option<usize> {
    let name = test_name(test_identifier);
    if name.is_empty() {
        return None;
    }

    document.items().iter().position(|item| mentions(item, name))
}

/// Like [`resolve`], returning the item itself.
pub fn resolve_item<'a>(test_identifier: &str, document: &'a Document) -> Option<&'a Item> {
    resolve(test_identifier, document).map(|index| &document.items()[index])
}

fn mentions(item: &Item, name: &str) -> bool {
    item.references()
        .is_some_and(|refs| refs.flatten_for_search().contains(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;

    use tempfile::TempDir;

    use crate::storage::DOCUMENT_CONFIG;

    fn document(items: &[(&str, &str)]) -> (TempDir, Document) {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join(DOCUMENT_CONFIG),
            "settings:\n  prefix: TST\n",
        )
        .unwrap();
        for (name, yaml) in items {
            fs::write(dir.path().join(name), yaml).unwrap();
        }
        let doc = Document::load(dir.path()).unwrap();
        (dir, doc)
    }

    #[test]
    fn test_name_strips_scopes() {
        assert_eq!(test_name("tests/test_api.py::TestLogin::test_ok"), "test_ok");
        assert_eq!(test_name("api::tests::login"), "login");
        assert_eq!(test_name("test_plain"), "test_plain");
        assert_eq!(test_name("tests/test_api.py::"), "");
    }

    #[test]
    fn resolves_scalar_reference() {
        let (_dir, doc) = document(&[
            ("TST001.yml", "ref: test_pass\n"),
            ("TST002.yml", "ref: test_fail\n"),
        ]);

        let item = resolve_item("test_example.py::test_fail", &doc).unwrap();

        assert_eq!(item.uid(), "TST002");
    }

    #[test]
    fn resolves_descriptor_reference() {
        let (_dir, doc) = document(&[
            ("TST001.yml", "references:\n- path: tests/a.py\n  keyword: test_one\n"),
            (
                "TST002.yml",
                "references:\n- path: tests/b.py\n  type: file\n- path: tests/c.py\n  keyword: test_two\n",
            ),
        ]);

        assert_eq!(resolve("c::test_two", &doc), Some(1));
    }

    #[test]
    fn first_match_in_document_order_wins() {
        // "test_login" is a substring of both references.
        let (_dir, doc) = document(&[
            ("TST001.yml", "ref: test_login_expired\n"),
            ("TST002.yml", "ref: test_login\n"),
        ]);

        for _ in 0..3 {
            assert_eq!(resolve("auth::test_login", &doc), Some(0));
        }
    }

    #[test]
    fn same_innermost_name_is_indistinguishable() {
        let (_dir, doc) = document(&[("TST001.yml", "ref: a.py::test_ok\n")]);

        assert_eq!(resolve("a.py::test_ok", &doc), Some(0));
        assert_eq!(resolve("b.py::test_ok", &doc), Some(0));
    }

    #[test]
    fn unmapped_test_is_none() {
        let (_dir, doc) = document(&[
            ("TST001.yml", "ref: test_pass\n"),
            ("TST002.yml", "text: no references here\n"),
        ]);

        assert_eq!(resolve("test_missing.py::test_missing", &doc), None);
    }

    #[test]
    fn empty_name_never_matches() {
        let (_dir, doc) = document(&[("TST001.yml", "ref: test_pass\n")]);

        assert_eq!(resolve("test_x.py::", &doc), None);
        assert_eq!(resolve("", &doc), None);
    }

    #[test]
    fn only_references_are_searched() {
        // The name appears in the item text but not in its references.
        let (_dir, doc) = document(&[("TST001.yml", "text: covered by test_pass\nref: ''\n")]);

        assert_eq!(resolve("test_pass", &doc), None);
    }
}
