//! Item files: one YAML mapping per traceability item.
//!
//! The raw mapping is kept in stored order so that a rewrite only touches
//! the fields tracemark owns. Writes go through a temp file in the same
//! directory and an atomic rename; a failed write leaves the old file intact.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use serde_yaml::{Mapping, Value};
use tempfile::NamedTempFile;

use crate::model::{References, ResultField};

use super::{Result, StorageError};

/// Key holding the current reference list.
const REFERENCES_KEY: &str = "references";

/// Legacy single-reference key, used when `references` is absent.
const REF_KEY: &str = "ref";

/// A traceability item backed by a YAML file.
#[derive(Debug, Clone)]
pub struct Item {
    uid: String,
    path: PathBuf,
    data: Mapping,
}

impl Item {
    /// Load an item from disk. The UID is the file stem.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| StorageError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let value: Value = serde_yaml::from_str(&text).map_err(|source| StorageError::Yaml {
            path: path.to_path_buf(),
            source,
        })?;
        let data = match value {
            Value::Mapping(mapping) => mapping,
            Value::Null => Mapping::new(),
            _ => {
                return Err(StorageError::NotAMapping {
                    path: path.to_path_buf(),
                });
            }
        };
        let uid = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(Self {
            uid,
            path: path.to_path_buf(),
            data,
        })
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The item's references, falling back to the legacy `ref` field.
    pub fn references(&self) -> Option<References> {
        self.get(REFERENCES_KEY)
            .and_then(References::from_yaml)
            .or_else(|| self.get(REF_KEY).and_then(References::from_yaml))
    }

    /// Raw value of a field, if present.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// String value of a result field, if present.
    pub fn result_field(&self, field: ResultField) -> Option<&str> {
        self.get(field.key()).and_then(Value::as_str)
    }

    /// Set one field and persist the item immediately.
    pub fn set(&mut self, key: &str, value: Value) -> Result<()> {
        self.write_fields(vec![(Value::from(key), value)]).map(|_| ())
    }

    /// Set several result fields and persist them in a single write.
    ///
    /// Returns `false` without touching the file when every field already
    /// holds the requested value.
    pub fn set_results(&mut self, fields: &[(ResultField, &str)]) -> Result<bool> {
        let fields = fields
            .iter()
            .map(|(field, value)| (Value::from(field.key()), Value::from(*value)))
            .collect();
        self.write_fields(fields)
    }

    /// Apply `fields` in memory, then save. The in-memory mapping is
    /// restored if the save fails, so it never drifts from the file.
    fn write_fields(&mut self, fields: Vec<(Value, Value)>) -> Result<bool> {
        if fields.iter().all(|(k, v)| self.data.get(k) == Some(v)) {
            return Ok(false);
        }

        let previous = self.data.clone();
        for (key, value) in fields {
            self.data.insert(key, value);
        }
        if let Err(e) = self.save() {
            self.data = previous;
            return Err(e);
        }
        Ok(true)
    }

    fn save(&self) -> Result<()> {
        let yaml = serde_yaml::to_string(&self.data).map_err(|source| StorageError::Yaml {
            path: self.path.clone(),
            source,
        })?;
        let write_err = |source| StorageError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
        // Temp files are created owner-only; keep the item's own mode.
        if let Ok(metadata) = fs::metadata(&self.path) {
            tmp.as_file()
                .set_permissions(metadata.permissions())
                .map_err(write_err)?;
        }
        tmp.write_all(yaml.as_bytes()).map_err(write_err)?;
        tmp.persist(&self.path).map_err(|e| write_err(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn write_item(dir: &TempDir, name: &str, yaml: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, yaml).unwrap();
        path
    }

    #[test]
    fn uid_is_file_stem() {
        let dir = TempDir::new().unwrap();
        let path = write_item(&dir, "REQ001.yml", "active: true\ntext: Login works\n");

        let item = Item::load(&path).unwrap();

        assert_eq!(item.uid(), "REQ001");
        assert_eq!(item.get("text").and_then(Value::as_str), Some("Login works"));
    }

    #[test]
    fn references_fall_back_to_legacy_ref() {
        let dir = TempDir::new().unwrap();
        let path = write_item(&dir, "REQ001.yml", "ref: test_login\n");

        let item = Item::load(&path).unwrap();

        assert_eq!(
            item.references(),
            Some(References::Scalar("test_login".into()))
        );
    }

    #[test]
    fn references_win_over_legacy_ref() {
        let dir = TempDir::new().unwrap();
        let path = write_item(
            &dir,
            "REQ001.yml",
            "ref: ''\nreferences:\n- keyword: test_login\n",
        );

        let item = Item::load(&path).unwrap();

        assert_eq!(
            item.references().unwrap().flatten_for_search(),
            "test_login"
        );
    }

    #[test]
    fn set_results_persists_and_keeps_other_fields() {
        let dir = TempDir::new().unwrap();
        let path = write_item(
            &dir,
            "REQ001.yml",
            "active: true\nlevel: 1.2\ntext: |\n  Login works.\n",
        );

        let mut item = Item::load(&path).unwrap();
        let changed = item
            .set_results(&[
                (ResultField::CommitLatest, "abc123"),
                (ResultField::ResultLatest, "passed"),
            ])
            .unwrap();
        assert!(changed);

        let reloaded = Item::load(&path).unwrap();
        assert_eq!(
            reloaded.result_field(ResultField::CommitLatest),
            Some("abc123")
        );
        assert_eq!(
            reloaded.result_field(ResultField::ResultLatest),
            Some("passed")
        );
        assert_eq!(reloaded.get("active"), Some(&Value::Bool(true)));
        assert_eq!(
            reloaded.get("text").and_then(Value::as_str),
            Some("Login works.\n")
        );

        // Untouched fields keep their position ahead of the new ones.
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.find("active").unwrap() < text.find("test_commit_latest").unwrap());
    }

    #[test]
    fn unchanged_values_skip_the_write() {
        let dir = TempDir::new().unwrap();
        let path = write_item(&dir, "REQ001.yml", "test_commit_latest: abc123\n");

        let mut item = Item::load(&path).unwrap();
        let changed = item
            .set_results(&[(ResultField::CommitLatest, "abc123")])
            .unwrap();

        assert!(!changed);
    }

    #[test]
    fn set_writes_immediately() {
        let dir = TempDir::new().unwrap();
        let path = write_item(&dir, "REQ001.yml", "text: hi\n");

        let mut item = Item::load(&path).unwrap();
        item.set("reviewed", Value::from("yes")).unwrap();

        let reloaded = Item::load(&path).unwrap();
        assert_eq!(reloaded.get("reviewed").and_then(Value::as_str), Some("yes"));
    }

    #[cfg(unix)]
    #[test]
    fn save_keeps_file_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let path = write_item(&dir, "TST001.yml", "ref: test_pass\n");
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        let mut item = Item::load(&path).unwrap();
        item.set_results(&[(ResultField::ResultLatest, "passed")])
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn failed_save_restores_memory() {
        let dir = TempDir::new().unwrap();
        let path = write_item(&dir, "REQ001.yml", "text: hi\n");
        let mut item = Item::load(&path).unwrap();

        // Remove the directory so the temp file cannot be created.
        drop(dir);

        let err = item
            .set_results(&[(ResultField::ResultLatest, "failed")])
            .unwrap_err();

        assert!(matches!(err, StorageError::Write { .. }));
        assert_eq!(item.result_field(ResultField::ResultLatest), None);
    }

    #[test]
    fn non_mapping_item_is_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_item(&dir, "REQ001.yml", "- just\n- a list\n");

        let err = Item::load(&path).unwrap_err();

        assert!(matches!(err, StorageError::NotAMapping { .. }));
    }
}
