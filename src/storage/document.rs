//! Documents: a directory of item files sharing a prefix.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use super::{DocumentError, Item, StorageError};

/// Marks a directory as a document root and holds its settings.
pub const DOCUMENT_CONFIG: &str = ".doorstop.yml";

#[derive(Deserialize)]
struct DocumentConfig {
    settings: DocumentSettings,
}

#[derive(Deserialize)]
struct DocumentSettings {
    prefix: String,
}

/// A document root found on disk, identified by its config alone.
///
/// Reading one never touches the item files, so a broken item in one
/// document cannot affect locating another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRoot {
    prefix: String,
    root: PathBuf,
}

impl DocumentRoot {
    /// Read the `.doorstop.yml` in `root`.
    pub fn read(root: &Path) -> Result<Self, DocumentError> {
        let config_path = root.join(DOCUMENT_CONFIG);
        let text = fs::read_to_string(&config_path).map_err(|source| StorageError::Read {
            path: config_path.clone(),
            source,
        })?;
        let config: DocumentConfig =
            serde_yaml::from_str(&text).map_err(|e| DocumentError::InvalidConfig {
                path: config_path.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            prefix: config.settings.prefix,
            root: root.to_path_buf(),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the document's items.
    pub fn load(self) -> Result<Document, DocumentError> {
        let items = load_items(&self.root)?;
        tracing::debug!(
            prefix = %self.prefix,
            root = %self.root.display(),
            items = items.len(),
            "loaded document"
        );

        Ok(Document {
            prefix: self.prefix,
            root: self.root,
            items,
        })
    }
}

/// A loaded document: its prefix, root directory, and items in file-name order.
#[derive(Debug)]
pub struct Document {
    prefix: String,
    root: PathBuf,
    items: Vec<Item>,
}

impl Document {
    /// Load the document rooted at `root`.
    pub fn load(root: &Path) -> Result<Self, DocumentError> {
        DocumentRoot::read(root)?.load()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Items in document order.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn item_mut(&mut self, index: usize) -> Option<&mut Item> {
        self.items.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Whether `dir` holds a document config.
pub fn is_document_root(dir: &Path) -> bool {
    dir.join(DOCUMENT_CONFIG).is_file()
}

/// Every `*.yml` file directly in `root`, except the document config,
/// sorted by file name.
fn load_items(root: &Path) -> Result<Vec<Item>, StorageError> {
    let read_err = |source: io::Error| StorageError::Read {
        path: root.to_path_buf(),
        source,
    };

    let mut paths = Vec::new();
    for entry in fs::read_dir(root).map_err(read_err)? {
        let path = entry.map_err(read_err)?.path();
        let is_item = path.is_file()
            && path.extension().is_some_and(|ext| ext == "yml")
            && path.file_name().is_some_and(|name| name != DOCUMENT_CONFIG);
        if is_item {
            paths.push(path);
        }
    }
    paths.sort();

    paths.iter().map(|p| Item::load(p)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn setup_document() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::write(
            root.join(DOCUMENT_CONFIG),
            "settings:\n  digits: 3\n  prefix: REQ\n  sep: ''\n",
        )
        .unwrap();
        fs::write(root.join("REQ002.yml"), "ref: test_b\n").unwrap();
        fs::write(root.join("REQ001.yml"), "ref: test_a\n").unwrap();
        fs::write(root.join("notes.txt"), "not an item").unwrap();
        fs::create_dir(root.join("assets")).unwrap();
        dir
    }

    #[test]
    fn loads_items_in_file_name_order() {
        let dir = setup_document();

        let doc = Document::load(dir.path()).unwrap();

        assert_eq!(doc.prefix(), "REQ");
        let uids: Vec<&str> = doc.items().iter().map(Item::uid).collect();
        assert_eq!(uids, ["REQ001", "REQ002"]);
    }

    #[test]
    fn missing_prefix_is_invalid_config() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(DOCUMENT_CONFIG), "settings:\n  digits: 3\n").unwrap();

        let err = Document::load(dir.path()).unwrap_err();

        assert!(matches!(err, DocumentError::InvalidConfig { .. }));
    }

    #[test]
    fn reading_the_root_skips_items() {
        let dir = setup_document();
        fs::write(dir.path().join("REQ003.yml"), "text: [unclosed\n").unwrap();

        let root = DocumentRoot::read(dir.path()).unwrap();
        assert_eq!(root.prefix(), "REQ");

        let err = root.load().unwrap_err();
        assert!(matches!(err, DocumentError::Storage(StorageError::Yaml { .. })));
    }

    #[test]
    fn document_root_detection() {
        let dir = setup_document();

        assert!(is_document_root(dir.path()));
        assert!(!is_document_root(&dir.path().join("assets")));
    }
}
