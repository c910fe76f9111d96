//! Doorstop document store.
//!
//! A document tree is a directory hierarchy where each document root holds
//! a `.doorstop.yml` config and its items as sibling YAML files:
//!
//! ```text
//! <root>/
//!   reqs/
//!     .doorstop.yml    # settings: { prefix: REQ }
//!     REQ001.yml
//!     REQ002.yml
//!   tests/plan/
//!     .doorstop.yml    # settings: { prefix: TST }
//!     TST001.yml
//! ```
//!
//! A session opens exactly one document, named by a [`Locator`].

mod document;
mod item;

use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
};

use ignore::WalkBuilder;

pub use document::{DOCUMENT_CONFIG, Document, DocumentRoot, is_document_root};
pub use item::Item;

/// Errors reading or writing item files.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("{} is not a YAML mapping", path.display())]
    NotAMapping { path: PathBuf },
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// Errors locating or loading a document.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("could not locate a document with prefix `{prefix}` under {}", root.display())]
    PrefixNotFound { prefix: String, root: PathBuf },

    #[error("could not locate a document at or directly under {}", path.display())]
    NoDocument { path: PathBuf },

    #[error("invalid document config {}: {reason}", path.display())]
    InvalidConfig { path: PathBuf, reason: String },

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// How a session names its document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// A document prefix, e.g. `REQ`. Matched case-insensitively.
    Prefix(String),

    /// A document root, or a directory with a document somewhere under
    /// one of its immediate children.
    Path(PathBuf),
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Prefix(prefix) => write!(f, "prefix {prefix}"),
            Self::Path(path) => write!(f, "path {}", path.display()),
        }
    }
}

/// Open the document named by `locator`.
///
/// Prefixes are looked up among all documents discovered under `root`.
/// Only the chosen document's items are loaded.
pub fn open(locator: &Locator, root: &Path) -> core::result::Result<Document, DocumentError> {
    match locator {
        Locator::Prefix(prefix) => discover(root)
            .into_iter()
            .find(|doc| doc.prefix().eq_ignore_ascii_case(prefix))
            .ok_or_else(|| DocumentError::PrefixNotFound {
                prefix: prefix.clone(),
                root: root.to_path_buf(),
            })?
            .load(),
        Locator::Path(path) => open_path(path),
    }
}

/// Open `path` as a document root, or fall back to the first child
/// directory (in name order) that has any document beneath it.
fn open_path(path: &Path) -> core::result::Result<Document, DocumentError> {
    if is_document_root(path) {
        return Document::load(path);
    }

    let entries = match fs::read_dir(path) {
        Ok(entries) => entries,
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            return Err(DocumentError::NoDocument {
                path: path.to_path_buf(),
            });
        }
        Err(source) => {
            return Err(StorageError::Read {
                path: path.to_path_buf(),
                source,
            }
            .into());
        }
    };

    let mut children: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|p| p.is_dir() && p.file_name().is_none_or(|name| name != ".git"))
        .collect();
    children.sort();

    for child in children {
        if let Some(doc) = discover(&child).into_iter().next() {
            tracing::debug!(
                path = %path.display(),
                found = %doc.root().display(),
                "path is not a document root, using first document under a child"
            );
            return doc.load();
        }
    }

    Err(DocumentError::NoDocument {
        path: path.to_path_buf(),
    })
}

/// Find every document root under `root`, in walk order.
///
/// Respects `.gitignore`. Descends into dot-directories (the config file
/// itself is a dotfile) but never into `.git`. Roots with an unreadable
/// config are skipped with a warning.
pub fn discover(root: &Path) -> Vec<DocumentRoot> {
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .filter_entry(|entry| {
            !(entry.file_type().is_some_and(|ft| ft.is_dir()) && entry.file_name() == ".git")
        })
        .sort_by_file_name(Ord::cmp)
        .build();

    let mut documents = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable path during discovery");
                continue;
            }
        };
        if entry.file_name() != DOCUMENT_CONFIG {
            continue;
        }
        let Some(dir) = entry.path().parent() else {
            continue;
        };
        match DocumentRoot::read(dir) {
            Ok(document) => documents.push(document),
            Err(e) => tracing::warn!(error = %e, "skipping document with unreadable config"),
        }
    }
    documents
}
