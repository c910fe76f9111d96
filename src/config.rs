//! tracemark configuration.
//!
//! Loaded from `tracemark.toml` in the working directory, falling back to
//! `~/.tracemark/config.toml`. Both are optional; every key has a default.
//!
//! ```toml
//! prefix = "TST"
//! verbose = true
//! format = "libtest"
//! expected-failures = ["api::tests::known_broken"]
//! ```
//!
//! The document locator is resolved through a chain:
//!
//! 1. `--prefix`, then `--path` (explicit per-run selectors)
//! 2. `TRACEMARK_PREFIX` env var
//! 3. `prefix`, then `path` from the config file
//! 4. the current directory, as a path

use std::{
    env, fs, io,
    path::{Path, PathBuf},
};

use serde::Deserialize;

use crate::{events::EventFormat, storage::Locator};

/// Config file looked up in the working directory.
pub const FILE_NAME: &str = "tracemark.toml";

/// Env var naming the document prefix.
pub const PREFIX_ENV: &str = "TRACEMARK_PREFIX";

/// Env var overriding the git revision lookup.
pub const REVISION_ENV: &str = "TRACEMARK_REVISION";

/// Errors loading a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("invalid config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// tracemark configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    /// Document prefix to record into.
    pub prefix: Option<String>,

    /// Document directory to record into. Ignored when a prefix is set.
    pub path: Option<PathBuf>,

    /// Where prefix discovery starts. Defaults to the working directory.
    pub root: Option<PathBuf>,

    /// Report each recording and each unmapped test.
    pub verbose: bool,

    /// Tests expected to fail, by full identifier or innermost name.
    pub expected_failures: Vec<String>,

    /// Line format of the event stream.
    pub format: EventFormat,
}

impl Config {
    /// Load the project config from `dir`, else the user config, else defaults.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        if let Some(config) = Self::load_from(&dir.join(FILE_NAME))? {
            return Ok(config);
        }
        if let Some(path) = Self::user_path()
            && let Some(config) = Self::load_from(&path)?
        {
            return Ok(config);
        }
        Ok(Self::default())
    }

    /// Load a config file. A missing file is `Ok(None)`.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(s) => s,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!(path = %path.display(), "loaded config");
        Ok(Some(config))
    }

    /// The user config path: `~/.tracemark/config.toml`.
    pub fn user_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".tracemark").join("config.toml"))
    }
}

/// Resolve the document locator from the chain described in the module docs.
pub fn resolve_locator(
    explicit_prefix: Option<&str>,
    explicit_path: Option<&Path>,
    config: &Config,
    cwd: &Path,
) -> Locator {
    let env_prefix = env::var(PREFIX_ENV).ok();
    pick_locator(
        explicit_prefix,
        explicit_path,
        env_prefix.as_deref(),
        config,
        cwd,
    )
}

/// Resolve the revision override: explicit value, then `TRACEMARK_REVISION`.
///
/// `None` means look it up from git.
pub fn resolve_revision(explicit: Option<&str>) -> Option<String> {
    explicit
        .map(String::from)
        .or_else(|| env::var(REVISION_ENV).ok())
        .filter(|s| !s.is_empty())
}

fn pick_locator(
    explicit_prefix: Option<&str>,
    explicit_path: Option<&Path>,
    env_prefix: Option<&str>,
    config: &Config,
    cwd: &Path,
) -> Locator {
    let non_empty = |s: &&str| !s.is_empty();

    if let Some(prefix) = explicit_prefix.filter(non_empty) {
        return Locator::Prefix(prefix.to_string());
    }
    if let Some(path) = explicit_path {
        return Locator::Path(path.to_path_buf());
    }
    if let Some(prefix) = env_prefix.filter(non_empty) {
        return Locator::Prefix(prefix.to_string());
    }
    if let Some(prefix) = config.prefix.as_deref().filter(non_empty) {
        return Locator::Prefix(prefix.to_string());
    }
    if let Some(path) = &config.path {
        return Locator::Path(path.clone());
    }
    Locator::Path(cwd.to_path_buf())
}
