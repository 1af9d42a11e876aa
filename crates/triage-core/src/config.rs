//! Runtime configuration.
//!
//! Resolved once at process startup and passed into the core. Nothing below
//! this module reads environment variables.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::corpus::{load_with_overrides, Corpus, CorpusResult};
use crate::db::{Database, DbResult};

pub const ENV_CORPUS: &str = "TRIAGE_CORPUS";
pub const ENV_OVERRIDES: &str = "TRIAGE_OVERRIDES";
pub const ENV_DB: &str = "TRIAGE_DB";
pub const ENV_SYSTEM_ID: &str = "TRIAGE_SYSTEM_ID";
pub const ENV_OPERATOR: &str = "TRIAGE_OPERATOR";

pub const DEFAULT_DB_PATH: &str = "triage.db";
pub const DEFAULT_OPERATOR: &str = "reception";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} cannot be empty")]
    Empty(&'static str),

    #[error("{name} points at {path}, which is not a file")]
    NotAFile { name: &'static str, path: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TriageConfig {
    corpus_path: Option<PathBuf>,
    override_path: Option<PathBuf>,
    database_path: PathBuf,
    system_id: Option<String>,
    operator: String,
}

impl TriageConfig {
    pub fn new(
        corpus_path: Option<PathBuf>,
        override_path: Option<PathBuf>,
        database_path: PathBuf,
        system_id: Option<String>,
        operator: String,
    ) -> ConfigResult<Self> {
        if operator.trim().is_empty() {
            return Err(ConfigError::Empty("operator"));
        }
        if database_path.as_os_str().is_empty() {
            return Err(ConfigError::Empty("database path"));
        }
        check_file(ENV_CORPUS, corpus_path.as_deref())?;
        check_file(ENV_OVERRIDES, override_path.as_deref())?;

        Ok(Self {
            corpus_path,
            override_path,
            database_path,
            system_id: system_id.filter(|s| !s.trim().is_empty()),
            operator: operator.trim().to_string(),
        })
    }

    /// Resolve from a variable lookup, falling back to defaults.
    ///
    /// `lookup` is usually `|key| std::env::var(key).ok()`; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self::new(
            non_empty(ENV_CORPUS).map(PathBuf::from),
            non_empty(ENV_OVERRIDES).map(PathBuf::from),
            non_empty(ENV_DB)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_PATH)),
            non_empty(ENV_SYSTEM_ID),
            non_empty(ENV_OPERATOR).unwrap_or_else(|| DEFAULT_OPERATOR.to_string()),
        )
    }

    pub fn corpus_path(&self) -> Option<&Path> {
        self.corpus_path.as_deref()
    }

    pub fn override_path(&self) -> Option<&Path> {
        self.override_path.as_deref()
    }

    pub fn database_path(&self) -> &Path {
        &self.database_path
    }

    pub fn system_id(&self) -> Option<&str> {
        self.system_id.as_deref()
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    /// Load the configured corpus (built-in protocol when no path is set)
    /// with any administrator overrides merged in.
    pub fn load_corpus(&self) -> CorpusResult<Corpus> {
        load_with_overrides(self.corpus_path(), self.override_path())
    }

    pub fn open_database(&self) -> DbResult<Database> {
        Database::open(&self.database_path)
    }
}

fn check_file(name: &'static str, path: Option<&Path>) -> ConfigResult<()> {
    match path {
        Some(p) if !p.is_file() => Err(ConfigError::NotAFile {
            name,
            path: p.display().to_string(),
        }),
        _ => Ok(()),
    }
}
