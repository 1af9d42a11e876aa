//! Corpus file loading and administrator override merge.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{Corpus, CorpusError, CorpusResult};
use crate::models::FlagCategory;

/// On-disk shape of a corpus or override file.
///
/// Entries are an ordered list of tier-tagged records; declaration order
/// within a tier is the clinical priority order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CorpusFile {
    /// Protocol version (required for a base corpus, optional for overrides)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub entries: Vec<FlagCategory>,
}

/// Structured text formats accepted for corpus files.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorpusFormat {
    Json,
    Yaml,
}

impl CorpusFormat {
    /// Pick a format from a file extension.
    pub fn from_path(path: &Path) -> CorpusResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        match ext.as_str() {
            "json" => Ok(CorpusFormat::Json),
            "yaml" | "yml" => Ok(CorpusFormat::Yaml),
            _ => Err(CorpusError::UnsupportedFormat(path.display().to_string())),
        }
    }
}

impl CorpusFile {
    /// Parse a corpus file from text.
    pub fn parse(text: &str, format: CorpusFormat) -> CorpusResult<Self> {
        let file = match format {
            CorpusFormat::Json => serde_json::from_str(text)?,
            CorpusFormat::Yaml => serde_yaml::from_str(text)?,
        };
        Ok(file)
    }

    /// Read and parse a corpus file, choosing the format by extension.
    pub fn read(path: &Path) -> CorpusResult<Self> {
        let format = CorpusFormat::from_path(path)?;
        let text = std::fs::read_to_string(path).map_err(|source| CorpusError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, format)
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Validate into a corpus. A missing version is treated as empty and
    /// rejected.
    pub fn into_corpus(self) -> CorpusResult<Corpus> {
        Corpus::new(self.version.unwrap_or_default(), self.entries)
    }
}

/// Load and validate a base corpus from disk.
pub fn load_corpus(path: &Path) -> CorpusResult<Corpus> {
    let corpus = CorpusFile::read(path)?.into_corpus()?;
    info!(
        path = %path.display(),
        version = corpus.version(),
        entries = corpus.len(),
        "corpus loaded"
    );
    Ok(corpus)
}

/// Load a base corpus (or the built-in one) and apply an optional override
/// file on top of it.
pub fn load_with_overrides(base: Option<&Path>, overrides: Option<&Path>) -> CorpusResult<Corpus> {
    let base = match base {
        Some(path) => load_corpus(path)?,
        None => Corpus::builtin(),
    };

    match overrides {
        Some(path) => {
            let file = CorpusFile::read(path)?;
            merge_overrides(&base, file)
        }
        None => Ok(base),
    }
}

/// Merge administrator overrides into a base corpus, producing a new corpus.
///
/// - An override whose id exists in the base replaces that entry entirely,
///   in the base entry's position. No field-level merge.
/// - Overrides with new ids are appended in override order.
/// - Base entries without an override pass through unchanged.
///
/// The base corpus is not modified. The result is revalidated.
pub fn merge_overrides(base: &Corpus, overrides: CorpusFile) -> CorpusResult<Corpus> {
    let mut seen = HashSet::new();
    for entry in &overrides.entries {
        let id = entry.id().trim();
        if !seen.insert(id.to_string()) {
            return Err(CorpusError::DuplicateOverride(id.to_string()));
        }
    }

    let mut by_id: HashMap<String, FlagCategory> = overrides
        .entries
        .iter()
        .map(|e| (e.id().trim().to_string(), e.clone()))
        .collect();

    let mut replaced = 0usize;
    let mut entries: Vec<FlagCategory> = base
        .entries()
        .iter()
        .map(|entry| match by_id.remove(entry.id()) {
            Some(replacement) => {
                replaced += 1;
                debug!(id = entry.id(), "override replaces corpus entry");
                replacement
            }
            None => entry.clone(),
        })
        .collect();

    let mut added = 0usize;
    for entry in overrides.entries {
        if by_id.remove(entry.id().trim()).is_some() {
            added += 1;
            entries.push(entry);
        }
    }

    let version = match overrides.version {
        Some(v) if !v.trim().is_empty() => v,
        _ => format!("{}+overrides", base.version()),
    };

    let merged = Corpus::new(version, entries)?;
    info!(
        version = merged.version(),
        replaced, added, "corpus overrides merged"
    );
    Ok(merged)
}
