use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::entry::{Entry, RawEntry};
use crate::error::ExposeError;

/// A TOML file listing several exposure requests.
///
/// ```toml
/// [[expose]]
/// git = "https://github.com/org/tools.git"
/// ref = "v1.0.0"
/// environment = "cli"
/// apps = ["tool-a", "tool-b"]
/// exclude-env-vars = ["HOME"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub expose: Vec<RawEntry>,
}

/// A problem found while validating a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestIssue {
    pub source: PathBuf,
    pub index: usize,
    pub message: String,
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {:?}", path))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse manifest {:?}", path))
    }

    /// Validate every entry, failing on the first invalid one.
    pub fn entries(&self, source: &Path) -> Result<Vec<Entry>> {
        if self.expose.is_empty() {
            anyhow::bail!("{} has no [[expose]] entries", source.display());
        }

        self.expose
            .iter()
            .cloned()
            .enumerate()
            .map(|(index, raw)| {
                Entry::try_from(raw).with_context(|| {
                    format!("entry #{} in {}", index + 1, source.display())
                })
            })
            .collect()
    }

    /// Every validation problem, in entry order.
    pub fn validate(&self, source: &Path) -> Vec<ManifestIssue> {
        self.expose
            .iter()
            .cloned()
            .enumerate()
            .filter_map(|(index, raw)| {
                Entry::try_from(raw)
                    .err()
                    .map(|err: ExposeError| ManifestIssue {
                        source: source.to_path_buf(),
                        index: index + 1,
                        message: err.to_string(),
                    })
            })
            .collect()
    }
}
