use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Per-executable record read by pixi's trampoline binary.
///
/// Serialized as `{"exe": ..., "path_diff": ..., "env": {...}}`, with the path
/// delta joined into a single separator-delimited string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrampolineConfig {
    /// Absolute path of the real executable
    #[serde(rename = "exe")]
    pub executable_path: PathBuf,
    /// Directories to prepend to PATH, highest priority first
    #[serde(rename = "path_diff", with = "path_list")]
    pub path_delta: Vec<String>,
    /// Variables to set before exec
    #[serde(rename = "env")]
    pub environment: BTreeMap<String, String>,
}

impl TrampolineConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read trampoline config {:?}", path))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse trampoline config {:?}", path))
    }

    /// Write the record, replacing any previous one.
    ///
    /// The parent directory must already exist.
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize trampoline config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write trampoline config {:?}", path))
    }
}

mod path_list {
    use crate::delta::PATH_LIST_SEPARATOR;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(entries: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&entries.join(PATH_LIST_SEPARATOR.to_string().as_str()))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        let joined = String::deserialize(deserializer)?;
        Ok(joined
            .split(PATH_LIST_SEPARATOR)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect())
    }
}
