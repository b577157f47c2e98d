use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::{LayoutPath, Settings};
use crate::delta::EnvironmentDelta;
use crate::trampoline::TrampolineConfig;

/// One executable that was published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedExecutable {
    pub name: String,
    pub config_path: PathBuf,
    pub link_path: PathBuf,
    pub executable_path: PathBuf,
}

/// Writes trampoline records and hard-links the shared trampoline binary
/// into the bin directory under each exposed name.
///
/// The bin directory and the trampoline binary must live on the same
/// filesystem. Writes overwrite in place and links are replaced by
/// unlink-then-link, so concurrent runs exposing the same name race.
#[derive(Debug, Clone)]
pub struct TrampolinePublisher {
    bin_dir: PathBuf,
    config_dir: PathBuf,
    trampoline_bin: PathBuf,
}

impl TrampolinePublisher {
    pub fn new(bin_dir: PathBuf, config_dir: PathBuf, trampoline_bin: PathBuf) -> Self {
        Self {
            bin_dir,
            config_dir,
            trampoline_bin,
        }
    }

    /// Publisher for the layout under the configured pixi home.
    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            settings.path(LayoutPath::Bin),
            settings.path(LayoutPath::TrampolineConfiguration),
            settings.path(LayoutPath::TrampolineBin),
        )
    }

    pub fn bin_dir(&self) -> &Path {
        &self.bin_dir
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn trampoline_bin(&self) -> &Path {
        &self.trampoline_bin
    }

    /// Record location for `name`
    pub fn config_path(&self, name: &str) -> PathBuf {
        self.config_dir.join(format!("{name}.json"))
    }

    /// Bin entry for `name`
    pub fn link_path(&self, name: &str) -> PathBuf {
        self.bin_dir.join(name)
    }

    /// Create the record directory if needed.
    pub fn prepare(&self) -> Result<()> {
        fs::create_dir_all(&self.config_dir).with_context(|| {
            format!(
                "Failed to create trampoline configuration directory {:?}",
                self.config_dir
            )
        })
    }

    /// Publish every name in order, stopping at the first failure.
    ///
    /// Names published before a failure are left in place.
    pub fn publish_all<'a>(
        &self,
        names: impl IntoIterator<Item = &'a str>,
        delta: &EnvironmentDelta,
    ) -> Result<Vec<PublishedExecutable>> {
        names
            .into_iter()
            .map(|name| self.publish(name, delta))
            .collect()
    }

    /// Write the record for `name` and point its bin entry at the trampoline.
    pub fn publish(&self, name: &str, delta: &EnvironmentDelta) -> Result<PublishedExecutable> {
        let executable_path = delta.executable_path(name);
        let config = TrampolineConfig {
            executable_path: executable_path.clone(),
            path_delta: delta.path_delta.clone(),
            environment: delta.environment.clone(),
        };

        let config_path = self.config_path(name);
        tracing::info!(app = name, exe = ?executable_path, "writing trampoline config");
        config.save(&config_path)?;

        let link_path = self.link_path(name);
        self.link(&link_path)?;
        tracing::info!(app = name, link = ?link_path, "linked trampoline binary");

        Ok(PublishedExecutable {
            name: name.to_string(),
            config_path,
            link_path,
            executable_path,
        })
    }

    /// Remove the record and bin entry for `name`.
    ///
    /// Returns which of the two existed.
    pub fn unpublish(&self, name: &str) -> Result<(bool, bool)> {
        let config_path = self.config_path(name);
        let removed_config = remove_if_exists(&config_path)
            .with_context(|| format!("Failed to remove trampoline config {:?}", config_path))?;

        let link_path = self.link_path(name);
        let removed_link = remove_if_exists(&link_path)
            .with_context(|| format!("Failed to remove {:?}", link_path))?;

        Ok((removed_config, removed_link))
    }

    /// Names with a record in the configuration directory, sorted.
    pub fn published_names(&self) -> Result<Vec<String>> {
        if !self.config_dir.exists() {
            return Ok(Vec::new());
        }

        let mut names = Vec::new();
        for entry in fs::read_dir(&self.config_dir)
            .with_context(|| format!("Failed to read {:?}", self.config_dir))?
        {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(stem) = path.file_stem() {
                    names.push(stem.to_string_lossy().into_owned());
                }
            }
        }
        names.sort();
        Ok(names)
    }

    /// Whether the bin entry for `name` is the same file as the trampoline.
    #[cfg(unix)]
    pub fn is_linked(&self, name: &str) -> bool {
        use std::os::unix::fs::MetadataExt;

        match (
            fs::metadata(self.link_path(name)),
            fs::metadata(&self.trampoline_bin),
        ) {
            (Ok(link), Ok(trampoline)) => {
                link.dev() == trampoline.dev() && link.ino() == trampoline.ino()
            }
            _ => false,
        }
    }

    #[cfg(not(unix))]
    pub fn is_linked(&self, _name: &str) -> bool {
        false
    }

    fn link(&self, link_path: &Path) -> Result<()> {
        remove_if_exists(link_path)
            .with_context(|| format!("Failed to remove existing {:?}", link_path))?;

        fs::hard_link(&self.trampoline_bin, link_path).map_err(|err| {
            if is_cross_device(&err) {
                anyhow::anyhow!(
                    "Cannot hard-link {:?} to {:?}: the trampoline binary and the bin directory must be on the same filesystem",
                    self.trampoline_bin,
                    link_path
                )
            } else {
                anyhow::Error::new(err).context(format!(
                    "Failed to link trampoline binary {:?} to {:?}",
                    self.trampoline_bin, link_path
                ))
            }
        })
    }
}

fn remove_if_exists(path: &Path) -> io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

fn is_cross_device(err: &io::Error) -> bool {
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(18) // EXDEV
    }
    #[cfg(not(unix))]
    {
        let _ = err;
        false
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::os::unix::fs::MetadataExt;
    use tempfile::TempDir;

    fn setup(temp: &TempDir) -> TrampolinePublisher {
        let bin_dir = temp.path().join("bin");
        let config_dir = bin_dir.join("trampoline_configuration");
        let trampoline_bin = config_dir.join("trampoline_bin");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(&trampoline_bin, "#!/bin/sh\n").unwrap();
        TrampolinePublisher::new(bin_dir, config_dir, trampoline_bin)
    }

    fn delta(prefix: &str) -> EnvironmentDelta {
        EnvironmentDelta {
            active_prefix: PathBuf::from(prefix),
            path_delta: vec![format!("{prefix}/bin")],
            environment: BTreeMap::from([("CONDA_PREFIX".to_string(), prefix.to_string())]),
        }
    }

    #[test]
    fn test_publish_writes_config_and_link() {
        let temp = TempDir::new().unwrap();
        let publisher = setup(&temp);

        let published = publisher.publish("rg", &delta("/env")).unwrap();
        assert_eq!(published.executable_path, PathBuf::from("/env/bin/rg"));
        assert_eq!(published.link_path, temp.path().join("bin/rg"));

        let config = TrampolineConfig::load(&published.config_path).unwrap();
        assert_eq!(config.executable_path, PathBuf::from("/env/bin/rg"));
        assert_eq!(config.path_delta, vec!["/env/bin"]);
        assert_eq!(config.environment, delta("/env").environment);
        assert!(publisher.is_linked("rg"));
    }

    #[test]
    fn test_publish_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let publisher = setup(&temp);

        publisher.publish("rg", &delta("/env")).unwrap();
        let first = fs::read(publisher.config_path("rg")).unwrap();
        let first_ino = fs::metadata(publisher.link_path("rg")).unwrap().ino();

        publisher.publish("rg", &delta("/env")).unwrap();
        let second = fs::read(publisher.config_path("rg")).unwrap();
        let second_ino = fs::metadata(publisher.link_path("rg")).unwrap().ino();

        assert_eq!(first, second);
        assert_eq!(first_ino, second_ino);
        assert_eq!(
            second_ino,
            fs::metadata(publisher.trampoline_bin()).unwrap().ino()
        );
    }

    #[test]
    fn test_later_publish_wins() {
        let temp = TempDir::new().unwrap();
        let publisher = setup(&temp);

        publisher.publish("foo", &delta("/first")).unwrap();
        publisher.publish("foo", &delta("/second")).unwrap();

        let config = TrampolineConfig::load(&publisher.config_path("foo")).unwrap();
        assert_eq!(config.executable_path, PathBuf::from("/second/bin/foo"));
        assert!(publisher.is_linked("foo"));
    }

    #[test]
    fn test_publish_replaces_existing_file() {
        let temp = TempDir::new().unwrap();
        let publisher = setup(&temp);
        fs::write(publisher.link_path("rg"), "old binary").unwrap();

        publisher.publish("rg", &delta("/env")).unwrap();
        assert!(publisher.is_linked("rg"));
    }

    #[test]
    fn test_publish_all_stops_at_first_failure() {
        let temp = TempDir::new().unwrap();
        let publisher = setup(&temp);
        // A directory in the way cannot be unlinked with remove_file.
        fs::create_dir_all(publisher.link_path("blocked")).unwrap();

        let result = publisher.publish_all(["first", "blocked", "last"], &delta("/env"));
        assert!(result.is_err());
        assert!(publisher.config_path("first").exists());
        assert!(publisher.is_linked("first"));
        assert!(!publisher.config_path("last").exists());
    }

    #[test]
    fn test_missing_config_dir_fails() {
        let temp = TempDir::new().unwrap();
        let publisher = TrampolinePublisher::new(
            temp.path().join("bin"),
            temp.path().join("bin/trampoline_configuration"),
            temp.path().join("bin/trampoline_configuration/trampoline_bin"),
        );
        assert!(publisher.publish("rg", &delta("/env")).is_err());

        publisher.prepare().unwrap();
        assert!(publisher.config_dir().is_dir());
    }

    #[test]
    fn test_unpublish_and_list() {
        let temp = TempDir::new().unwrap();
        let publisher = setup(&temp);
        publisher
            .publish_all(["rg", "fd"], &delta("/env"))
            .unwrap();

        assert_eq!(publisher.published_names().unwrap(), vec!["fd", "rg"]);

        assert_eq!(publisher.unpublish("rg").unwrap(), (true, true));
        assert_eq!(publisher.unpublish("rg").unwrap(), (false, false));
        assert_eq!(publisher.published_names().unwrap(), vec!["fd"]);
        assert!(!publisher.link_path("rg").exists());
    }
}
