use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

use crate::delta::AmbientEnvironment;

const STAGING_DIR_NAME: &str = "expose-pixi-apps";

/// Layout locations under the pixi home directory
#[derive(Debug, Clone, Copy)]
pub enum LayoutPath {
    /// Shared bin directory: $PIXI_HOME/bin
    Bin,
    /// Trampoline records: $PIXI_HOME/bin/trampoline_configuration
    TrampolineConfiguration,
    /// Shared dispatch binary: $PIXI_HOME/bin/trampoline_configuration/trampoline_bin
    TrampolineBin,
}

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pixi_home: PathBuf,
    staging_dir: PathBuf,
    ambient: AmbientEnvironment,
}

impl Settings {
    pub fn new(pixi_home: PathBuf, staging_dir: PathBuf, ambient: AmbientEnvironment) -> Self {
        Self {
            pixi_home,
            staging_dir,
            ambient,
        }
    }

    /// Read settings from the process environment
    ///
    /// - Pixi home: $PIXI_HOME (default: ~/.pixi)
    /// - Staging: $RUNNER_TEMP/expose-pixi-apps (default: system temp dir)
    /// - Ambient environment: the current $PATH
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(
            Self::get_pixi_home()?,
            Self::get_staging_dir(),
            AmbientEnvironment::from_process(),
        ))
    }

    fn get_pixi_home() -> Result<PathBuf> {
        match env::var_os("PIXI_HOME").filter(|home| !home.is_empty()) {
            Some(home) => Ok(PathBuf::from(home)),
            None => {
                let base_dirs =
                    directories::BaseDirs::new().context("Failed to get home directory")?;
                Ok(base_dirs.home_dir().join(".pixi"))
            }
        }
    }

    fn get_staging_dir() -> PathBuf {
        env::var_os("RUNNER_TEMP")
            .filter(|temp| !temp.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(env::temp_dir)
            .join(STAGING_DIR_NAME)
    }

    /// Get path for a specific layout location
    pub fn path(&self, path_type: LayoutPath) -> PathBuf {
        match path_type {
            LayoutPath::Bin => self.pixi_home.join("bin"),
            LayoutPath::TrampolineConfiguration => {
                self.pixi_home.join("bin").join("trampoline_configuration")
            }
            LayoutPath::TrampolineBin => self
                .pixi_home
                .join("bin")
                .join("trampoline_configuration")
                .join("trampoline_bin"),
        }
    }

    /// Directory repositories are cloned into
    pub fn staging_dir(&self) -> &PathBuf {
        &self.staging_dir
    }

    pub fn ambient(&self) -> &AmbientEnvironment {
        &self.ambient
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_pixi_home_override() {
        let temp = TempDir::new().unwrap();
        env::set_var("PIXI_HOME", temp.path());
        env::set_var("RUNNER_TEMP", temp.path().join("runner"));

        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.path(LayoutPath::Bin), temp.path().join("bin"));
        assert_eq!(
            settings.path(LayoutPath::TrampolineBin),
            temp.path()
                .join("bin/trampoline_configuration/trampoline_bin")
        );
        assert_eq!(
            settings.staging_dir(),
            &temp.path().join("runner/expose-pixi-apps")
        );

        env::remove_var("PIXI_HOME");
        env::remove_var("RUNNER_TEMP");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        env::remove_var("PIXI_HOME");
        env::remove_var("RUNNER_TEMP");

        let settings = Settings::from_env().unwrap();
        assert!(settings.path(LayoutPath::Bin).ends_with(".pixi/bin"));
        assert!(settings.staging_dir().ends_with("expose-pixi-apps"));
    }

    #[test]
    #[serial]
    fn test_ambient_path_snapshot() {
        let settings = Settings::from_env().unwrap();
        assert_eq!(
            settings.ambient().path(),
            env::var("PATH").unwrap_or_default()
        );
    }
}
