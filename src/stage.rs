use anyhow::{Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::process::Command;

use crate::entry::Entry;
use crate::error::ExposeError;
use crate::tools;

/// Clones entry repositories into a staging directory with `git`.
#[derive(Debug, Clone)]
pub struct RepositoryStager {
    git: PathBuf,
    staging_dir: PathBuf,
}

impl RepositoryStager {
    pub fn new(git: PathBuf, staging_dir: PathBuf) -> Self {
        Self { git, staging_dir }
    }

    /// Locate `git` on PATH and stage under `staging_dir`.
    pub fn from_path(staging_dir: PathBuf) -> Result<Self> {
        Ok(Self::new(tools::find_tool("git")?, staging_dir))
    }

    /// Shallow-clone the entry's repository and return the working copy.
    ///
    /// A working copy left behind by an earlier run is replaced.
    pub fn stage(&self, entry: &Entry) -> Result<PathBuf> {
        let clone_dir = self.staging_dir.join(repository_name(entry.repository())?);

        if clone_dir.exists() {
            tracing::debug!(path = ?clone_dir, "removing stale working copy");
            fs::remove_dir_all(&clone_dir)
                .with_context(|| format!("Failed to remove stale clone {:?}", clone_dir))?;
        }
        fs::create_dir_all(&self.staging_dir)
            .with_context(|| format!("Failed to create staging directory {:?}", self.staging_dir))?;

        let mut command = Command::new(&self.git);
        command.args(["clone", "--depth", "1"]);
        if let Some(revision) = entry.revision() {
            command.args(["--branch", revision]);
        }
        command.arg("--").arg(entry.repository()).arg(&clone_dir);

        tools::run("git", &mut command)
            .with_context(|| format!("Failed to clone {}", entry.repository()))?;

        Ok(clone_dir)
    }
}

/// Directory name for a repository locator: its last path component without
/// a trailing `.git`.
///
/// The name must be a single plain component so the working copy stays a
/// direct child of the staging directory.
pub fn repository_name(repository: &str) -> Result<&str, ExposeError> {
    let trimmed = repository.trim_end_matches('/');
    let last = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let last = last.rsplit(':').next().unwrap_or(last);
    let name = last.strip_suffix(".git").unwrap_or(last);

    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => Err(ExposeError::validation(
            "git",
            format!("'{repository}' does not end in a repository name"),
        )),
    }
}

/// Path of the pixi manifest inside a working copy.
pub fn manifest_path(clone_dir: &Path) -> PathBuf {
    clone_dir.join("pixi.toml")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("https://github.com/org/tools.git", "tools")]
    #[case("https://github.com/org/tools", "tools")]
    #[case("https://github.com/org/tools/", "tools")]
    #[case("git@github.com:org/tools.git", "tools")]
    #[case("git@host:tools.git", "tools")]
    #[case("/srv/repos/local-tools", "local-tools")]
    fn test_repository_name(#[case] locator: &str, #[case] expected: &str) {
        assert_eq!(repository_name(locator).unwrap(), expected);
    }

    #[rstest]
    #[case::dot_dot_git("https://example.com/org/...git")]
    #[case::parent("https://example.com/org/..")]
    #[case::current("https://example.com/org/.")]
    #[case::bare_suffix(".git")]
    #[case::empty("")]
    fn test_repository_name_rejects_non_child(#[case] locator: &str) {
        match repository_name(locator).unwrap_err() {
            ExposeError::Validation { field, .. } => assert_eq!(field, "git"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_stage_stays_inside_staging_dir() {
        use std::os::unix::fs::PermissionsExt;
        use tempfile::TempDir;

        let temp = TempDir::new().unwrap();
        let runner = temp.path().join("runner");
        let staging = runner.join("expose-pixi-apps");
        fs::create_dir_all(staging.join("tools")).unwrap();
        fs::write(staging.join("tools/stale"), "old").unwrap();
        fs::write(runner.join("precious.txt"), "keep").unwrap();

        let git = temp.path().join("git");
        fs::write(&git, "#!/bin/sh\nfor last; do :; done\nmkdir -p \"$last\"\n").unwrap();
        fs::set_permissions(&git, fs::Permissions::from_mode(0o755)).unwrap();

        let entry = Entry::try_from(
            crate::entry::RawEntry::from_inputs(
                Some("https://example.com/org/tools.git"),
                None,
                None,
                Some("[rg]"),
                None,
            )
            .unwrap(),
        )
        .unwrap();

        let clone_dir = RepositoryStager::new(git, staging.clone()).stage(&entry).unwrap();
        assert_eq!(clone_dir, staging.join("tools"));
        assert!(!clone_dir.join("stale").exists());
        assert!(runner.join("precious.txt").exists());
    }

    #[test]
    fn test_manifest_path() {
        assert_eq!(
            manifest_path(Path::new("/tmp/stage/tools")),
            PathBuf::from("/tmp/stage/tools/pixi.toml")
        );
    }
}
