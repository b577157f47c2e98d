use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::delta::{AmbientEnvironment, CapturedEnvironment, PATH_VAR};
use crate::entry::Entry;
use crate::error::ExposeError;
use crate::stage::manifest_path;
use crate::tools;

/// Package installed globally to bootstrap pixi's trampoline binary.
const BOOTSTRAP_PACKAGE: &str = "coreutils";

/// Output of `pixi shell-hook --json`
#[derive(Debug, Deserialize)]
struct ShellHook {
    environment_variables: BTreeMap<String, String>,
}

/// Thin wrapper around the `pixi` executable.
#[derive(Debug, Clone)]
pub struct Pixi {
    program: PathBuf,
}

impl Pixi {
    pub fn new(program: PathBuf) -> Self {
        Self { program }
    }

    /// Locate `pixi` on PATH
    pub fn from_path() -> Result<Self, ExposeError> {
        let program = tools::find_tool("pixi")?;
        tracing::info!(path = ?program, "found pixi");
        Ok(Self::new(program))
    }

    /// Resolve and install the entry's environment for the working copy.
    pub fn install(&self, clone_dir: &Path, entry: &Entry) -> Result<()> {
        let mut command = Command::new(&self.program);
        command
            .arg("install")
            .arg("--manifest-path")
            .arg(manifest_path(clone_dir))
            .current_dir(clone_dir);
        select_environment(&mut command, entry);

        tools::run("pixi", &mut command).with_context(|| {
            format!(
                "Failed to install environment '{}' in {:?}",
                entry.environment(),
                clone_dir
            )
        })?;
        Ok(())
    }

    /// Variables an activation of the entry's environment would set.
    ///
    /// pixi runs with only the ambient `PATH` in its environment, so the
    /// reported `PATH` is the ambient one with activation directories added.
    pub fn shell_hook(
        &self,
        clone_dir: &Path,
        entry: &Entry,
        ambient: &AmbientEnvironment,
    ) -> Result<CapturedEnvironment> {
        let mut command = Command::new(&self.program);
        command
            .args(["shell-hook", "--json", "--manifest-path"])
            .arg(manifest_path(clone_dir))
            .current_dir(clone_dir)
            .env_clear()
            .env(PATH_VAR, ambient.path());
        select_environment(&mut command, entry);

        let output = tools::run("pixi", &mut command).with_context(|| {
            format!(
                "Failed to get shell-hook for environment '{}'",
                entry.environment()
            )
        })?;

        let hook: ShellHook = serde_json::from_slice(&output.stdout)
            .context("Failed to parse pixi shell-hook output")?;
        Ok(CapturedEnvironment::new(hook.environment_variables))
    }

    /// Install the trampoline binary through a throwaway global install when
    /// it is missing.
    pub fn ensure_trampoline(&self, trampoline_bin: &Path) -> Result<()> {
        if trampoline_bin.exists() {
            return Ok(());
        }

        tracing::info!(
            "trampoline binary not found, bootstrapping with `pixi global install {BOOTSTRAP_PACKAGE}`"
        );
        let mut command = Command::new(&self.program);
        command.args(["global", "install", BOOTSTRAP_PACKAGE]);
        tools::run("pixi", &mut command).context("Failed to bootstrap trampoline binary")?;

        if !trampoline_bin.exists() {
            anyhow::bail!(
                "`pixi global install {BOOTSTRAP_PACKAGE}` did not produce a trampoline binary at {:?}",
                trampoline_bin
            );
        }
        Ok(())
    }
}

fn select_environment(command: &mut Command, entry: &Entry) {
    if entry.has_explicit_environment() {
        command.args(["-e", entry.environment()]);
    }
}
