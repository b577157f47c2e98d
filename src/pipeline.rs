use anyhow::Result;
use std::path::PathBuf;

use crate::config::Settings;
use crate::delta::EnvironmentDelta;
use crate::entry::Entry;
use crate::pixi::Pixi;
use crate::publish::{PublishedExecutable, TrampolinePublisher};
use crate::stage::RepositoryStager;
use crate::ui::Progress;

/// Result of exposing one entry.
#[derive(Debug, Clone)]
pub struct ExposeReport {
    pub clone_dir: PathBuf,
    pub delta: EnvironmentDelta,
    pub published: Vec<PublishedExecutable>,
}

/// Runs entries through stage, install, shell-hook, delta and publish.
///
/// Every stage blocks until it finishes and the first failure aborts the
/// entry. Entries already exposed by the same pipeline are not rolled back.
#[derive(Debug)]
pub struct Pipeline {
    settings: Settings,
    stager: RepositoryStager,
    pixi: Pixi,
    publisher: TrampolinePublisher,
}

impl Pipeline {
    pub fn new(settings: Settings, stager: RepositoryStager, pixi: Pixi) -> Self {
        let publisher = TrampolinePublisher::from_settings(&settings);
        Self {
            settings,
            stager,
            pixi,
            publisher,
        }
    }

    /// Locate `git` and `pixi` on PATH.
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let pixi = Pixi::from_path()?;
        let stager = RepositoryStager::from_path(settings.staging_dir().clone())?;
        Ok(Self::new(settings, stager, pixi))
    }

    pub fn publisher(&self) -> &TrampolinePublisher {
        &self.publisher
    }

    /// Make sure the trampoline binary and configuration directory exist.
    pub fn prepare(&self) -> Result<()> {
        self.pixi.ensure_trampoline(self.publisher.trampoline_bin())?;
        self.publisher.prepare()
    }

    /// Expose every executable of `entry`.
    pub fn expose(&self, entry: &Entry) -> Result<ExposeReport> {
        for name in entry.duplicate_executables() {
            tracing::warn!(app = name, "listed more than once; the last occurrence wins");
        }

        let progress = Progress::new("Cloning", entry.repository());
        let clone_dir = match self.stager.stage(entry) {
            Ok(dir) => dir,
            Err(err) => {
                progress.fail("Failed", &err);
                return Err(err);
            }
        };
        progress.success("Cloned", revision_detail(entry));

        let progress = Progress::new("Installing", format!("environment '{}'", entry.environment()));
        if let Err(err) = self.pixi.install(&clone_dir, entry) {
            progress.fail("Failed", &err);
            return Err(err);
        }
        progress.success("Installed", None);

        let captured = self
            .pixi
            .shell_hook(&clone_dir, entry, self.settings.ambient())?;
        let delta = EnvironmentDelta::compute(
            &captured,
            self.settings.ambient(),
            entry.excluded_variables(),
            entry.environment(),
        )?;
        tracing::debug!(
            prefix = ?delta.active_prefix,
            path_delta = ?delta.path_delta,
            variables = delta.environment.len(),
            "computed environment delta"
        );

        let published = self.publisher.publish_all(
            entry.executables().iter().map(String::as_str),
            &delta,
        )?;

        Ok(ExposeReport {
            clone_dir,
            delta,
            published,
        })
    }
}

fn revision_detail(entry: &Entry) -> Option<String> {
    entry.revision().map(|revision| format!("(ref: {revision})"))
}
