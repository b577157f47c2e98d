use crate::{ui, Manifest, Pipeline, Settings};
use anyhow::{Context, Result};
use std::path::Path;

pub fn execute(settings: Settings, manifest_path: &Path) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let entries = manifest.entries(manifest_path)?;

    let pipeline = Pipeline::from_settings(settings)?;
    pipeline.prepare()?;

    // Entries run in order; a failure leaves earlier entries published.
    let mut exposed = 0usize;
    for (index, entry) in entries.iter().enumerate() {
        let report = pipeline.expose(entry).with_context(|| {
            format!(
                "Failed to expose entry #{} ({})",
                index + 1,
                entry.repository()
            )
        })?;
        exposed += report.published.len();
    }

    ui::success(
        "Applied",
        format!(
            "{} entry(s) from {}, {exposed} executable(s) exposed",
            entries.len(),
            manifest_path.display()
        ),
    );
    Ok(())
}
