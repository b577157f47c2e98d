use crate::{ui, Manifest};
use anyhow::Result;
use std::path::Path;

pub fn execute(manifest_path: &Path) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    if manifest.expose.is_empty() {
        anyhow::bail!("{} has no [[expose]] entries", manifest_path.display());
    }

    let issues = manifest.validate(manifest_path);
    if issues.is_empty() {
        ui::success(
            "Check",
            format!("Validated {} entry(s) without issues.", manifest.expose.len()),
        );
        return Ok(());
    }

    for issue in &issues {
        ui::error(format!(
            "{} (entry #{}): {}",
            issue.source.display(),
            issue.index,
            issue.message
        ));
    }
    anyhow::bail!("Manifest validation failed ({} issue(s)).", issues.len());
}
