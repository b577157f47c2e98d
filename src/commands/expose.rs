use crate::cli::ExposeArgs;
use crate::{ui, Entry, Pipeline, RawEntry, Settings};
use anyhow::Result;

pub fn execute(settings: Settings, args: ExposeArgs) -> Result<()> {
    let raw = RawEntry::from_inputs(
        args.git.as_deref(),
        args.reference.as_deref(),
        args.environment.as_deref(),
        args.apps.as_deref(),
        args.exclude_env_vars.as_deref(),
    )?;
    let entry = Entry::try_from(raw)?;

    let pipeline = Pipeline::from_settings(settings)?;
    pipeline.prepare()?;

    let report = pipeline.expose(&entry)?;
    for published in &report.published {
        ui::success(
            "Exposed",
            format!(
                "{} -> {}",
                published.link_path.display(),
                published.executable_path.display()
            ),
        );
    }
    Ok(())
}
