use crate::entry::validate_executable_name;
use crate::{ui, Settings, TrampolinePublisher};
use anyhow::Result;

pub fn execute(settings: &Settings, names: &[String]) -> Result<()> {
    let publisher = TrampolinePublisher::from_settings(settings);

    for name in names {
        validate_executable_name(name)?;
    }

    for name in names {
        match publisher.unpublish(name)? {
            (false, false) => ui::warn(format!("{name} is not published")),
            (true, true) => ui::success("Removed", name),
            (config, _) => ui::success(
                "Removed",
                format!(
                    "{name} (no {} found)",
                    if config { "bin entry" } else { "trampoline config" }
                ),
            ),
        }
    }
    Ok(())
}
