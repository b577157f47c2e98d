use crate::{ui, Settings, TrampolineConfig, TrampolinePublisher};
use anyhow::Result;

pub fn execute(settings: &Settings) -> Result<()> {
    let publisher = TrampolinePublisher::from_settings(settings);

    let names = publisher.published_names()?;
    if names.is_empty() {
        ui::info(format!(
            "No trampolines published in {}.",
            publisher.bin_dir().display()
        ));
        return Ok(());
    }

    for name in names {
        let config = match TrampolineConfig::load(&publisher.config_path(&name)) {
            Ok(config) => config,
            Err(err) => {
                ui::warn(format!("{name}: {err:#}"));
                continue;
            }
        };

        let target = config.executable_path.display();
        match (config.executable_path.exists(), publisher.is_linked(&name)) {
            (true, true) => ui::success("Exposed", format!("{name} -> {target}")),
            (false, _) => ui::warn(format!("{name} -> {target} (executable missing)")),
            (true, false) => ui::warn(format!("{name} -> {target} (not linked to trampoline)")),
        }
    }
    Ok(())
}
