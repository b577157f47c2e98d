use crate::cli::{Cli, Commands};
use crate::Settings;
use anyhow::Result;

mod apply;
mod check;
mod expose;
mod remove;
mod status;

pub fn execute(cli: Cli) -> Result<()> {
    crate::platform::ensure_supported()?;

    // Settings are read once here and passed down
    let settings = Settings::from_env()?;

    match cli.command {
        Commands::Expose(args) => expose::execute(settings, args),

        Commands::Apply { manifest } => apply::execute(settings, &manifest),

        Commands::Check { manifest } => check::execute(&manifest),

        Commands::Status => status::execute(&settings),

        Commands::Remove { names } => remove::execute(&settings, &names),
    }
}
