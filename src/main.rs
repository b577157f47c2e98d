use clap::Parser;
use expose_pixi_apps::cli::Cli;
use expose_pixi_apps::{commands, ui};
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing
    let default_filter = if cli.verbose {
        "expose_pixi_apps=debug,info"
    } else {
        "expose_pixi_apps=info,warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    // Execute command
    match commands::execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ui::error(format!("{err:#}"));
            ui::annotate_error(format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
