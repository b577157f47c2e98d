use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Expose executables from remote pixi projects
///
/// expose-pixi-apps clones a pixi project, installs one of its environments
/// and publishes selected executables into $PIXI_HOME/bin through pixi's
/// trampoline binary, so they run with that environment activated without
/// entering it first.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Expose executables from one repository
    ///
    /// Every input can also be supplied through its INPUT_* environment
    /// variable, as GitHub Actions does for action inputs.
    Expose(ExposeArgs),

    /// Expose every entry of a TOML manifest, in order
    Apply {
        /// Manifest listing [[expose]] entries
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,
    },

    /// Validate a manifest without exposing anything
    Check {
        /// Manifest listing [[expose]] entries
        #[arg(value_name = "MANIFEST")]
        manifest: PathBuf,
    },

    /// List published trampolines
    ///
    /// Every record in $PIXI_HOME/bin/trampoline_configuration is listed,
    /// including those written by `pixi global install` for its own tools.
    Status,

    /// Remove published trampolines
    ///
    /// Records are matched by name only and cannot be told apart from the
    /// ones `pixi global install` writes, so removing a name that pixi
    /// installed globally unpublishes that tool too.
    Remove {
        /// Executable names to unpublish
        #[arg(value_name = "APP", required = true)]
        names: Vec<String>,
    },
}

#[derive(Args, Debug, Default)]
pub struct ExposeArgs {
    /// Git URL of the pixi project
    #[arg(long, env = "INPUT_GIT", value_name = "URL")]
    pub git: Option<String>,

    /// Branch or tag to check out (defaults to the remote's default branch)
    #[arg(long = "ref", env = "INPUT_REF", value_name = "REF")]
    pub reference: Option<String>,

    /// Pixi environment to activate
    #[arg(short, long, env = "INPUT_ENVIRONMENT", value_name = "ENV")]
    pub environment: Option<String>,

    /// YAML list of executables to expose, e.g. "[rg, fd]"
    #[arg(long, env = "INPUT_APPS", value_name = "YAML", allow_hyphen_values = true)]
    pub apps: Option<String>,

    /// YAML list of extra environment variables to leave out
    #[arg(
        long,
        env = "INPUT_EXCLUDE_ENV_VARS",
        value_name = "YAML",
        allow_hyphen_values = true
    )]
    pub exclude_env_vars: Option<String>,
}
