use std::process::ExitStatus;

/// Failures that abort an exposure request.
///
/// Filesystem errors are not listed here; they travel as `anyhow` errors with
/// the offending path attached. Every variant is fatal for the current entry.
#[derive(Debug, thiserror::Error)]
pub enum ExposeError {
    #[error("invalid '{field}' input: {message}")]
    Validation { field: &'static str, message: String },

    #[error("{tool} not found in PATH. Run setup-pixi before this action.")]
    ToolNotFound { tool: String },

    #[error("`{command}` failed ({status}){}", format_stderr(.stderr))]
    ExternalProcess {
        tool: String,
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("{variable} not found in shell-hook output for environment '{environment}'")]
    MissingExpectedOutput {
        variable: String,
        environment: String,
    },

    #[error("expose-pixi-apps is not supported on {platform}")]
    PlatformUnsupported { platform: String },
}

impl ExposeError {
    pub(crate) fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(": {trimmed}")
    }
}
