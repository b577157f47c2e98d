use anyhow::{Context, Result};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::error::ExposeError;

/// Resolve `name` on the current PATH.
pub fn find_tool(name: &str) -> Result<PathBuf, ExposeError> {
    which::which(name).map_err(|_| ExposeError::ToolNotFound {
        tool: name.to_string(),
    })
}

/// Run `command` to completion, failing if it exits non-zero.
///
/// Stdout and stderr are captured; stderr is carried in the error.
pub fn run(tool: &str, command: &mut Command) -> Result<Output> {
    let rendered = describe(command);
    tracing::debug!(command = %rendered, "running");

    let output = command
        .output()
        .with_context(|| format!("Failed to execute `{rendered}`"))?;

    if !output.status.success() {
        return Err(ExposeError::ExternalProcess {
            tool: tool.to_string(),
            command: rendered,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        }
        .into());
    }

    Ok(output)
}

fn describe(command: &Command) -> String {
    let program = display_program(command.get_program());
    let args: Vec<String> = command
        .get_args()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    if args.is_empty() {
        program
    } else {
        format!("{program} {}", args.join(" "))
    }
}

fn display_program(program: &OsStr) -> String {
    Path::new(program)
        .file_name()
        .unwrap_or(program)
        .to_string_lossy()
        .into_owned()
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_find_tool_missing() {
        let err = find_tool("definitely-not-a-real-tool-name").unwrap_err();
        assert!(matches!(err, ExposeError::ToolNotFound { ref tool } if tool == "definitely-not-a-real-tool-name"));
    }

    #[test]
    fn test_run_success_captures_stdout() {
        let output = run("sh", Command::new("sh").args(["-c", "echo hello"])).unwrap();
        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "hello");
    }

    #[test]
    fn test_run_failure_is_external_process_error() {
        let err = run("sh", Command::new("sh").args(["-c", "echo boom >&2; exit 3"])).unwrap_err();
        match err.downcast_ref::<ExposeError>() {
            Some(ExposeError::ExternalProcess {
                tool,
                status,
                stderr,
                ..
            }) => {
                assert_eq!(tool, "sh");
                assert_eq!(status.code(), Some(3));
                assert_eq!(stderr.trim(), "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_describe_uses_file_name() {
        let mut command = Command::new("/usr/local/bin/pixi");
        command.args(["install", "-e", "docs"]);
        assert_eq!(describe(&command), "pixi install -e docs");
    }
}
