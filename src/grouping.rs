//! External feature-grouping tool invocation
//!
//! Feature selection itself is a black box: an external tool consumes a
//! ranking file and emits the chosen event identifiers, one per line on
//! standard output, terminated by a trailing empty line. Anything else —
//! non-zero exit, non-UTF-8 output, a missing terminator, an empty
//! selection — is a fatal integration error. Re-invocation with the same
//! inputs is deterministic, so nothing is retried.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::debug;

use crate::error::{Error, Result};

/// Wrapper around the external grouping executable.
#[derive(Debug, Clone)]
pub struct GroupingTool {
    program: PathBuf,
}

impl GroupingTool {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run `{program} mkgroup --input {ranking_file}` and return the selected
    /// event identifiers in emission order.
    pub fn select_events(&self, ranking_file: &Path) -> Result<Vec<String>> {
        debug!(
            "invoking {} mkgroup --input {}",
            self.program.display(),
            ranking_file.display()
        );
        let output = Command::new(&self.program)
            .arg("mkgroup")
            .arg("--input")
            .arg(ranking_file)
            .output()
            .map_err(|e| {
                Error::ExternalTool(format!("failed to launch {}: {e}", self.program.display()))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::ExternalTool(format!(
                "{} exited with {}: {}",
                self.program.display(),
                output.status,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| Error::ExternalTool("tool emitted non-UTF-8 output".to_string()))?;
        parse_selection(&stdout)
    }
}

/// Split the tool output into event identifiers, enforcing the expected
/// shape: one identifier per line, trailing empty line stripped.
fn parse_selection(stdout: &str) -> Result<Vec<String>> {
    let mut lines: Vec<&str> = stdout.split('\n').map(|l| l.trim_end_matches('\r')).collect();

    match lines.pop() {
        Some("") => {}
        _ => {
            return Err(Error::ExternalTool(
                "tool output is not terminated by a trailing empty line".to_string(),
            ))
        }
    }
    if lines.is_empty() {
        return Err(Error::ExternalTool("tool selected no events".to_string()));
    }
    if lines.iter().any(|l| l.is_empty()) {
        return Err(Error::ExternalTool(
            "tool output contains an empty event identifier".to_string(),
        ));
    }

    Ok(lines.into_iter().map(String::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_selection_strips_trailing_empty_line() {
        let events = parse_selection("E1\nE2\n").unwrap();
        assert_eq!(events, vec!["E1", "E2"]);
    }

    #[test]
    fn test_parse_selection_handles_crlf() {
        let events = parse_selection("E1\r\nE2\r\n").unwrap();
        assert_eq!(events, vec!["E1", "E2"]);
    }

    #[test]
    fn test_missing_terminator_is_fatal() {
        let err = parse_selection("E1\nE2").unwrap_err();
        assert!(matches!(err, Error::ExternalTool(_)));
    }

    #[test]
    fn test_empty_selection_is_fatal() {
        assert!(parse_selection("").is_err());
        assert!(parse_selection("\n").is_err());
    }

    #[test]
    fn test_blank_identifier_is_fatal() {
        let err = parse_selection("E1\n\nE2\n").unwrap_err();
        assert!(err.to_string().contains("empty event identifier"));
    }

    #[cfg(unix)]
    fn fake_tool(dir: &Path, script: &str) -> PathBuf {
        use std::os::unix::fs::PermissionsExt;
        let path = dir.join("fake-grouper");
        fs::write(&path, format!("#!/bin/sh\n{script}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[cfg(unix)]
    #[test]
    fn test_select_events_runs_subprocess() {
        let dir = tempfile::TempDir::new().unwrap();
        let tool = GroupingTool::new(fake_tool(dir.path(), "printf 'E_A\\nE_B\\n'"));
        let ranking = dir.path().join("ranking.csv");
        fs::write(&ranking, "").unwrap();
        assert_eq!(tool.select_events(&ranking).unwrap(), vec!["E_A", "E_B"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_fatal() {
        let dir = tempfile::TempDir::new().unwrap();
        let tool = GroupingTool::new(fake_tool(dir.path(), "echo boom >&2; exit 3"));
        let ranking = dir.path().join("ranking.csv");
        fs::write(&ranking, "").unwrap();
        let err = tool.select_events(&ranking).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn test_missing_program_is_external_tool_error() {
        let tool = GroupingTool::new("/nonexistent/grouper");
        let err = tool.select_events(Path::new("ranking.csv")).unwrap_err();
        assert!(matches!(err, Error::ExternalTool(_)));
    }
}
