use crate::core::environment::gromacs::GromacsEnv;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;
use tracing::{debug, info};

/// Number of trailing output lines carried in a failure error.
const FAILURE_TAIL_LINES: usize = 20;

/// An external command to run: program, arguments and optional working
/// directory, built with explicit arguments rather than a shell string.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn argv(&self) -> &[String] {
        &self.args
    }

    pub fn cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Captured output of a completed command, stderr merged into stdout.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub output: String,
}

/// Executes external commands under a given toolchain environment.
///
/// The seam between the pipeline and the operating system: production code
/// uses [`GmxRunner`], tests substitute a double that fabricates outputs.
pub trait CommandRunner {
    /// Runs `spec` to completion with exactly the variables of `env`.
    ///
    /// When `capture` is given, the combined output is also written there —
    /// on failure as well as success, so a failed command leaves its log
    /// behind for inspection.
    fn run(
        &self,
        spec: &CommandSpec,
        env: &GromacsEnv,
        capture: Option<&Path>,
    ) -> Result<CommandOutput, ProcessError>;
}

/// Blocking subprocess runner. No timeout: toolchain commands legitimately
/// run for hours, and cancellation mid-step is not supported.
#[derive(Debug, Default)]
pub struct GmxRunner;

impl CommandRunner for GmxRunner {
    fn run(
        &self,
        spec: &CommandSpec,
        env: &GromacsEnv,
        capture: Option<&Path>,
    ) -> Result<CommandOutput, ProcessError> {
        info!("Running: {}", spec);

        let mut command = Command::new(spec.program());
        command
            .args(spec.argv())
            .env_clear()
            .envs(env.vars())
            .stdin(Stdio::null());
        if let Some(dir) = spec.cwd() {
            command.current_dir(dir);
        }

        let result = command.output().map_err(|e| ProcessError::Spawn {
            program: spec.program().to_string(),
            source: e,
        })?;

        let mut output = String::from_utf8_lossy(&result.stdout).into_owned();
        output.push_str(&String::from_utf8_lossy(&result.stderr));

        if let Some(path) = capture {
            fs::write(path, &output).map_err(|e| ProcessError::Capture {
                path: path.to_path_buf(),
                source: e,
            })?;
            debug!("Command output captured to {:?}", path);
        }

        if !result.status.success() {
            return Err(ProcessError::CommandFailed {
                command: spec.to_string(),
                code: result.status.code(),
                tail: tail_of(&output),
            });
        }
        Ok(CommandOutput { output })
    }
}

fn tail_of(output: &str) -> String {
    let lines: Vec<&str> = output.lines().collect();
    let start = lines.len().saturating_sub(FAILURE_TAIL_LINES);
    lines[start..].join("\n")
}

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("Could not spawn '{program}': {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("Could not capture output to '{path}': {source}", path = path.display())]
    Capture {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Command `{command}` failed with status {code:?}:\n{tail}")]
    CommandFailed {
        command: String,
        code: Option<i32>,
        tail: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn shell_env() -> GromacsEnv {
        // PATH so the shell can find coreutils; everything else is empty.
        GromacsEnv::resolve(&crate::core::environment::gromacs::EnvSpec::default()).unwrap()
    }

    #[test]
    fn command_spec_renders_as_a_command_line() {
        let spec = CommandSpec::new("gmx")
            .arg("pdb2gmx")
            .args(["-f", "protein.pdb"])
            .arg("-ignh");
        assert_eq!(spec.to_string(), "gmx pdb2gmx -f protein.pdb -ignh");
    }

    #[test]
    fn runner_captures_stdout_and_stderr_to_file() {
        let dir = tempdir().unwrap();
        let capture = dir.path().join("step.out");

        let spec = CommandSpec::new("/bin/sh")
            .arg("-c")
            .arg("echo to-stdout; echo to-stderr 1>&2");
        let result = GmxRunner.run(&spec, &shell_env(), Some(&capture)).unwrap();

        assert!(result.output.contains("to-stdout"));
        assert!(result.output.contains("to-stderr"));

        let captured = fs::read_to_string(&capture).unwrap();
        assert!(captured.contains("to-stdout"));
        assert!(captured.contains("to-stderr"));
    }

    #[test]
    fn failing_command_reports_status_and_keeps_capture() {
        let dir = tempdir().unwrap();
        let capture = dir.path().join("step.out");

        let spec = CommandSpec::new("/bin/sh")
            .arg("-c")
            .arg("echo diagnostics; exit 3");
        let result = GmxRunner.run(&spec, &shell_env(), Some(&capture));

        match result {
            Err(ProcessError::CommandFailed { code, tail, .. }) => {
                assert_eq!(code, Some(3));
                assert!(tail.contains("diagnostics"));
            }
            other => panic!("expected CommandFailed, got {:?}", other.map(|_| ())),
        }
        assert!(fs::read_to_string(&capture).unwrap().contains("diagnostics"));
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let spec = CommandSpec::new("/nonexistent/program");
        let result = GmxRunner.run(&spec, &shell_env(), None);
        assert!(matches!(result, Err(ProcessError::Spawn { .. })));
    }

    #[test]
    fn commands_run_in_the_requested_directory() {
        let dir = tempdir().unwrap();
        let spec = CommandSpec::new("/bin/sh")
            .arg("-c")
            .arg("pwd")
            .current_dir(dir.path());
        let result = GmxRunner.run(&spec, &shell_env(), None).unwrap();
        assert!(result.output.trim_end().ends_with(
            dir.path()
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap()
        ));
    }
}
