use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub encoding: String,
    /// Debug runs echo output to the log and report stdout on failure.
    pub debug: bool,
}

impl RunOptions {
    pub fn silent(&self) -> bool {
        !self.debug
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Maps a non-zero exit to [`Error::CommandExecution`]. Stdout is only
    /// carried along in debug mode.
    pub fn into_result(self, command: &str, debug: bool) -> Result<(), Error> {
        if self.success() {
            return Ok(());
        }
        Err(Error::CommandExecution {
            command: command.to_string(),
            code: self.code,
            stderr: self.stderr,
            stdout: debug.then_some(self.stdout),
        })
    }
}

/// Executes a resolved command line.
#[async_trait]
pub trait Runner: Send + Sync {
    async fn run(&self, label: &str, command: &str, options: &RunOptions)
        -> Result<RunOutput, Error>;
}

/// Runs commands through the platform shell.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl ShellRunner {
    fn shell_command(command: &str) -> Command {
        let (shell, flag) = if cfg!(windows) { ("cmd", "/C") } else { ("sh", "-c") };
        let mut cmd = Command::new(shell);
        cmd.arg(flag).arg(command);
        cmd
    }
}

#[async_trait]
impl Runner for ShellRunner {
    async fn run(
        &self,
        label: &str,
        command: &str,
        options: &RunOptions,
    ) -> Result<RunOutput, Error> {
        tracing::info!(%label, %command, "running command");
        let out = Self::shell_command(command)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| Error::Spawn {
                command: command.to_string(),
                source,
            })?;

        let output = RunOutput {
            code: out.status.code(),
            stdout: decode(&out.stdout, &options.encoding),
            stderr: decode(&out.stderr, &options.encoding),
        };

        if !options.silent() {
            tracing::debug!(%label, stdout = %output.stdout, stderr = %output.stderr, "command output");
        }
        tracing::info!(%label, code = ?output.code, "command finished");
        Ok(output)
    }
}

/// Decodes process output using one of the supported encoding names.
pub fn decode(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_ascii_lowercase().as_str() {
        "utf8" | "utf-8" => String::from_utf8_lossy(bytes).into_owned(),
        "latin1" | "binary" | "iso-8859-1" => bytes.iter().map(|&b| char::from(b)).collect(),
        "ascii" => bytes.iter().map(|&b| char::from(b & 0x7f)).collect(),
        other => {
            tracing::warn!(encoding = other, "unsupported encoding, decoding as utf8");
            String::from_utf8_lossy(bytes).into_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(debug: bool) -> RunOptions {
        RunOptions {
            encoding: "utf8".to_string(),
            debug,
        }
    }

    #[test]
    fn decode_variants() {
        assert_eq!(decode("héllo".as_bytes(), "utf8"), "héllo");
        assert_eq!(decode(&[0x68, 0xe9], "latin1"), "hé");
        assert_eq!(decode(&[0x68, 0xe9], "ascii"), "hi");
        assert_eq!(decode(b"ok", "klingon"), "ok");
    }

    #[test]
    fn failure_carries_stdout_only_in_debug() {
        let out = RunOutput {
            code: Some(2),
            stdout: "out".to_string(),
            stderr: "err".to_string(),
        };
        match out.clone().into_result("false", false).unwrap_err() {
            Error::CommandExecution { stdout, code, .. } => {
                assert_eq!(stdout, None);
                assert_eq!(code, Some(2));
            }
            other => panic!("unexpected {other:?}"),
        }
        match out.into_result("false", true).unwrap_err() {
            Error::CommandExecution { stdout, .. } => assert_eq!(stdout.as_deref(), Some("out")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn execution_error_message() {
        let err = RunOutput {
            code: Some(1),
            stdout: String::new(),
            stderr: "boom".to_string(),
        }
        .into_result("do-it", false)
        .unwrap_err();
        assert_eq!(err.to_string(), "Command:  do-it\nReturn Code:  1\nError:  boom");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_runner_reports_exit_code_and_streams() {
        let out = ShellRunner
            .run("t", "echo hello; echo oops 1>&2; exit 3", &opts(false))
            .await
            .unwrap();
        assert_eq!(out.code, Some(3));
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.stderr, "oops\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn shell_runner_success() {
        let out = ShellRunner.run("t", "true", &opts(true)).await.unwrap();
        assert!(out.success());
    }
}
