use std::fmt;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;

use crate::error::{Chainable, Result};

/// An external program invocation that fails unless the program exits
/// successfully.
#[derive(Debug, Clone)]
pub struct Command {
    program: OsString,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
}

impl Command {
    pub fn new<S: AsRef<OsStr>>(program: S) -> Self {
        Command { program: program.as_ref().into(), args: vec![], cwd: None }
    }

    pub fn arg<S: AsRef<OsStr>>(mut self, arg: S) -> Self {
        self.args.push(arg.as_ref().into());
        self
    }

    pub fn args<I>(mut self, args: I) -> Self
        where I: IntoIterator, I::Item: AsRef<OsStr>
    {
        self.args.extend(args.into_iter().map(|a| a.as_ref().into()));
        self
    }

    pub fn current_dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.as_ref().into());
        self
    }

    /// Runs the program to completion and returns what it wrote to stdout.
    pub async fn output(&self) -> Result<Vec<u8>> {
        tracing::debug!(command = %self, "running");

        let mut command = tokio::process::Command::new(&self.program);
        command.args(&self.args)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        if let Some(cwd) = &self.cwd {
            command.current_dir(cwd);
        }

        let output = command.output().await.chain_with(|| error! {
            "failed to start external program",
            "command" => self,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return err! {
                "external program failed",
                "command" => self,
                "status" => output.status,
                "stderr" => stderr.trim(),
            };
        }

        Ok(output.stdout)
    }

    /// Runs the program to completion, discarding its output.
    pub async fn run(&self) -> Result<()> {
        self.output().await.map(|_| ())
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }

        Ok(())
    }
}
