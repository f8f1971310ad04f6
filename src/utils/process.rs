//! External tool invocation.
//!
//! Every subprocess this tool starts (git, the Qt compilers, Nuitka, pip)
//! goes through a [`ToolRunner`], so the build pipeline can be exercised
//! against a scripted runner in tests.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A single external command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Invocation {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
            cwd: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    /// Program name as shown in diagnostics.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        if let Some(dir) = &self.cwd {
            command.current_dir(dir);
        }
        command
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Errors from running an external tool.
#[derive(Debug)]
pub enum ToolError {
    /// The program is not installed or not on PATH.
    NotFound { program: String },
    /// The program ran and exited unsuccessfully.
    Failed {
        program: String,
        code: Option<i32>,
        stderr: String,
    },
    /// Spawning or waiting on the program failed.
    Io { program: String, source: io::Error },
}

impl ToolError {
    /// Exit code of the failed tool, if it exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ToolError::Failed { code, .. } => *code,
            _ => None,
        }
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolError::NotFound { program } => write!(f, "{} is not installed", program),
            ToolError::Failed {
                program,
                code,
                stderr,
            } => {
                match code {
                    Some(code) => write!(f, "{} failed (exit code {})", program, code)?,
                    None => write!(f, "{} terminated by signal", program)?,
                }
                let stderr = stderr.trim();
                if !stderr.is_empty() {
                    write!(f, ": {}", stderr)?;
                }
                Ok(())
            }
            ToolError::Io { program, source } => {
                write!(f, "failed to run {}: {}", program, source)
            }
        }
    }
}

impl std::error::Error for ToolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ToolError::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Runs external tools to completion, one at a time.
pub trait ToolRunner {
    /// Run with inherited stdio and wait for it to exit.
    fn status(&self, invocation: &Invocation) -> Result<(), ToolError>;

    /// Run with captured output and return stdout on success.
    fn capture(&self, invocation: &Invocation) -> Result<String, ToolError>;
}

/// Runs tools as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

fn spawn_error(invocation: &Invocation, source: io::Error) -> ToolError {
    let program = invocation.program_name();
    if source.kind() == io::ErrorKind::NotFound {
        ToolError::NotFound { program }
    } else {
        ToolError::Io { program, source }
    }
}

impl ToolRunner for SystemRunner {
    fn status(&self, invocation: &Invocation) -> Result<(), ToolError> {
        log::debug!("Running: {}", invocation);
        let status = invocation
            .to_command()
            .status()
            .map_err(|e| spawn_error(invocation, e))?;
        if status.success() {
            Ok(())
        } else {
            Err(ToolError::Failed {
                program: invocation.program_name(),
                code: status.code(),
                stderr: String::new(),
            })
        }
    }

    fn capture(&self, invocation: &Invocation) -> Result<String, ToolError> {
        log::debug!("Running: {}", invocation);
        let output = invocation
            .to_command()
            .stdin(Stdio::null())
            .output()
            .map_err(|e| spawn_error(invocation, e))?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(ToolError::Failed {
                program: invocation.program_name(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }
}
