//! Command specs and captured results.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a command is handed to the operating system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Invocation {
    /// Program plus argument vector; no shell interpretation.
    Argv { program: String, args: Vec<String> },
    /// A single line interpreted by the platform shell.
    Shell(String),
}

/// A command to run, in either argument-vector or shell form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub invocation: Invocation,
}

impl CommandSpec {
    pub fn argv<P, I, S>(program: P, args: I) -> Self
    where
        P: Into<String>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            invocation: Invocation::Argv {
                program: program.into(),
                args: args.into_iter().map(Into::into).collect(),
            },
        }
    }

    pub fn shell(line: impl Into<String>) -> Self {
        Self {
            invocation: Invocation::Shell(line.into()),
        }
    }

    /// Arguments of an argv-form command (empty for shell form).
    pub fn args(&self) -> &[String] {
        match &self.invocation {
            Invocation::Argv { args, .. } => args,
            Invocation::Shell(_) => &[],
        }
    }

    /// Value following `flag` in an argv-form command, if present.
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        let args = self.args();
        args.iter()
            .position(|a| a == flag)
            .and_then(|i| args.get(i + 1))
            .map(String::as_str)
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.invocation {
            Invocation::Argv { program, args } => {
                write!(f, "{}", program)?;
                for arg in args {
                    if arg.is_empty() || arg.contains(char::is_whitespace) {
                        write!(f, " '{}'", arg)?;
                    } else {
                        write!(f, " {}", arg)?;
                    }
                }
                Ok(())
            }
            Invocation::Shell(line) => f.write_str(line),
        }
    }
}

/// Captured output of one command invocation. Output is trimmed of surrounding whitespace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandResult {
    pub fn new(stdout: impl Into<String>, stderr: impl Into<String>, exit_code: i32) -> Self {
        Self {
            stdout: stdout.into().trim().to_string(),
            stderr: stderr.into().trim().to_string(),
            exit_code,
        }
    }

    pub fn success(stdout: impl Into<String>) -> Self {
        Self::new(stdout, "", 0)
    }

    pub fn failure(stderr: impl Into<String>, exit_code: i32) -> Self {
        Self::new("", stderr, exit_code)
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Stderr text, or a generic description when the command failed silently.
    pub fn error_text(&self) -> String {
        if self.stderr.is_empty() {
            format!("exit code {}", self.exit_code)
        } else {
            self.stderr.clone()
        }
    }
}
