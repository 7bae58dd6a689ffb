//! Running the commands of a rule.

use std::path::PathBuf;
use std::process::Command;

use fab_cfg::ConfigSet;

use crate::cfgs::SHELL;
use crate::error::BuildError;
use crate::pattern::{TARGET, substitute};

/// Executes a single command line, synchronously.
pub trait Runner {
    /// Run `command` to completion.
    ///
    /// # Errors
    ///
    /// * [`BuildError::CommandFailed`] if the command exits unsuccessfully.
    fn run(&self, command: &str) -> Result<(), BuildError>;
}

impl<T: Runner + ?Sized> Runner for &T {
    fn run(&self, command: &str) -> Result<(), BuildError> {
        (**self).run(command)
    }
}

/// Fill in a command template for the target `name`.
///
/// The wildcard becomes `capture` (and is left alone for literal rules), the target placeholder
/// becomes `name`. No shell quoting is applied.
pub fn expand_command(template: &str, name: &str, capture: Option<&str>) -> String {
    substitute(template, capture).replace(TARGET, name)
}

/// Runs commands with `<shell> -c <command>`, inheriting stdio.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
    current_dir: Option<PathBuf>,
}

impl Default for ShellRunner {
    fn default() -> Self {
        ShellRunner::new("/bin/sh")
    }
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        ShellRunner {
            shell: shell.into(),
            current_dir: None,
        }
    }

    /// A [`ShellRunner`] using the shell from `configs`.
    pub fn from_configs(configs: &ConfigSet) -> Self {
        ShellRunner::new(SHELL.read(configs).as_str())
    }

    /// Run commands from within `dir`.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }
}

impl Runner for ShellRunner {
    fn run(&self, command: &str) -> Result<(), BuildError> {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(command);
        if let Some(dir) = &self.current_dir {
            cmd.current_dir(dir);
        }

        tracing::trace!(shell = %self.shell, %command, "spawning");
        let status = cmd.status().map_err(|source| BuildError::Spawn {
            command: command.to_string(),
            source,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(BuildError::CommandFailed {
                command: command.to_string(),
                code: status.code(),
            })
        }
    }
}
