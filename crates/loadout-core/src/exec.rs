//! External command execution
//!
//! All mutating side effects go through the external `claude` CLI. The
//! `CommandRunner` trait is the seam that lets the apply engine and
//! doctor run against a fake in tests.

use std::process::Command;

use tracing::debug;

use loadout_registry::PluginKey;

use crate::error::{CoreError, CoreResult};

/// Captured output of one external command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    /// Whether the process exited successfully
    pub success: bool,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

impl CommandOutput {
    /// Merged output text used for outcome classification
    #[must_use]
    pub fn text(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() {
                text.push('\n');
            }
            text.push_str(&self.stderr);
        }
        text
    }

    /// The most useful error line: stderr, else stdout, else a fallback
    #[must_use]
    pub fn error_text(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        "Unknown error".to_string()
    }
}

/// Runs external commands
pub trait CommandRunner {
    /// Run a program to completion, capturing output
    ///
    /// # Errors
    /// Returns an error only when the program cannot be spawned; a
    /// non-zero exit is reported through `CommandOutput::success`.
    fn run(&self, program: &str, args: &[String]) -> CoreResult<CommandOutput>;
}

/// Runner backed by `std::process::Command`
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[String]) -> CoreResult<CommandOutput> {
        debug!(program, ?args, "running external command");
        let output = Command::new(program).args(args).output().map_err(|e| {
            CoreError::Spawn { program: program.to_string(), message: e.to_string() }
        })?;

        Ok(CommandOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

/// Argument building for the `claude` CLI
pub struct ClaudeCli<'a> {
    runner: &'a dyn CommandRunner,
    program: String,
}

impl<'a> ClaudeCli<'a> {
    /// Wrap a runner, targeting the `claude` binary
    #[must_use]
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self { runner, program: "claude".to_string() }
    }

    fn run(&self, args: Vec<String>) -> CoreResult<CommandOutput> {
        self.runner.run(&self.program, &args)
    }

    /// `claude plugin install <name@marketplace>`
    ///
    /// # Errors
    /// Returns an error if the CLI cannot be spawned.
    pub fn plugin_install(&self, key: &PluginKey) -> CoreResult<CommandOutput> {
        self.run(vec!["plugin".into(), "install".into(), key.to_string()])
    }

    /// `claude plugin uninstall <name>` (the CLI takes the bare name)
    ///
    /// # Errors
    /// Returns an error if the CLI cannot be spawned.
    pub fn plugin_uninstall(&self, key: &PluginKey) -> CoreResult<CommandOutput> {
        self.run(vec!["plugin".into(), "uninstall".into(), key.name.clone()])
    }

    /// `claude plugin marketplace add <owner/repo | url>`
    ///
    /// # Errors
    /// Returns an error if the CLI cannot be spawned.
    pub fn marketplace_add(&self, location: &str) -> CoreResult<CommandOutput> {
        self.run(vec![
            "plugin".into(),
            "marketplace".into(),
            "add".into(),
            location.to_string(),
        ])
    }

    /// `claude plugin marketplace update [name]`
    ///
    /// # Errors
    /// Returns an error if the CLI cannot be spawned.
    pub fn marketplace_update(&self, name: Option<&str>) -> CoreResult<CommandOutput> {
        let mut args = vec!["plugin".into(), "marketplace".into(), "update".into()];
        if let Some(name) = name {
            args.push(name.to_string());
        }
        self.run(args)
    }

    /// `claude mcp add <name> --env K=V ... -- <command> <args...>`
    ///
    /// # Errors
    /// Returns an error if the CLI cannot be spawned.
    pub fn mcp_add(
        &self,
        name: &str,
        command: &str,
        command_args: &[String],
        env: &[(String, String)],
    ) -> CoreResult<CommandOutput> {
        let mut args = vec!["mcp".into(), "add".into(), name.to_string()];
        for (key, value) in env {
            args.push("--env".into());
            args.push(format!("{key}={value}"));
        }
        args.push("--".into());
        args.push(command.to_string());
        args.extend(command_args.iter().cloned());
        self.run(args)
    }

    /// `claude mcp remove <name>`
    ///
    /// # Errors
    /// Returns an error if the CLI cannot be spawned.
    pub fn mcp_remove(&self, name: &str) -> CoreResult<CommandOutput> {
        self.run(vec!["mcp".into(), "remove".into(), name.to_string()])
    }

    /// `claude --version`, used as the doctor's reachability probe
    ///
    /// # Errors
    /// Returns an error if the CLI cannot be spawned.
    pub fn version(&self) -> CoreResult<CommandOutput> {
        self.run(vec!["--version".into()])
    }
}
