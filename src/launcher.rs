//! Bringing the target application to the foreground.
//!
//! Launching is a synchronous, single attempt: the configured command runs to completion
//! and its exit status decides the outcome. A non-zero exit means the target could not be
//! foregrounded and is reported as [`LaunchError::NotFound`], so the controller can stop
//! the run with a clear status. Nothing here retries.

use std::io;
use std::process::{Command, Stdio};

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::LaunchCommand;

/// Why the target application could not be launched.
#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("target application `{target}` could not be found or launched")]
    NotFound { target: String },

    #[error("failed to spawn `{program}`")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
}

/// Capability that asks the platform to foreground an application.
pub trait AppLauncher: Send + Sync {
    fn launch(&self, target: &str) -> Result<(), LaunchError>;
}

/// Launches the target by spawning a configured program.
///
/// Without a configured program the target is expected to be started by someone else
/// and launching trivially succeeds.
#[derive(Debug, Clone)]
pub struct CommandLauncher {
    command: Option<LaunchCommand>,
    dry_run: bool,
}

impl CommandLauncher {
    #[must_use]
    pub fn new(command: Option<LaunchCommand>, dry_run: bool) -> Self {
        Self { command, dry_run }
    }

    /// Arguments with `{target}` substituted.
    fn args_for(command: &LaunchCommand, target: &str) -> Vec<String> {
        command
            .args
            .iter()
            .map(|arg| arg.replace("{target}", target))
            .collect()
    }
}

impl AppLauncher for CommandLauncher {
    fn launch(&self, target: &str) -> Result<(), LaunchError> {
        let Some(command) = &self.command else {
            debug!(
                target: "autoswipe::launcher",
                %target,
                "No launch command configured; assuming the target is started externally"
            );
            return Ok(());
        };

        let args = Self::args_for(command, target);
        if self.dry_run {
            info!(
                target: "autoswipe::launcher",
                program = %command.program, ?args,
                "DRY-RUN launch"
            );
            return Ok(());
        }

        let output = Command::new(&command.program)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| LaunchError::Spawn {
                program: command.program.clone(),
                source,
            })?;

        if output.status.success() {
            info!(
                target: "autoswipe::launcher",
                program = %command.program, %target,
                "Launched target application"
            );
            return Ok(());
        }

        warn!(
            target: "autoswipe::launcher",
            program = %command.program, %target,
            status = %output.status,
            stderr = %String::from_utf8_lossy(&output.stderr).trim(),
            "Launch command failed"
        );
        Err(LaunchError::NotFound {
            target: target.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(program: &str, args: &[&str]) -> LaunchCommand {
        LaunchCommand {
            program: program.into(),
            args: args.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    #[test]
    fn target_placeholder_is_substituted() {
        let cmd = command("adb", &["shell", "monkey", "-p", "{target}", "1"]);
        assert_eq!(
            CommandLauncher::args_for(&cmd, "com.example.app"),
            vec!["shell", "monkey", "-p", "com.example.app", "1"]
        );
    }

    #[test]
    fn no_command_always_succeeds() {
        let launcher = CommandLauncher::new(None, false);
        assert!(launcher.launch("com.example.app").is_ok());
    }

    #[test]
    fn dry_run_never_spawns() {
        let launcher = CommandLauncher::new(
            Some(command("definitely-not-an-installed-program-7f3a", &[])),
            true,
        );
        assert!(launcher.launch("com.example.app").is_ok());
    }

    #[test]
    fn missing_program_fails_to_spawn() {
        let launcher = CommandLauncher::new(
            Some(command("definitely-not-an-installed-program-7f3a", &["{target}"])),
            false,
        );
        match launcher.launch("com.example.app") {
            Err(LaunchError::Spawn { program, source }) => {
                assert_eq!(program, "definitely-not-an-installed-program-7f3a");
                assert_eq!(source.kind(), io::ErrorKind::NotFound);
            }
            other => panic!("expected Spawn, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn failing_command_means_target_not_found() {
        let launcher = CommandLauncher::new(Some(command("false", &["{target}"])), false);
        match launcher.launch("com.not.installed") {
            Err(LaunchError::NotFound { target }) => assert_eq!(target, "com.not.installed"),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn successful_command_launches() {
        let launcher = CommandLauncher::new(Some(command("true", &["{target}"])), false);
        assert!(launcher.launch("com.example.app").is_ok());
    }
}
