//! Command execution utilities

use crate::utils::error::{InstallerError, Result};
use crate::utils::signal;
use std::process::{Command, ExitStatus, Output, Stdio};
use tracing::{debug, warn};

fn spawn_error(program: &str, e: std::io::Error) -> InstallerError {
    if e.kind() == std::io::ErrorKind::NotFound {
        InstallerError::CommandNotFound(program.to_string())
    } else {
        InstallerError::Io(e)
    }
}

/// Execute a command and return the captured output
pub fn run_command(program: &str, args: &[&str]) -> Result<Output> {
    debug!("Running: {} {}", program, args.join(" "));

    let output = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .map_err(|e| spawn_error(program, e))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        warn!(
            "Command failed: {} {}\n  stderr: {}",
            program,
            args.join(" "),
            stderr.trim()
        );
        return Err(InstallerError::CommandFailed {
            command: format!("{} {}", program, args.join(" ")),
            stderr,
        });
    }

    Ok(output)
}

/// Execute a command and return stdout as string
pub fn run_command_output(program: &str, args: &[&str]) -> Result<String> {
    let output = run_command(program, args)?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Execute a command attached to the operator's terminal.
///
/// The exit status is returned as-is; interpreting it is up to the caller.
pub fn run_attached(program: &str, args: &[&str]) -> Result<ExitStatus> {
    debug!("Running (attached): {} {}", program, args.join(" "));

    Command::new(program)
        .args(args)
        .status()
        .map_err(|e| spawn_error(program, e))
}

/// Check if a command exists in PATH
pub fn command_exists(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Log a command that would be run (for dry-run mode)
pub fn log_dry_run(program: &str, args: &[&str]) {
    println!("  [dry-run] {} {}", program, args.join(" "));
}

/// Wrapper for command execution that respects dry-run mode
pub struct CommandRunner {
    dry_run: bool,
}

impl CommandRunner {
    pub fn new(dry_run: bool) -> Self {
        Self { dry_run }
    }

    /// Run a command with inherited stdio and fail on a non-zero exit.
    pub fn run(&self, program: &str, args: &[&str]) -> Result<()> {
        signal::check()?;
        if self.dry_run {
            log_dry_run(program, args);
            return Ok(());
        }

        let status = run_attached(program, args)?;
        signal::check()?;
        if !status.success() {
            return Err(InstallerError::CommandFailed {
                command: format!("{} {}", program, args.join(" ")),
                stderr: format!("Exit code: {:?}", status.code()),
            });
        }
        Ok(())
    }

    /// Run a command with inherited stdio and hand back its exit status.
    ///
    /// Dry-run mode reports success without starting anything.
    pub fn status(&self, program: &str, args: &[&str]) -> Result<Option<ExitStatus>> {
        signal::check()?;
        if self.dry_run {
            log_dry_run(program, args);
            return Ok(None);
        }
        run_attached(program, args).map(Some)
    }

    /// Run a shell snippet inside the target root through `arch-chroot`
    pub fn run_in_chroot(&self, target_root: &str, command: &str) -> Result<()> {
        if self.dry_run {
            println!("  [dry-run] arch-chroot {} bash -c '{}'", target_root, command);
            return Ok(());
        }
        if !command_exists("arch-chroot") {
            return Err(InstallerError::MissingDependency(
                "arch-chroot (package arch-install-scripts)".to_string(),
            ));
        }
        self.run("arch-chroot", &[target_root, "bash", "-c", command])
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }
}
