//! Error types for the LishaLinux installer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum InstallerError {
    #[error("This installer must be run as root (or with sudo)")]
    NotRoot,

    #[error("Missing dependency: {0}")]
    MissingDependency(String),

    #[error("Disk too small: root partition would be {root_mib}MiB < required minimum {required_mib}MiB (disk needs at least {min_disk_mib}MiB)")]
    DiskTooSmall {
        root_mib: u64,
        required_mib: u64,
        min_disk_mib: u64,
    },

    #[error("Command failed: {command}\n{stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("Command not found: {0}")]
    CommandNotFound(String),

    #[error("Installer exited with {}", exit_description(.code))]
    InstallerFailed { code: Option<i32> },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("User cancelled operation")]
    UserCancelled,

    #[error("Installation cancelled by user")]
    Interrupted,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, InstallerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_installer_failed_message() {
        let err = InstallerError::InstallerFailed { code: Some(1) };
        assert_eq!(err.to_string(), "Installer exited with exit code 1");

        let err = InstallerError::InstallerFailed { code: None };
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_disk_too_small_message() {
        let err = InstallerError::DiskTooSmall {
            root_mib: 4096,
            required_mib: 10240,
            min_disk_mib: 11266,
        };
        let msg = err.to_string();
        assert!(msg.contains("4096MiB < required minimum 10240MiB"));
        assert!(msg.contains("at least 11266MiB"));
    }
}
