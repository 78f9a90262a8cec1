//! Post-install stage run inside the freshly installed system

use crate::config::{PostInstall, UserInput};
use crate::resources::{render_companion_hook, HOOK_FILE_NAME};
use crate::utils::command::CommandRunner;
use crate::utils::error::{InstallerError, Result};
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Script ready to be executed through `arch-chroot`
#[derive(Debug, Clone, PartialEq)]
pub struct StagedScript {
    /// Location on the live system
    pub host_path: PathBuf,
    /// Same file as seen from inside the chroot
    pub chroot_path: String,
}

impl StagedScript {
    /// Delete the staged copy; a failure is logged and otherwise ignored
    pub fn remove(&self) {
        if let Err(e) = fs::remove_file(&self.host_path) {
            warn!(
                "Could not remove staged script {}: {}",
                self.host_path.display(),
                e
            );
        }
    }
}

/// Where a script is placed inside the target root
fn stage_location(target_root: &str, file_name: &str) -> StagedScript {
    StagedScript {
        host_path: Path::new(target_root).join("root").join(file_name),
        chroot_path: format!("/root/{}", file_name),
    }
}

fn make_executable(path: &Path) -> Result<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))?;
    Ok(())
}

/// Write the companion hook into `<target_root>/root/`
pub fn stage_companion_hook(
    target_root: &str,
    user: &str,
    repo: &str,
    script: &str,
) -> Result<StagedScript> {
    let staged = stage_location(target_root, HOOK_FILE_NAME);
    if let Some(parent) = staged.host_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&staged.host_path, render_companion_hook(user, repo, script))?;
    make_executable(&staged.host_path)?;
    Ok(staged)
}

/// Resolve the operator-supplied chroot stage script named by `env`.
///
/// `lookup` reads environment variables; the binary passes `std::env::var`.
pub fn resolve_chroot_stage<F>(env: &str, lookup: F) -> Result<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(env).filter(|v| !v.trim().is_empty()).ok_or_else(|| {
        InstallerError::MissingDependency(format!(
            "environment variable {} must point to the chroot stage script",
            env
        ))
    })?;

    let path = PathBuf::from(value);
    if !path.is_file() {
        return Err(InstallerError::MissingDependency(format!(
            "chroot stage script not found: {}",
            path.display()
        )));
    }
    Ok(path)
}

/// Copy the chroot stage script into `<target_root>/root/`
pub fn stage_chroot_script(target_root: &str, source: &Path) -> Result<StagedScript> {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| {
            InstallerError::MissingDependency(format!(
                "chroot stage script has no file name: {}",
                source.display()
            ))
        })?;

    let staged = stage_location(target_root, &file_name);
    if let Some(parent) = staged.host_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(source, &staged.host_path)?;
    make_executable(&staged.host_path)?;
    Ok(staged)
}

/// Check that the post-install inputs exist before anything touches the disk
pub fn preflight<F>(post_install: &PostInstall, lookup: F) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    if let PostInstall::ChrootStage { env } = post_install {
        resolve_chroot_stage(env, lookup)?;
    }
    Ok(())
}

/// Run the configured post-install stage
pub fn run_post_install<F>(
    cmd: &CommandRunner,
    post_install: &PostInstall,
    input: &UserInput,
    target_root: &str,
    lookup: F,
) -> Result<()>
where
    F: Fn(&str) -> Option<String>,
{
    let staged = match post_install {
        PostInstall::None => {
            info!("No post-install stage configured");
            return Ok(());
        }
        PostInstall::Companion { repo, script } => {
            info!("Installing LishaLinux user environment from {}", repo);
            if cmd.is_dry_run() {
                println!(
                    "  [dry-run] Would clone {} and run {} as {}",
                    repo, script, input.username
                );
                return Ok(());
            }
            stage_companion_hook(target_root, &input.username, repo, script)?
        }
        PostInstall::ChrootStage { env } => {
            let source = resolve_chroot_stage(env, lookup)?;
            info!("Running chroot stage script {}", source.display());
            if cmd.is_dry_run() {
                println!(
                    "  [dry-run] Would copy {} into {}/root and run it",
                    source.display(),
                    target_root
                );
                return Ok(());
            }
            stage_chroot_script(target_root, &source)?
        }
    };

    let result = cmd.run_in_chroot(target_root, &format!("bash {}", staged.chroot_path));
    staged.remove();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_input() -> UserInput {
        UserInput {
            disk: "/dev/sda".to_string(),
            hostname: "lishalinux".to_string(),
            username: "alice".to_string(),
            root_password: "r".to_string(),
            user_password: "u".to_string(),
            sudo: true,
            timezone: None,
        }
    }

    #[test]
    fn test_stage_companion_hook() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let staged = stage_companion_hook(root, "alice", "https://example.org/r", "install.sh").unwrap();

        assert_eq!(staged.chroot_path, "/root/lishalinux_post_install.sh");
        assert_eq!(staged.host_path, dir.path().join("root/lishalinux_post_install.sh"));
        let content = fs::read_to_string(&staged.host_path).unwrap();
        assert!(content.contains("git clone 'https://example.org/r'"));
        let mode = fs::metadata(&staged.host_path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }

    #[test]
    fn test_staged_script_remove() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().to_str().unwrap();
        let staged = stage_companion_hook(root, "alice", "https://example.org/r", "install.sh").unwrap();

        staged.remove();
        assert!(!staged.host_path.exists());
        // Already gone: only logged
        staged.remove();
    }

    #[test]
    fn test_missing_env_var_is_missing_dependency() {
        let err = resolve_chroot_stage("LISHALINUX_CHROOT_STAGE", |_| None).unwrap_err();
        assert!(matches!(err, InstallerError::MissingDependency(_)));
        assert!(err.to_string().contains("LISHALINUX_CHROOT_STAGE"));

        let err = resolve_chroot_stage("STAGE", |_| Some("  ".to_string())).unwrap_err();
        assert!(matches!(err, InstallerError::MissingDependency(_)));
    }

    #[test]
    fn test_missing_script_is_missing_dependency() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.sh").to_string_lossy().to_string();
        let err = resolve_chroot_stage("STAGE", |_| Some(missing.clone())).unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_stage_chroot_script_copies_file() {
        let src_dir = tempfile::tempdir().unwrap();
        let source = src_dir.path().join("chroot-stage.sh");
        fs::write(&source, "#!/bin/bash\necho stage\n").unwrap();

        let resolved = resolve_chroot_stage("STAGE", |name| {
            assert_eq!(name, "STAGE");
            Some(source.to_string_lossy().to_string())
        })
        .unwrap();
        assert_eq!(resolved, source);

        let target = tempfile::tempdir().unwrap();
        let staged = stage_chroot_script(target.path().to_str().unwrap(), &resolved).unwrap();
        assert_eq!(staged.chroot_path, "/root/chroot-stage.sh");
        assert_eq!(
            fs::read_to_string(&staged.host_path).unwrap(),
            "#!/bin/bash\necho stage\n"
        );
    }

    #[test]
    fn test_preflight_only_checks_chroot_stage() {
        assert!(preflight(&PostInstall::None, |_| None).is_ok());
        assert!(preflight(&PostInstall::default(), |_| None).is_ok());
        let stage = PostInstall::ChrootStage {
            env: "STAGE".to_string(),
        };
        assert!(preflight(&stage, |_| None).is_err());
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let target = tempfile::tempdir().unwrap();
        let cmd = CommandRunner::new(true);
        run_post_install(
            &cmd,
            &PostInstall::default(),
            &sample_input(),
            target.path().to_str().unwrap(),
            |_| None,
        )
        .unwrap();
        assert!(!target.path().join("root").exists());
    }
}
