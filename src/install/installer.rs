//! Main installation orchestrator

use crate::archinstall::{render_config, CredentialsDocument};
use crate::config::{InstallOptions, UserInput};
use crate::disk::detection::{disk_listing, disk_size_bytes, size_human};
use crate::disk::geometry::{print_geometry_summary, PartitionGeometry};
use crate::install::post_install::{preflight, run_post_install};
use crate::utils::command::CommandRunner;
use crate::utils::error::{InstallerError, Result};
use crate::utils::prompt::{self, warn_confirm, Prompter};
use crate::utils::signal;
use std::fs;
use std::io::Write;
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::Path;
use tracing::{error, info, warn};

/// Main installer struct
pub struct Installer {
    options: InstallOptions,
    cmd: CommandRunner,
    /// Pass `--silent` to archinstall
    silent: bool,
    /// Skip the erase confirmation prompt
    skip_confirm: bool,
}

/// Write `content` to `path` with the given mode, replacing any previous file
fn write_with_mode(path: &str, content: &str, mode: u32) -> Result<()> {
    if let Some(parent) = Path::new(path).parent() {
        fs::create_dir_all(parent)?;
    }
    // Unlink first so a planted symlink is replaced, never followed
    match fs::remove_file(path) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
        _ => {}
    }
    let mut file = fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(mode)
        .open(path)?;
    // mode() is filtered through the umask
    file.set_permissions(fs::Permissions::from_mode(mode))?;
    file.write_all(content.as_bytes())?;
    file.write_all(b"\n")?;
    Ok(())
}

impl Installer {
    pub fn new(options: InstallOptions, dry_run: bool) -> Self {
        Self {
            options,
            cmd: CommandRunner::new(dry_run),
            silent: true,
            skip_confirm: false,
        }
    }

    /// Let archinstall show its own menus instead of running `--silent`
    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Skip the interactive erase confirmation
    pub fn with_skip_confirm(mut self, skip: bool) -> Self {
        self.skip_confirm = skip;
        self
    }

    /// Run the full installation process
    pub fn run<P: Prompter + ?Sized>(self, prompter: &mut P, device: Option<String>) -> Result<()> {
        println!("=== LishaLinux Installer ===");
        println!("Arch-based distro with Hyprland and optimized defaults\n");

        preflight(&self.options.post_install, |name| std::env::var(name).ok())?;

        // Phase 1: operator input
        info!("[Phase 1/5] Collecting installation settings");
        let input = UserInput::collect(prompter, &self.options.prompts, device, || {
            disk_listing()
                .map_err(|e| warn!("Could not list disks: {}", e))
                .ok()
        })?;

        // Phase 2: geometry
        info!("[Phase 2/5] Computing partition layout for {}", input.disk);
        let disk_bytes = disk_size_bytes(&input.disk)?;
        info!("Target disk: {} ({})", input.disk, size_human(disk_bytes));
        let geometry = PartitionGeometry::compute(disk_bytes, &self.options.geometry)?;
        print_geometry_summary(&input.disk, disk_bytes, &geometry);

        let warning = format!(
            "This will ERASE ALL DATA on {}. This operation cannot be undone!",
            input.disk
        );
        if !self.cmd.is_dry_run() && !self.skip_confirm && !warn_confirm(prompter, &warning)? {
            return Err(InstallerError::UserCancelled);
        }

        // Phase 3: documents
        info!("[Phase 3/5] Writing archinstall documents ({})", self.options.target);
        self.write_documents(&input, &geometry)?;

        // Phase 4: archinstall
        info!("[Phase 4/5] Running {}", self.options.paths.installer);
        signal::install_handlers()?;
        self.run_installer()?;

        // Phase 5: user environment
        info!("[Phase 5/5] Post-install stage");
        run_post_install(
            &self.cmd,
            &self.options.post_install,
            &input,
            &self.options.paths.target_root,
            |name| std::env::var(name).ok(),
        )?;

        info!("Installation to {} finished successfully", input.disk);
        prompt::success("Installation complete! Reboot to start LishaLinux.");
        Ok(())
    }

    /// Render both documents and write them to their fixed paths.
    ///
    /// The credentials file is readable by root only.
    pub fn write_documents(&self, input: &UserInput, geometry: &PartitionGeometry) -> Result<()> {
        let config = render_config(input, geometry, &self.options)?;
        let creds = CredentialsDocument::from_input(input).render()?;
        let paths = &self.options.paths;

        if self.cmd.is_dry_run() {
            println!("  [dry-run] Would write configuration to {}:", paths.config_file);
            for line in config.lines() {
                println!("    {}", line);
            }
            println!(
                "  [dry-run] Would write credentials for root and {} to {}",
                input.username, paths.creds_file
            );
            return Ok(());
        }

        write_with_mode(&paths.config_file, &config, 0o644)?;
        write_with_mode(&paths.creds_file, &creds, 0o600)?;

        println!("\nConfiguration saved to: {}", paths.config_file);
        println!("Credentials saved to: {}", paths.creds_file);
        Ok(())
    }

    /// Arguments handed to archinstall
    pub fn installer_args(&self) -> Vec<&str> {
        let paths = &self.options.paths;
        let mut args = vec![
            "--config",
            paths.config_file.as_str(),
            "--creds",
            paths.creds_file.as_str(),
        ];
        if self.silent {
            args.push("--silent");
        }
        args
    }

    /// Invoke archinstall and interpret its exit status
    pub fn run_installer(&self) -> Result<()> {
        println!("\nStarting installation...\n");

        let program = &self.options.paths.installer;
        let Some(status) = self.cmd.status(program, &self.installer_args())? else {
            return Ok(());
        };

        signal::check()?;

        if !status.success() {
            error!("{} exited with {:?}", program, status.code());
            prompt::error("Installation failed.");
            eprintln!("Check {}", self.options.paths.install_log);
            return Err(InstallerError::InstallerFailed {
                code: status.code(),
            });
        }

        info!("{} completed successfully", program);
        Ok(())
    }
}
