//! Installer options
//!
//! Everything the generated archinstall documents contain that is not typed
//! in by the operator lives here. The defaults reproduce the stock LishaLinux
//! installation; a TOML file can override any subset of fields.

use crate::utils::error::{InstallerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level options
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InstallOptions {
    /// archinstall configuration schema to emit
    pub target: TargetVersion,
    pub prompts: PromptConfig,
    pub geometry: GeometryConfig,
    pub storage: StorageConfig,
    pub system: SystemConfig,
    pub desktop: DesktopConfig,
    pub paths: PathsConfig,
    pub post_install: PostInstall,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PromptConfig {
    /// Hostname used when the prompt is left blank
    pub hostname_default: String,
    /// Timezone used when the prompt is skipped or left blank
    pub timezone_default: String,
    /// Ask for a timezone instead of using the default
    pub prompt_timezone: bool,
    /// Sudo access used when the prompt is skipped
    pub default_sudo: bool,
    /// Ask whether the new user gets sudo access
    pub prompt_sudo: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GeometryConfig {
    /// Boot partition size in MiB
    pub boot_size_mib: u64,
    /// Smallest acceptable root partition in MiB (0 disables the check)
    pub min_root_mib: u64,
    /// Space left unallocated at the end of the disk for the backup GPT
    pub gpt_tail_mib: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// Mount the btrfs root with compress=zstd
    pub compress: bool,
    /// Ask archinstall to set up Snapper snapshots
    pub snapper: bool,
    pub subvolumes: Vec<Subvolume>,
}

/// Btrfs subvolume on the root partition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Subvolume {
    pub name: String,
    pub mountpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SystemConfig {
    pub kernels: Vec<String>,
    /// Extra packages installed on top of the profile
    pub packages: Vec<String>,
    /// Services enabled by archinstall
    pub services: Vec<String>,
    pub kb_layout: String,
    pub sys_lang: String,
    pub sys_enc: String,
    pub mirror_regions: Vec<String>,
    pub bootloader: Bootloader,
    /// Install the bootloader to the removable/fallback location
    pub bootloader_removable: bool,
    pub uki: bool,
    pub audio: AudioServer,
    pub bluetooth: bool,
    pub network: NetworkMode,
    pub ntp: bool,
    pub swap: bool,
    pub swap_algorithm: String,
    /// 0 leaves pacman's own setting untouched
    pub parallel_downloads: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DesktopConfig {
    pub profile: String,
    pub details: Vec<String>,
    pub greeter: String,
    pub gfx_driver: String,
    pub seat_access: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub config_file: String,
    pub creds_file: String,
    /// archinstall executable
    pub installer: String,
    /// Log file the operator is pointed at when the installer fails
    pub install_log: String,
    /// Mount point of the freshly installed system
    pub target_root: String,
}

/// What runs after archinstall has finished
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum PostInstall {
    /// Nothing
    None,
    /// Clone the companion repository and run its install script as the new user
    Companion { repo: String, script: String },
    /// Copy an operator-supplied script into the target and run it there
    ChrootStage { env: String },
}

// Enums for configuration options

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TargetVersion {
    /// archinstall 2.8: flat audio/profile sections, MiB sizes
    V2,
    /// archinstall 3.0: app_config section, byte sizes with sector size
    #[default]
    V3,
}

impl TargetVersion {
    /// Version string written into the configuration document
    pub fn schema_version(&self) -> &'static str {
        match self {
            Self::V2 => "2.8.6",
            Self::V3 => "3.0.15",
        }
    }
}

impl std::fmt::Display for TargetVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "archinstall {}", self.schema_version())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Bootloader {
    #[default]
    Limine,
    Grub,
    SystemdBoot,
}

impl std::fmt::Display for Bootloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Limine => write!(f, "Limine"),
            Self::Grub => write!(f, "Grub"),
            Self::SystemdBoot => write!(f, "Systemd-boot"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AudioServer {
    #[default]
    Pipewire,
    Pulseaudio,
}

impl std::fmt::Display for AudioServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pipewire => write!(f, "pipewire"),
            Self::Pulseaudio => write!(f, "pulseaudio"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum NetworkMode {
    /// Copy the live ISO's network configuration
    #[default]
    CopyIso,
    NetworkManager,
}

// Default value functions

fn default_subvolumes() -> Vec<Subvolume> {
    [
        ("@", "/"),
        ("@home", "/home"),
        ("@log", "/var/log"),
        ("@pkg", "/var/cache/pacman/pkg"),
    ]
    .into_iter()
    .map(|(name, mountpoint)| Subvolume {
        name: name.to_string(),
        mountpoint: mountpoint.to_string(),
    })
    .collect()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            hostname_default: "lishalinux".to_string(),
            timezone_default: "UTC".to_string(),
            prompt_timezone: false,
            default_sudo: true,
            prompt_sudo: false,
        }
    }
}

impl Default for GeometryConfig {
    fn default() -> Self {
        Self {
            boot_size_mib: 1024,
            min_root_mib: 10 * 1024,
            gpt_tail_mib: 1,
        }
    }
}

impl GeometryConfig {
    /// Root size the layout must reach; a disabled floor still needs 1 MiB
    pub fn required_root_mib(&self) -> u64 {
        self.min_root_mib.max(1)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            compress: true,
            snapper: true,
            subvolumes: default_subvolumes(),
        }
    }
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            kernels: strings(&["linux"]),
            packages: strings(&["git", "kitty", "gum"]),
            services: Vec::new(),
            kb_layout: "us".to_string(),
            sys_lang: "en_US.UTF-8".to_string(),
            sys_enc: "UTF-8".to_string(),
            mirror_regions: strings(&["Worldwide"]),
            bootloader: Bootloader::Limine,
            bootloader_removable: true,
            uki: false,
            audio: AudioServer::Pipewire,
            bluetooth: true,
            network: NetworkMode::CopyIso,
            ntp: true,
            swap: true,
            swap_algorithm: "zstd".to_string(),
            parallel_downloads: 0,
        }
    }
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            profile: "Desktop".to_string(),
            details: strings(&["Hyprland"]),
            greeter: "sddm".to_string(),
            gfx_driver: "All open-source".to_string(),
            seat_access: "polkit".to_string(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            config_file: "/tmp/lishalinux_config.json".to_string(),
            creds_file: "/tmp/lishalinux_creds.json".to_string(),
            installer: "archinstall".to_string(),
            install_log: "/var/log/archinstall/install.log".to_string(),
            target_root: "/mnt".to_string(),
        }
    }
}

impl Default for PostInstall {
    fn default() -> Self {
        Self::Companion {
            repo: "https://github.com/rawalrauf/lishalinux".to_string(),
            script: "install.sh".to_string(),
        }
    }
}

impl InstallOptions {
    /// Load options from a TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let options: InstallOptions = toml::from_str(content)?;
        Ok(options)
    }

    /// Options file written by `generate-config`
    pub fn sample() -> Self {
        Self::default()
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Validate the options
    pub fn validate(&self) -> Result<()> {
        if self.geometry.boot_size_mib == 0 {
            return Err(InstallerError::ValidationError(
                "Boot partition size must be greater than zero".to_string(),
            ));
        }

        if let Some(pkg) = self.system.packages.iter().find(|p| p.trim().is_empty()) {
            return Err(InstallerError::ValidationError(format!(
                "Package names cannot be empty (got {:?})",
                pkg
            )));
        }

        if self.system.kernels.is_empty() {
            return Err(InstallerError::ValidationError(
                "At least one kernel is required".to_string(),
            ));
        }

        if !self.storage.subvolumes.iter().any(|s| s.mountpoint == "/") {
            return Err(InstallerError::ValidationError(
                "A btrfs subvolume must be mounted at /".to_string(),
            ));
        }

        let fixed_paths = [
            ("paths.config_file", &self.paths.config_file),
            ("paths.creds_file", &self.paths.creds_file),
            ("paths.install_log", &self.paths.install_log),
            ("paths.target_root", &self.paths.target_root),
        ];
        for (key, path) in fixed_paths {
            if !Path::new(path).is_absolute() {
                return Err(InstallerError::ValidationError(format!(
                    "{} must be an absolute path (got {:?})",
                    key, path
                )));
            }
        }

        if self.paths.config_file == self.paths.creds_file {
            return Err(InstallerError::ValidationError(
                "Configuration and credentials must be written to different files".to_string(),
            ));
        }

        match &self.post_install {
            PostInstall::Companion { repo, script } => {
                if repo.trim().is_empty() {
                    return Err(InstallerError::ValidationError(
                        "Companion repository URL cannot be empty".to_string(),
                    ));
                }
                if script.trim().is_empty() {
                    return Err(InstallerError::ValidationError(
                        "Companion install script cannot be empty".to_string(),
                    ));
                }
            }
            PostInstall::ChrootStage { env } => {
                if env.trim().is_empty() {
                    return Err(InstallerError::ValidationError(
                        "Chroot stage environment variable name cannot be empty".to_string(),
                    ));
                }
            }
            PostInstall::None => {}
        }

        Ok(())
    }
}
