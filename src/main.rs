//! LishaLinux installer - archinstall configuration front end
//!
//! Collects the handful of settings archinstall cannot guess, writes its
//! configuration and credentials documents, and runs it.

use anyhow::Result;
use clap::{Parser, Subcommand};
use lishalinux_installer::config::{normalize_disk, InstallOptions, UserInput};
use lishalinux_installer::disk::detection::{disk_listing, disk_size_bytes, parse_size};
use lishalinux_installer::disk::geometry::{print_geometry_summary, PartitionGeometry};
use lishalinux_installer::install::Installer;
use lishalinux_installer::utils::prompt::{self, TerminalPrompter};
use lishalinux_installer::{archinstall, InstallerError};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "lishalinux-installer")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Dry run mode - show what would be done without making changes
    #[arg(short = 'n', long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start interactive installation
    Install {
        /// Path to an options file (TOML)
        #[arg(short, long, env = "LISHALINUX_OPTIONS")]
        config: Option<String>,

        /// Target disk device (e.g., /dev/sda or sda)
        #[arg(short, long)]
        device: Option<String>,

        /// Run archinstall without --silent
        #[arg(long)]
        interactive_installer: bool,

        /// Do not ask before erasing the target disk
        #[arg(short, long)]
        yes: bool,
    },

    /// List available disks
    ListDisks,

    /// Show the partition layout for a disk size
    Geometry {
        /// Disk size in bytes, or with a K/M/G/T suffix
        size: String,

        /// Path to an options file (TOML)
        #[arg(short, long, env = "LISHALINUX_OPTIONS")]
        config: Option<String>,
    },

    /// Print the archinstall configuration that would be generated
    Render {
        /// Target disk device
        #[arg(short, long)]
        device: String,

        /// Disk size (queried from the device when omitted)
        #[arg(short, long)]
        size: Option<String>,

        /// Path to an options file (TOML)
        #[arg(short, long, env = "LISHALINUX_OPTIONS")]
        config: Option<String>,
    },

    /// Validate an options file
    Validate {
        /// Path to options file
        config: String,
    },

    /// Generate a sample options file
    GenerateConfig {
        /// Output path for options file
        #[arg(short, long, default_value = "lishalinux.toml")]
        output: String,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn load_options(path: Option<&str>) -> Result<InstallOptions> {
    let options = match path {
        Some(p) => {
            info!("Loading options from {}", p);
            InstallOptions::from_file(p)?
        }
        None => InstallOptions::default(),
    };
    options.validate()?;
    Ok(options)
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let dry_run = cli.dry_run;
    if dry_run {
        info!("Running in dry-run mode - no changes will be made");
    }

    let result = match cli.command {
        Some(Commands::Install {
            config,
            device,
            interactive_installer,
            yes,
        }) => cmd_install(config, device, !interactive_installer, yes, dry_run),
        Some(Commands::ListDisks) => cmd_list_disks(),
        Some(Commands::Geometry { size, config }) => cmd_geometry(&size, config.as_deref()),
        Some(Commands::Render {
            device,
            size,
            config,
        }) => cmd_render(&device, size.as_deref(), config.as_deref()),
        Some(Commands::Validate { config }) => cmd_validate(&config),
        Some(Commands::GenerateConfig { output }) => cmd_generate_config(&output),
        None => cmd_install(None, None, true, false, dry_run),
    };

    if let Err(e) = result {
        prompt::error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn cmd_install(
    config_path: Option<String>,
    device: Option<String>,
    silent: bool,
    skip_confirm: bool,
    dry_run: bool,
) -> Result<()> {
    // Check for root privileges
    if !dry_run && !nix::unistd::geteuid().is_root() {
        return Err(InstallerError::NotRoot.into());
    }

    let options = load_options(config_path.as_deref())?;

    let installer = Installer::new(options, dry_run)
        .with_silent(silent)
        .with_skip_confirm(skip_confirm);
    let mut prompter = TerminalPrompter::new();
    installer.run(&mut prompter, device)?;

    Ok(())
}

fn cmd_list_disks() -> Result<()> {
    match disk_listing() {
        Ok(listing) => println!("{}", listing),
        Err(e) => {
            info!("lsblk failed: {}", e);
            prompt::warning("Could not list disks. Please check manually with 'lsblk'");
        }
    }
    Ok(())
}

fn cmd_geometry(size: &str, config_path: Option<&str>) -> Result<()> {
    let options = load_options(config_path)?;
    let disk_bytes = parse_size(size)?;
    let geometry = PartitionGeometry::compute(disk_bytes, &options.geometry)?;
    print_geometry_summary("<disk>", disk_bytes, &geometry);
    println!("{}", serde_json::to_string_pretty(&geometry)?);
    Ok(())
}

fn cmd_render(device: &str, size: Option<&str>, config_path: Option<&str>) -> Result<()> {
    let options = load_options(config_path)?;
    let disk = normalize_disk(device);
    let disk_bytes = match size {
        Some(s) => parse_size(s)?,
        None => disk_size_bytes(&disk)?,
    };
    let geometry = PartitionGeometry::compute(disk_bytes, &options.geometry)?;

    let input = UserInput {
        disk,
        hostname: options.prompts.hostname_default.clone(),
        username: "user".to_string(),
        root_password: String::new(),
        user_password: String::new(),
        sudo: options.prompts.default_sudo,
        timezone: None,
    };
    println!("{}", archinstall::render_config(&input, &geometry, &options)?);
    Ok(())
}

fn cmd_validate(config_path: &str) -> Result<()> {
    load_options(Some(config_path))?;
    prompt::success("Options file is valid");
    Ok(())
}

fn cmd_generate_config(output: &str) -> Result<()> {
    let sample = InstallOptions::sample();
    let content = sample.to_toml()?;
    std::fs::write(output, content)?;
    prompt::success(&format!("Sample options written to {}", output));
    Ok(())
}
