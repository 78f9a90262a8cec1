//! Disk listing and size queries

use crate::utils::command::run_command_output;
use crate::utils::error::{InstallerError, Result};
use tracing::debug;

/// Human-readable listing of whole disks, as printed by `lsblk`
pub fn disk_listing() -> Result<String> {
    run_command_output("lsblk", &["-d", "-n", "-o", "NAME,SIZE,TYPE"])
}

/// Raw size of a block device in bytes.
///
/// Asks `blockdev` first and falls back to `lsblk` when it is unavailable or
/// refuses the device.
pub fn disk_size_bytes(device: &str) -> Result<u64> {
    let raw = match run_command_output("blockdev", &["--getsize64", device]) {
        Ok(out) => out,
        Err(e) => {
            debug!("blockdev failed for {} ({}), trying lsblk", device, e);
            run_command_output("lsblk", &["-b", "-d", "-n", "-o", "SIZE", device])?
        }
    };

    parse_size_output(&raw).ok_or_else(|| InstallerError::CommandFailed {
        command: format!("size query for {}", device),
        stderr: format!("unexpected output: {:?}", raw),
    })
}

/// Parse the first line of a size query as a byte count
fn parse_size_output(raw: &str) -> Option<u64> {
    raw.lines().next()?.trim().parse().ok()
}

/// Parse a size given on the command line: plain bytes or a binary
/// `K`/`M`/`G`/`T` suffix (`20G`, `512MiB`).
pub fn parse_size(text: &str) -> Result<u64> {
    let text = text.trim();
    let digits_end = text
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(text.len());
    let (number, suffix) = text.split_at(digits_end);

    let value: u64 = number
        .parse()
        .map_err(|_| InstallerError::ValidationError(format!("Invalid size: {:?}", text)))?;

    let shift = match suffix.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 0,
        "K" | "KIB" => 10,
        "M" | "MIB" => 20,
        "G" | "GIB" => 30,
        "T" | "TIB" => 40,
        other => {
            return Err(InstallerError::ValidationError(format!(
                "Unknown size suffix: {:?}",
                other
            )))
        }
    };

    value
        .checked_mul(1u64 << shift)
        .ok_or_else(|| InstallerError::ValidationError(format!("Size out of range: {:?}", text)))
}

/// Get human-readable size
pub fn size_human(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = KIB * 1024;
    const GIB: u64 = MIB * 1024;
    const TIB: u64 = GIB * 1024;

    if bytes >= TIB {
        format!("{:.1}T", bytes as f64 / TIB as f64)
    } else if bytes >= GIB {
        format!("{:.1}G", bytes as f64 / GIB as f64)
    } else if bytes >= MIB {
        format!("{:.1}M", bytes as f64 / MIB as f64)
    } else if bytes >= KIB {
        format!("{:.1}K", bytes as f64 / KIB as f64)
    } else {
        format!("{}B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_size_output() {
        assert_eq!(parse_size_output("21474836480\n"), Some(21474836480));
        assert_eq!(parse_size_output("  512\n1024"), Some(512));
        assert_eq!(parse_size_output("n/a"), None);
        assert_eq!(parse_size_output(""), None);
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("21474836480").unwrap(), 21474836480);
        assert_eq!(parse_size("20G").unwrap(), 20 * 1024 * 1024 * 1024);
        assert_eq!(parse_size("512MiB").unwrap(), 512 * 1024 * 1024);
        assert_eq!(parse_size("1t").unwrap(), 1u64 << 40);
        assert!(parse_size("twenty").is_err());
        assert!(parse_size("20X").is_err());
        assert!(parse_size("99999999999T").is_err());
    }

    #[test]
    fn test_size_human() {
        assert_eq!(size_human(20 * 1024 * 1024 * 1024), "20.0G");
        assert_eq!(size_human(1536 * 1024), "1.5M");
        assert_eq!(size_human(100), "100B");
    }
}
