//! Partition geometry for the two-partition LishaLinux layout
//!
//! Partition 1: FAT32 boot/ESP starting at 1 MiB
//! Partition 2: btrfs root, from the end of boot to the end of the disk,
//!              minus the tail kept free for the backup GPT

use crate::config::GeometryConfig;
use crate::utils::error::{InstallerError, Result};
use serde::Serialize;

pub const MIB: u64 = 1024 * 1024;

/// Offset of the first partition
const BOOT_START_MIB: u64 = 1;

/// Byte offsets and sizes of the boot and root partitions.
///
/// All four values are multiples of 1 MiB and
/// `root_start == boot_start + boot_size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartitionGeometry {
    pub boot_start: u64,
    pub boot_size: u64,
    pub root_start: u64,
    pub root_size: u64,
}

/// Align value down to alignment boundary
fn floor_align(value: u64, align: u64) -> u64 {
    (value / align) * align
}

impl PartitionGeometry {
    /// Compute the layout for a disk of `disk_bytes` raw bytes
    pub fn compute(disk_bytes: u64, config: &GeometryConfig) -> Result<Self> {
        let disk_mib = floor_align(disk_bytes, MIB) / MIB;
        let usable_end_mib = disk_mib.saturating_sub(config.gpt_tail_mib);
        let root_start_mib = BOOT_START_MIB + config.boot_size_mib;
        let root_mib = usable_end_mib.saturating_sub(root_start_mib);

        let required_mib = config.required_root_mib();
        if root_mib < required_mib {
            return Err(InstallerError::DiskTooSmall {
                root_mib,
                required_mib,
                min_disk_mib: Self::minimum_disk_bytes(config) / MIB,
            });
        }

        Ok(Self {
            boot_start: BOOT_START_MIB * MIB,
            boot_size: config.boot_size_mib * MIB,
            root_start: root_start_mib * MIB,
            root_size: root_mib * MIB,
        })
    }

    /// Smallest disk, in bytes, that satisfies `config`
    pub fn minimum_disk_bytes(config: &GeometryConfig) -> u64 {
        let required_mib = config.required_root_mib();
        (BOOT_START_MIB + config.boot_size_mib + required_mib + config.gpt_tail_mib) * MIB
    }

    pub fn boot_start_mib(&self) -> u64 {
        self.boot_start / MIB
    }

    pub fn boot_size_mib(&self) -> u64 {
        self.boot_size / MIB
    }

    pub fn root_start_mib(&self) -> u64 {
        self.root_start / MIB
    }

    pub fn root_size_mib(&self) -> u64 {
        self.root_size / MIB
    }

    /// First byte after the root partition
    #[cfg(test)]
    fn end(&self) -> u64 {
        self.root_start + self.root_size
    }
}

/// Print geometry summary
pub fn print_geometry_summary(device: &str, disk_bytes: u64, geometry: &PartitionGeometry) {
    println!(
        "\nPartition layout for {} (total: {} MiB):",
        device,
        disk_bytes / MIB
    );
    println!(
        "{:<6} {:<8} {:>12} {:>12} {:<10}",
        "NUM", "NAME", "START", "SIZE", "MOUNT"
    );
    println!("{}", "-".repeat(52));
    println!(
        "{:<6} {:<8} {:>12} {:>12} {:<10}",
        1,
        "BOOT",
        format!("{} MiB", geometry.boot_start_mib()),
        format!("{} MiB", geometry.boot_size_mib()),
        "/boot"
    );
    println!(
        "{:<6} {:<8} {:>12} {:>12} {:<10}",
        2,
        "ROOT",
        format!("{} MiB", geometry.root_start_mib()),
        format!("{} MiB", geometry.root_size_mib()),
        "/"
    );
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    const GIB: u64 = 1024 * MIB;

    #[test]
    fn test_twenty_gib_disk() {
        let g = PartitionGeometry::compute(21_474_836_480, &GeometryConfig::default()).unwrap();
        assert_eq!(g.boot_start_mib(), 1);
        assert_eq!(g.boot_size_mib(), 1024);
        assert_eq!(g.root_start_mib(), 1025);
        assert_eq!(g.root_size_mib(), 20480 - 1025 - 1);
        assert_eq!(g.end(), 20479 * MIB);
    }

    #[test]
    fn test_invariants_over_many_sizes() {
        let config = GeometryConfig::default();
        let min = PartitionGeometry::minimum_disk_bytes(&config);
        let mut size = min;
        while size < 4096 * GIB {
            for jitter in [0, 1, 511, MIB - 1, 12_345_678] {
                let disk = size + jitter;
                let g = PartitionGeometry::compute(disk, &config).unwrap();
                assert_eq!(g.boot_start, MIB);
                assert_eq!(g.boot_size, GIB);
                assert_eq!(g.root_start, g.boot_start + g.boot_size);
                for value in [g.boot_start, g.boot_size, g.root_start, g.root_size] {
                    assert_eq!(value % MIB, 0);
                }
                assert!(g.root_size >= 10 * GIB);
                assert!(g.end() + MIB <= disk);
            }
            size = size * 3 / 2 + 7;
        }
    }

    #[test]
    fn test_below_floor_fails() {
        let config = GeometryConfig::default();
        let min = PartitionGeometry::minimum_disk_bytes(&config);
        assert!(PartitionGeometry::compute(min, &config).is_ok());

        for disk in [0, MIB, 2 * GIB, 8 * GIB, min - 1] {
            let err = PartitionGeometry::compute(disk, &config).unwrap_err();
            match err {
                InstallerError::DiskTooSmall {
                    required_mib,
                    min_disk_mib,
                    ..
                } => {
                    assert_eq!(required_mib, 10240);
                    assert_eq!(min_disk_mib * MIB, min);
                }
                other => panic!("unexpected error: {other}"),
            }
        }
    }

    #[test]
    fn test_floor_disabled_still_requires_some_root() {
        let config = GeometryConfig {
            min_root_mib: 0,
            ..GeometryConfig::default()
        };
        let g = PartitionGeometry::compute(2 * GIB, &config).unwrap();
        assert_eq!(g.root_size_mib(), 2048 - 1025 - 1);

        assert!(PartitionGeometry::compute(1026 * MIB, &config).is_err());
        assert_eq!(
            PartitionGeometry::minimum_disk_bytes(&config),
            1027 * MIB
        );
        assert!(PartitionGeometry::compute(1027 * MIB, &config).is_ok());
    }

    #[test]
    fn test_custom_boot_size() {
        let config = GeometryConfig {
            boot_size_mib: 512,
            ..GeometryConfig::default()
        };
        let g = PartitionGeometry::compute(64 * GIB, &config).unwrap();
        assert_eq!(g.root_start_mib(), 513);
        assert_eq!(g.root_size_mib(), 65536 - 513 - 1);
    }
}
