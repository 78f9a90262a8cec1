//! Configuration document (`--config`)
//!
//! Objects are built with `serde_json::json!`, whose maps keep their keys
//! sorted, so the same inputs always render to the same bytes.

use crate::config::{InstallOptions, NetworkMode, TargetVersion, UserInput};
use crate::disk::geometry::{PartitionGeometry, MIB};
use crate::utils::error::Result;
use serde_json::{json, Map, Value};

/// Sector size reported to archinstall 3.x alongside byte values
const SECTOR_SIZE: u64 = 512;

/// A size or offset in the unit the target schema expects
fn size_value(target: TargetVersion, bytes: u64) -> Value {
    match target {
        TargetVersion::V2 => json!({"unit": "MiB", "value": bytes / MIB}),
        TargetVersion::V3 => json!({
            "sector_size": {"unit": "B", "value": SECTOR_SIZE},
            "unit": "B",
            "value": bytes,
        }),
    }
}

fn boot_partition(target: TargetVersion, geometry: &PartitionGeometry) -> Value {
    json!({
        "btrfs": [],
        "flags": ["boot", "esp"],
        "fs_type": "fat32",
        "mount_options": [],
        "mountpoint": "/boot",
        "size": size_value(target, geometry.boot_size),
        "start": size_value(target, geometry.boot_start),
        "status": "create",
        "type": "primary",
    })
}

fn root_partition(
    target: TargetVersion,
    geometry: &PartitionGeometry,
    options: &InstallOptions,
) -> Value {
    let subvolumes: Vec<Value> = options
        .storage
        .subvolumes
        .iter()
        .map(|s| json!({"name": s.name, "mountpoint": s.mountpoint}))
        .collect();

    let mount_options: Vec<&str> = if options.storage.compress {
        vec!["compress=zstd"]
    } else {
        Vec::new()
    };

    json!({
        "btrfs": subvolumes,
        "flags": [],
        "fs_type": "btrfs",
        "mount_options": mount_options,
        // subvolumes carry the mountpoints
        "mountpoint": null,
        "size": size_value(target, geometry.root_size),
        "start": size_value(target, geometry.root_start),
        "status": "create",
        "type": "primary",
    })
}

fn disk_config(input: &UserInput, geometry: &PartitionGeometry, options: &InstallOptions) -> Value {
    let target = options.target;
    let mut disk = json!({
        "config_type": "default_layout",
        "device_modifications": [{
            "device": input.disk,
            "partitions": [
                boot_partition(target, geometry),
                root_partition(target, geometry, options),
            ],
            "wipe": true,
        }],
    });

    if options.storage.snapper {
        disk["btrfs_options"] = json!({"snapshot_config": {"type": "Snapper"}});
    }

    disk
}

fn mirror_config(options: &InstallOptions) -> Value {
    let regions: Map<String, Value> = options
        .system
        .mirror_regions
        .iter()
        .map(|r| (r.clone(), json!([])))
        .collect();

    match options.target {
        TargetVersion::V2 => json!({"mirror_regions": regions}),
        TargetVersion::V3 => json!({
            "custom_repositories": [],
            "custom_servers": [],
            "mirror_regions": regions,
            "optional_repositories": [],
        }),
    }
}

fn network_config(options: &InstallOptions) -> Value {
    let kind = match (options.target, options.system.network) {
        (TargetVersion::V2, NetworkMode::CopyIso) => "copy_iso",
        (TargetVersion::V3, NetworkMode::CopyIso) => "iso",
        (_, NetworkMode::NetworkManager) => "nm",
    };
    json!({"type": kind})
}

fn profile_config(options: &InstallOptions) -> Value {
    let desktop = &options.desktop;
    match options.target {
        TargetVersion::V2 => json!({
            "gfx_driver": desktop.gfx_driver,
            "greeter": desktop.greeter,
            "profile": {"details": desktop.details, "main": desktop.profile},
            "seat_access": desktop.seat_access,
        }),
        TargetVersion::V3 => {
            let custom: Map<String, Value> = desktop
                .details
                .iter()
                .map(|d| (d.clone(), json!({"seat_access": desktop.seat_access})))
                .collect();
            json!({
                "gfx_driver": desktop.gfx_driver,
                "greeter": desktop.greeter,
                "profile": {
                    "custom_settings": custom,
                    "details": desktop.details,
                    "main": desktop.profile,
                },
            })
        }
    }
}

/// Build the archinstall configuration document.
///
/// Pure: no I/O, and no secrets (those go to the credentials document).
pub fn build_config(
    input: &UserInput,
    geometry: &PartitionGeometry,
    options: &InstallOptions,
) -> Value {
    let system = &options.system;
    let timezone = input
        .timezone
        .as_deref()
        .unwrap_or(&options.prompts.timezone_default);

    let mut doc = json!({
        "archinstall-language": "English",
        "bootloader_config": {
            "bootloader": system.bootloader.to_string(),
            "removable": system.bootloader_removable,
            "uki": system.uki,
        },
        "disk_config": disk_config(input, geometry, options),
        "hostname": input.hostname,
        "kernels": system.kernels,
        "locale_config": {
            "kb_layout": system.kb_layout,
            "sys_enc": system.sys_enc,
            "sys_lang": system.sys_lang,
        },
        "mirror_config": mirror_config(options),
        "network_config": network_config(options),
        "ntp": system.ntp,
        "packages": system.packages,
        "profile_config": profile_config(options),
        "services": system.services,
        "timezone": timezone,
        "version": options.target.schema_version(),
    });

    let audio = json!({"audio": system.audio.to_string()});
    match options.target {
        TargetVersion::V2 => {
            doc["audio_config"] = audio;
            doc["swap"] = json!({"enabled": system.swap});
            doc["debug"] = json!(false);
            doc["silent"] = json!(false);
            doc["offline"] = json!(false);
            doc["script"] = json!("guided");
        }
        TargetVersion::V3 => {
            doc["app_config"] = json!({
                "audio_config": audio,
                "bluetooth_config": {"enabled": system.bluetooth},
            });
            doc["auth_config"] = json!({});
            doc["custom_commands"] = json!([]);
            doc["parallel_downloads"] = json!(system.parallel_downloads);
            doc["swap"] = json!({
                "algorithm": system.swap_algorithm,
                "enabled": system.swap,
            });
        }
    }

    doc
}

/// Pretty-printed configuration document
pub fn render_config(
    input: &UserInput,
    geometry: &PartitionGeometry,
    options: &InstallOptions,
) -> Result<String> {
    Ok(serde_json::to_string_pretty(&build_config(input, geometry, options))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeometryConfig, PostInstall};

    fn sample_input() -> UserInput {
        UserInput {
            disk: "/dev/sda".to_string(),
            hostname: "lishalinux-test".to_string(),
            username: "testuser".to_string(),
            root_password: "rootpass".to_string(),
            user_password: "testpass".to_string(),
            sudo: true,
            timezone: None,
        }
    }

    fn twenty_gib() -> PartitionGeometry {
        PartitionGeometry::compute(20 * 1024 * MIB, &GeometryConfig::default()).unwrap()
    }

    #[test]
    fn test_required_fields_present() {
        let doc = build_config(&sample_input(), &twenty_gib(), &InstallOptions::default());
        for field in [
            "archinstall-language",
            "app_config",
            "bootloader_config",
            "disk_config",
            "hostname",
            "kernels",
            "locale_config",
            "mirror_config",
            "network_config",
            "packages",
            "profile_config",
            "services",
            "swap",
            "timezone",
            "version",
        ] {
            assert!(doc.get(field).is_some(), "missing {}", field);
        }
    }

    #[test]
    fn test_default_values() {
        let doc = build_config(&sample_input(), &twenty_gib(), &InstallOptions::default());
        assert_eq!(doc["app_config"]["audio_config"]["audio"], "pipewire");
        assert_eq!(doc["bootloader_config"]["bootloader"], "Limine");
        assert_eq!(doc["bootloader_config"]["removable"], true);
        assert_eq!(doc["hostname"], "lishalinux-test");
        assert_eq!(doc["timezone"], "UTC");
        assert_eq!(doc["version"], "3.0.15");
        assert_eq!(doc["network_config"]["type"], "iso");
        assert_eq!(doc["swap"]["enabled"], true);
        assert_eq!(doc["ntp"], true);
        assert_eq!(doc["profile_config"]["greeter"], "sddm");
        assert_eq!(doc["profile_config"]["profile"]["details"][0], "Hyprland");
        assert_eq!(
            doc["profile_config"]["profile"]["custom_settings"]["Hyprland"]["seat_access"],
            "polkit"
        );
        assert_eq!(doc["packages"], json!(["git", "kitty", "gum"]));
        assert_eq!(
            doc["disk_config"]["btrfs_options"]["snapshot_config"]["type"],
            "Snapper"
        );
    }

    #[test]
    fn test_partitions_follow_geometry() {
        let geometry = twenty_gib();
        let doc = build_config(&sample_input(), &geometry, &InstallOptions::default());
        let modification = &doc["disk_config"]["device_modifications"][0];
        assert_eq!(modification["device"], "/dev/sda");
        assert_eq!(modification["wipe"], true);

        let boot = &modification["partitions"][0];
        assert_eq!(boot["fs_type"], "fat32");
        assert_eq!(boot["mountpoint"], "/boot");
        assert_eq!(boot["start"]["value"], MIB);
        assert_eq!(boot["size"]["value"], 1024 * MIB);
        assert_eq!(boot["size"]["sector_size"]["value"], 512);

        let root = &modification["partitions"][1];
        assert_eq!(root["fs_type"], "btrfs");
        assert_eq!(root["start"]["value"], geometry.root_start);
        assert_eq!(root["size"]["value"], geometry.root_size);
        assert_eq!(root["mount_options"], json!(["compress=zstd"]));
        assert!(root["mountpoint"].is_null());

        let names: Vec<&str> = root["btrfs"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, ["@", "@home", "@log", "@pkg"]);
    }

    #[test]
    fn test_v2_shape() {
        let options = InstallOptions {
            target: TargetVersion::V2,
            ..InstallOptions::default()
        };
        let geometry = twenty_gib();
        let doc = build_config(&sample_input(), &geometry, &options);
        assert_eq!(doc["version"], "2.8.6");
        assert_eq!(doc["audio_config"]["audio"], "pipewire");
        assert!(doc.get("app_config").is_none());
        assert_eq!(doc["network_config"]["type"], "copy_iso");
        assert_eq!(doc["profile_config"]["seat_access"], "polkit");

        let root = &doc["disk_config"]["device_modifications"][0]["partitions"][1];
        assert_eq!(root["start"], json!({"unit": "MiB", "value": 1025}));
        assert_eq!(root["size"]["value"], geometry.root_size_mib());
    }

    #[test]
    fn test_no_secrets_in_config() {
        let text = render_config(&sample_input(), &twenty_gib(), &InstallOptions::default()).unwrap();
        assert!(!text.contains("rootpass"));
        assert!(!text.contains("testpass"));
    }

    #[test]
    fn test_deterministic_output() {
        let mut options = InstallOptions::default();
        options.system.mirror_regions = vec!["United States".to_string(), "Worldwide".to_string()];
        options.post_install = PostInstall::None;
        let a = render_config(&sample_input(), &twenty_gib(), &options).unwrap();
        let b = render_config(&sample_input(), &twenty_gib(), &options.clone()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_timezone_from_input_wins() {
        let mut input = sample_input();
        input.timezone = Some("Asia/Karachi".to_string());
        let doc = build_config(&input, &twenty_gib(), &InstallOptions::default());
        assert_eq!(doc["timezone"], "Asia/Karachi");
    }

    #[test]
    fn test_compression_and_snapper_toggles() {
        let mut options = InstallOptions::default();
        options.storage.compress = false;
        options.storage.snapper = false;
        let doc = build_config(&sample_input(), &twenty_gib(), &options);
        assert!(doc["disk_config"].get("btrfs_options").is_none());
        assert_eq!(
            doc["disk_config"]["device_modifications"][0]["partitions"][1]["mount_options"],
            json!([])
        );
    }
}
