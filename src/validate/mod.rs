//! Blueprint customization checks against an image kind's capabilities.
//!
//! Rules run in a fixed order and the first violated rule wins, except for
//! mount-point path problems which are collected across all paths and
//! reported together:
//!
//! 1. OSTree commit/container kinds reject kernel, filesystem and disk
//!    customizations.
//! 2. Kinds deployed from an OSTree commit need a source URL.
//! 3. Kinds that forbid filesystem or disk customization reject them.
//! 4. Disk customizations must be structurally sound.
//! 5. Mount points must be absolute, canonical and allowed by the platform
//!    policy (aggregated).
//! 6. Mount points must be unique.
//! 7. Swap areas need an architecture that supports them.

pub mod paths;

pub use paths::{canonicalize, check_mountpoints, PathPolicy, PathRule};

use std::collections::BTreeSet;

use tracing::debug;

use crate::blueprint::{Blueprint, DiskCustomization, FsType, PartitionCustomization};
use crate::error::{quote, Feature, ManifestError, Result};
use crate::kind::{Category, ImageKind};
use crate::options::ImageOptions;

/// Validate a blueprint's customizations for `kind`.
pub fn check_customizations(
    kind: &ImageKind,
    blueprint: &Blueprint,
    options: &ImageOptions,
) -> Result<()> {
    let caps = kind.capabilities();
    let has_kernel = blueprint.kernel().is_some_and(|k| !k.is_empty());
    let has_filesystem = !blueprint.filesystems().is_empty();
    let disk = blueprint.disk().filter(|d| !d.is_empty());

    if kind.category().is_ostree_payload() {
        if has_kernel {
            return Err(ManifestError::unsupported(
                "kernel boot parameter customizations are not supported for ostree types",
            ));
        }
        if has_filesystem || disk.is_some() {
            return Err(ManifestError::unsupported(
                "Custom mountpoints and partitioning are not supported for ostree types",
            ));
        }
    }

    if caps.ostree_source && options.ostree_url().is_none() {
        return Err(missing_ostree_source(kind));
    }

    if has_kernel && !caps.kernel {
        return Err(ManifestError::unsupported(format!(
            "kernel boot parameter customizations are not supported for {:?} images",
            kind.name()
        )));
    }

    if !caps.filesystem && (has_filesystem || (disk.is_some() && !caps.disk)) {
        return Err(ManifestError::unsupported(format!(
            "Custom mountpoints and partitioning are not supported for {:?} images",
            kind.name()
        )));
    }

    if disk.is_some() && !caps.disk {
        return Err(ManifestError::unsupported(format!(
            "partitioning customizations are not supported for {:?} images",
            kind.name()
        )));
    }

    if has_filesystem && disk.is_some() {
        return Err(ManifestError::unsupported(
            "partitioning customizations cannot be used with custom filesystems",
        ));
    }

    let policy = &kind.platform().path_policy;

    if let Some(disk) = disk {
        check_disk_structure(disk)?;
        let mountpoints = disk.mountpoints();
        check_mountpoints(mountpoints.iter().copied(), policy)?;
        check_unique(&mountpoints, "partitioning customizations")?;
        check_swap_support(kind, disk)?;
    } else if has_filesystem {
        let mountpoints: Vec<&str> = blueprint
            .filesystems()
            .iter()
            .map(|fs| fs.mountpoint.as_str())
            .collect();
        check_mountpoints(mountpoints.iter().copied(), policy)?;
        check_unique(&mountpoints, "filesystem customizations")?;
    }

    debug!(
        kind = kind.name(),
        arch = kind.arch_name(),
        "customizations accepted"
    );
    Ok(())
}

fn missing_ostree_source(kind: &ImageKind) -> ManifestError {
    let msg = match kind.category() {
        Category::Installer => format!(
            "boot ISO image type {:?} requires specifying a URL from which to retrieve the OSTree commit",
            kind.name()
        ),
        _ => format!(
            "{:?} images require specifying a URL from which to retrieve the OSTree commit",
            kind.name()
        ),
    };
    ManifestError::MissingRequiredInput(msg)
}

/// Structural rules for the partition tree, independent of the platform.
pub fn check_disk_structure(disk: &DiskCustomization) -> Result<()> {
    let mut vg_names = BTreeSet::new();

    for partition in &disk.partitions {
        match partition {
            PartitionCustomization::Plain(plain) => {
                check_filesystem_entry(plain.fs_type, plain.mountpoint(), "partition")?;
            }
            PartitionCustomization::Lvm(vg) => {
                let vg_label = vg.name.as_deref().unwrap_or("(unnamed)");
                if let Some(name) = vg.name.as_deref() {
                    if !vg_names.insert(name) {
                        return Err(ManifestError::structural(format!(
                            "duplicate volume group name {}",
                            quote(name)
                        )));
                    }
                }
                if vg.logical_volumes.is_empty() {
                    return Err(ManifestError::structural(format!(
                        "volume group {} has no logical volumes",
                        vg_label
                    )));
                }

                let mut lv_names = BTreeSet::new();
                for lv in &vg.logical_volumes {
                    if lv.fs_type == FsType::Vfat {
                        return Err(ManifestError::structural(
                            "vfat filesystems are not supported on logical volumes",
                        ));
                    }
                    check_filesystem_entry(lv.fs_type, lv.mountpoint(), "logical volume")?;
                    if let Some(name) = lv.name.as_deref() {
                        if !lv_names.insert(name) {
                            return Err(ManifestError::structural(format!(
                                "duplicate logical volume name {} in volume group {}",
                                quote(name),
                                vg_label
                            )));
                        }
                    }
                }
            }
        }
    }

    Ok(())
}

fn check_filesystem_entry(fs_type: FsType, mountpoint: Option<&str>, what: &str) -> Result<()> {
    match (fs_type, mountpoint) {
        (FsType::Swap, Some(mp)) => Err(ManifestError::structural(format!(
            "swap {} must not have a mountpoint (got {})",
            what,
            quote(mp)
        ))),
        (FsType::Swap, None) => Ok(()),
        (other, None) => Err(ManifestError::structural(format!(
            "{} with filesystem type {:?} requires a mountpoint",
            what,
            other.as_str()
        ))),
        (_, Some(_)) => Ok(()),
    }
}

fn check_unique(mountpoints: &[&str], source: &str) -> Result<()> {
    let mut seen = BTreeSet::new();
    for mountpoint in mountpoints {
        if !seen.insert(*mountpoint) {
            return Err(ManifestError::structural(format!(
                "duplicate mountpoint {} in {}",
                quote(mountpoint),
                source
            )));
        }
    }
    Ok(())
}

fn check_swap_support(kind: &ImageKind, disk: &DiskCustomization) -> Result<()> {
    let platform = kind.platform();
    if disk.has_swap() && !platform.features.swap_partitions {
        return Err(ManifestError::FeatureUnsupported {
            feature: Feature::SwapPartition,
            distro: platform.distro.clone(),
            arch: platform.arch.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{
        logical_volume, lvm, plain, plain_swap, swap_volume, Customizations, FilesystemCustomization,
        KernelCustomization, LogicalVolumeCustomization, VolumeGroupCustomization,
    };
    use crate::registry::registry;

    fn kind(arch: &str, name: &str) -> &'static ImageKind {
        registry()
            .get_distribution("rhel-8.10")
            .unwrap()
            .get_arch(arch)
            .unwrap()
            .get_image_kind(name)
            .unwrap()
    }

    fn disk_blueprint(partitions: Vec<PartitionCustomization>) -> Blueprint {
        Blueprint::with_customizations(Customizations {
            disk: Some(DiskCustomization {
                partitions,
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    fn fs_blueprint(mountpoints: &[&str]) -> Blueprint {
        Blueprint::with_customizations(Customizations {
            filesystem: mountpoints
                .iter()
                .map(|mp| FilesystemCustomization::new(*mp, 1024))
                .collect(),
            ..Default::default()
        })
    }

    #[test]
    fn test_empty_blueprint_passes() {
        let result = check_customizations(
            kind("x86_64", "qcow2"),
            &Blueprint::default(),
            &ImageOptions::default(),
        );
        assert!(result.is_ok());
    }

    #[test]
    fn test_empty_kernel_customization_is_ignored_for_commits() {
        let bp = Blueprint::with_customizations(Customizations {
            kernel: Some(KernelCustomization::default()),
            ..Default::default()
        });
        let result = check_customizations(kind("x86_64", "edge-commit"), &bp, &ImageOptions::default());
        assert!(result.is_ok());
    }

    #[test]
    fn test_ostree_rules_precede_path_rules() {
        let err = check_customizations(
            kind("x86_64", "edge-container"),
            &fs_blueprint(&["//"]),
            &ImageOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Custom mountpoints and partitioning are not supported for ostree types"
        );
    }

    #[test]
    fn test_forbidden_filesystem_with_source() {
        let err = check_customizations(
            kind("x86_64", "edge-raw-image"),
            &fs_blueprint(&["/var"]),
            &ImageOptions::with_ostree_url("http://example.com/repo"),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Custom mountpoints and partitioning are not supported for \"edge-raw-image\" images"
        );
    }

    #[test]
    fn test_disk_only_forbidden() {
        let bp = disk_blueprint(vec![plain(FsType::Ext4, "/", "root")]);
        let err = check_customizations(kind("x86_64", "azure-eap7-rhui"), &bp, &ImageOptions::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "partitioning customizations are not supported for \"azure-eap7-rhui\" images"
        );
        assert!(check_customizations(
            kind("x86_64", "azure-eap7-rhui"),
            &fs_blueprint(&["/var"]),
            &ImageOptions::default()
        )
        .is_ok());
    }

    #[test]
    fn test_filesystem_and_disk_together() {
        let mut bp = fs_blueprint(&["/var"]);
        if let Some(c) = bp.customizations.as_mut() {
            c.disk = Some(DiskCustomization {
                partitions: vec![plain(FsType::Xfs, "/", "")],
                ..Default::default()
            });
        }
        let err = check_customizations(kind("x86_64", "qcow2"), &bp, &ImageOptions::default()).unwrap_err();
        assert!(matches!(err, ManifestError::UnsupportedCustomization(_)));
    }

    #[test]
    fn test_swap_with_mountpoint_is_structural() {
        let mut swap = plain_swap();
        if let PartitionCustomization::Plain(p) = &mut swap {
            p.mountpoint = Some("/swap".into());
        }
        let err = check_customizations(
            kind("x86_64", "qcow2"),
            &disk_blueprint(vec![plain(FsType::Xfs, "/", ""), swap]),
            &ImageOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "swap partition must not have a mountpoint (got \"/swap\")"
        );
    }

    #[test]
    fn test_swap_with_empty_mountpoint_is_accepted() {
        let mut swap = plain_swap();
        if let PartitionCustomization::Plain(p) = &mut swap {
            p.mountpoint = Some(String::new());
        }
        let mut swap_lv = swap_volume();
        swap_lv.mountpoint = Some(String::new());

        for bp in [
            disk_blueprint(vec![plain(FsType::Xfs, "/", ""), swap]),
            disk_blueprint(vec![lvm(vec![logical_volume(FsType::Xfs, "/", ""), swap_lv])]),
        ] {
            let result = check_customizations(kind("x86_64", "qcow2"), &bp, &ImageOptions::default());
            assert!(result.is_ok(), "{:?}", result);
        }
    }

    #[test]
    fn test_swap_volume_with_mountpoint_is_structural() {
        let mut swap = swap_volume();
        swap.mountpoint = Some("/swap".into());
        let err = check_customizations(
            kind("x86_64", "qcow2"),
            &disk_blueprint(vec![lvm(vec![logical_volume(FsType::Xfs, "/", ""), swap])]),
            &ImageOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::Structural(_)));
    }

    #[test]
    fn test_volume_group_rules() {
        let empty = disk_blueprint(vec![PartitionCustomization::Lvm(VolumeGroupCustomization {
            name: Some("vg0".into()),
            ..Default::default()
        })]);
        let err = check_customizations(kind("x86_64", "qcow2"), &empty, &ImageOptions::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "volume group vg0 has no logical volumes");

        let named = |name: &str, mp: &str| LogicalVolumeCustomization {
            name: Some(name.into()),
            ..logical_volume(FsType::Xfs, mp, "")
        };
        let dup = disk_blueprint(vec![lvm(vec![named("data", "/"), named("data", "/var")])]);
        let err =
            check_customizations(kind("x86_64", "qcow2"), &dup, &ImageOptions::default()).unwrap_err();
        assert!(err.to_string().contains("duplicate logical volume name \"data\""));

        let vfat = disk_blueprint(vec![lvm(vec![logical_volume(FsType::Vfat, "/data", "")])]);
        assert!(matches!(
            check_customizations(kind("x86_64", "qcow2"), &vfat, &ImageOptions::default()),
            Err(ManifestError::Structural(_))
        ));
    }

    #[test]
    fn test_duplicate_mountpoints() {
        let err = check_customizations(
            kind("x86_64", "qcow2"),
            &fs_blueprint(&["/var", "/var"]),
            &ImageOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "duplicate mountpoint \"/var\" in filesystem customizations"
        );
    }

    #[test]
    fn test_disk_mountpoints_use_path_policy() {
        let bp = disk_blueprint(vec![
            plain(FsType::Xfs, "/", ""),
            plain(FsType::Xfs, "/etc", ""),
            lvm(vec![logical_volume(FsType::Xfs, "/var//log", "")]),
        ]);
        let err = check_customizations(kind("x86_64", "qcow2"), &bp, &ImageOptions::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "The following errors occurred while setting up custom mountpoints:\n\
             path \"/etc\" is not allowed\n\
             path \"/var//log\" must be canonical"
        );
    }

    #[test]
    fn test_swap_feature_gate_per_arch() {
        let bp = disk_blueprint(vec![plain(FsType::Xfs, "/", ""), plain_swap()]);
        assert!(check_customizations(kind("x86_64", "qcow2"), &bp, &ImageOptions::default()).is_ok());
        let err = check_customizations(kind("aarch64", "qcow2"), &bp, &ImageOptions::default())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "swap partition creation is not supported on rhel-8.10 aarch64"
        );
    }
}
