//! Partition tables from blueprint customizations.
//!
//! Two entry points:
//! - [`from_filesystems`]: legacy mount-point list applied on top of the
//!   image kind's base table. Undersized reserved mount points are raised.
//! - [`from_disk_customization`]: structured plain/LVM tree laid out after
//!   the architecture's boot partitions. Undersized reserved mount points are
//!   rejected.
//!
//! Both expect customizations that already passed validation.

use std::collections::BTreeSet;

use tracing::debug;

use crate::blueprint::{DiskCustomization, FilesystemCustomization, FsType, PartitionCustomization, GIB};
use crate::error::{ManifestError, Result};
use crate::kind::{BaseLayout, Platform};

use super::base::{self, DEFAULT_BOOT_SIZE, DEFAULT_ROOT_SIZE, ESP_SIZE};
use super::{
    Filesystem, LogicalVolume, Partition, PartitionRole, PartitionTable, VolumeGroup,
};

/// Size of an entry that does not request one.
const DEFAULT_ENTRY_SIZE: u64 = GIB;

const DEFAULT_VG_NAME: &str = "rootvg";

const BOOT_MOUNTPOINT: &str = "/boot";

/// Apply a legacy mount-point list to the base table for `layout`.
pub fn from_filesystems(
    platform: &Platform,
    layout: BaseLayout,
    filesystems: &[FilesystemCustomization],
    image_size: u64,
) -> Result<PartitionTable> {
    let mut table = base::base_table(layout, platform.features.boot);

    for (index, fs) in filesystems.iter().enumerate() {
        let mountpoint = fs.mountpoint.as_str();
        let requested = match fs.minsize.bytes() {
            0 => DEFAULT_ENTRY_SIZE,
            n => n,
        };
        let size = platform
            .reserved_size(mountpoint)
            .map_or(requested, |min| requested.max(min));

        if table.grow_mountpoint(mountpoint, size) {
            continue;
        }
        if mountpoint == BOOT_MOUNTPOINT {
            add_legacy_boot(&mut table, size)?;
        } else {
            let boot_pending = !table.contains_mountpoint(BOOT_MOUNTPOINT)
                && filesystems[index + 1..]
                    .iter()
                    .any(|fs| fs.mountpoint == BOOT_MOUNTPOINT);
            add_legacy_entry(&mut table, mountpoint, size, usize::from(boot_pending));
        }
    }

    base::mark_boot_partition(&mut table, platform.features.boot);
    table.relayout(image_size)?;
    debug!(
        arch = %platform.arch,
        partitions = table.partitions.len(),
        size = table.size,
        "partition table built from filesystem customizations"
    );
    Ok(table)
}

/// New mount points become logical volumes once the table has a volume
/// group. A DOS table about to run out of primary slots gets one, keeping
/// `reserved` slots free for plain partitions still to come.
fn add_legacy_entry(table: &mut PartitionTable, mountpoint: &str, size: u64, reserved: usize) {
    let slots_exhausted = table
        .label
        .max_partitions()
        .is_some_and(|max| table.partitions.len() + 1 + reserved >= max);
    if slots_exhausted && table.volume_group_mut().is_none() {
        table.partitions.push(Partition::with_volume_group(
            0,
            VolumeGroup {
                name: DEFAULT_VG_NAME.to_string(),
                logical_volumes: Vec::new(),
            },
        ));
    }

    if let Some(vg) = table.volume_group_mut() {
        let taken: BTreeSet<String> = vg.logical_volumes.iter().map(|lv| lv.name.clone()).collect();
        let name = unique_name(&generated_lv_name(Some(mountpoint), FsType::Xfs), &taken);
        vg.logical_volumes.push(LogicalVolume {
            name,
            size,
            filesystem: Filesystem::new(FsType::Xfs, Some(mountpoint), None),
        });
        return;
    }

    table.partitions.push(Partition::with_filesystem(
        size,
        PartitionRole::Data,
        Filesystem::new(FsType::Xfs, Some(mountpoint), None),
    ));
}

/// `/boot` is always a plain partition, placed ahead of any volume group.
fn add_legacy_boot(table: &mut PartitionTable, size: u64) -> Result<()> {
    if let Some(max) = table.label.max_partitions() {
        if table.partitions.len() >= max {
            return Err(ManifestError::structural(format!(
                "no free partition slot for {} on a dos partition table with {} partitions",
                BOOT_MOUNTPOINT,
                table.partitions.len()
            )));
        }
    }
    let index = table
        .partitions
        .iter()
        .position(|p| p.role == PartitionRole::Lvm)
        .unwrap_or(table.partitions.len());
    table.partitions.insert(index, base::boot_partition(size));
    Ok(())
}

/// Lay out a structured disk customization.
pub fn from_disk_customization(
    platform: &Platform,
    disk: &DiskCustomization,
    image_size: u64,
) -> Result<PartitionTable> {
    let scheme = platform.features.boot;
    let (label, mut partitions) = base::boot_partitions(scheme, ESP_SIZE);

    let mut vg_names: BTreeSet<String> = disk
        .partitions
        .iter()
        .filter_map(|p| match p {
            PartitionCustomization::Lvm(vg) => vg.name.clone(),
            PartitionCustomization::Plain(_) => None,
        })
        .collect();

    for entry in &disk.partitions {
        match entry {
            PartitionCustomization::Plain(plain) => {
                let mountpoint = plain.mountpoint();
                let size = entry_size(platform, mountpoint, plain.minsize.bytes())?;
                let role = match plain.fs_type {
                    FsType::Swap => PartitionRole::Swap,
                    _ => PartitionRole::Data,
                };
                partitions.push(Partition::with_filesystem(
                    size,
                    role,
                    Filesystem::new(plain.fs_type, mountpoint, plain.label.as_deref()),
                ));
            }
            PartitionCustomization::Lvm(vg) => {
                let name = match &vg.name {
                    Some(name) => name.clone(),
                    None => {
                        let name = next_vg_name(&vg_names);
                        vg_names.insert(name.clone());
                        name
                    }
                };

                let mut lv_names: BTreeSet<String> =
                    vg.logical_volumes.iter().filter_map(|lv| lv.name.clone()).collect();
                let mut logical_volumes = Vec::with_capacity(vg.logical_volumes.len());
                for lv in &vg.logical_volumes {
                    let mountpoint = lv.mountpoint();
                    let size = entry_size(platform, mountpoint, lv.minsize.bytes())?;
                    let lv_name = match &lv.name {
                        Some(name) => name.clone(),
                        None => {
                            let name = unique_name(&generated_lv_name(mountpoint, lv.fs_type), &lv_names);
                            lv_names.insert(name.clone());
                            name
                        }
                    };
                    logical_volumes.push(LogicalVolume {
                        name: lv_name,
                        size,
                        filesystem: Filesystem::new(lv.fs_type, mountpoint, lv.label.as_deref()),
                    });
                }

                partitions.push(Partition::with_volume_group(
                    vg.minsize.bytes(),
                    VolumeGroup {
                        name,
                        logical_volumes,
                    },
                ));
            }
        }
    }

    let mut table = PartitionTable {
        label,
        size: 0,
        partitions,
    };

    if !table.contains_mountpoint("/") {
        table.partitions.push(base::root_partition(DEFAULT_ROOT_SIZE));
    }

    let root_on_lvm = table
        .partitions
        .iter()
        .any(|p| p.volume_group().is_some_and(VolumeGroup::contains_root));
    if root_on_lvm && !table.contains_mountpoint(BOOT_MOUNTPOINT) {
        if let Some(index) = table.partitions.iter().position(|p| p.role == PartitionRole::Lvm) {
            table
                .partitions
                .insert(index, base::boot_partition(DEFAULT_BOOT_SIZE));
        }
    }

    if let Some(max) = table.label.max_partitions() {
        if table.partitions.len() > max {
            return Err(ManifestError::structural(format!(
                "dos partition tables support at most {} partitions, but {} are required",
                max,
                table.partitions.len()
            )));
        }
    }

    base::mark_boot_partition(&mut table, scheme);
    table.relayout(image_size.max(disk.minsize.bytes()))?;
    debug!(
        arch = %platform.arch,
        partitions = table.partitions.len(),
        size = table.size,
        "partition table built from disk customization"
    );
    Ok(table)
}

/// Resolved size of a structured entry; reserved minimums are enforced.
fn entry_size(platform: &Platform, mountpoint: Option<&str>, requested: u64) -> Result<u64> {
    let reserved = mountpoint.and_then(|mp| platform.reserved_size(mp));

    match (requested, reserved) {
        (0, _) if mountpoint == Some("/") => Ok(DEFAULT_ROOT_SIZE),
        (0, reserved) => Ok(reserved.unwrap_or(DEFAULT_ENTRY_SIZE)),
        (requested, Some(required)) if requested < required => Err(ManifestError::Size {
            mountpoint: mountpoint.unwrap_or_default().to_string(),
            required,
            requested,
        }),
        (requested, _) => Ok(requested),
    }
}

/// `/` → `rootlv`, `/var/log` → `var_loglv`, swap → `swaplv`.
fn generated_lv_name(mountpoint: Option<&str>, fs_type: FsType) -> String {
    match (fs_type, mountpoint) {
        (FsType::Swap, _) => "swaplv".to_string(),
        (_, Some("/")) => "rootlv".to_string(),
        (_, Some(mp)) => format!("{}lv", mp.trim_start_matches('/').replace('/', "_")),
        (_, None) => "datalv".to_string(),
    }
}

fn unique_name(base: &str, taken: &BTreeSet<String>) -> String {
    if !taken.contains(base) {
        return base.to_string();
    }
    let mut n = 1;
    loop {
        let candidate = format!("{}{:02}", base, n);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn next_vg_name(taken: &BTreeSet<String>) -> String {
    if !taken.contains(DEFAULT_VG_NAME) {
        return DEFAULT_VG_NAME.to_string();
    }
    let mut n = 1;
    loop {
        let candidate = format!("vg{:02}", n);
        if !taken.contains(&candidate) {
            return candidate;
        }
        n += 1;
    }
}
