//! Partition tables produced for disk-bearing image kinds.
//!
//! ```text
//!   base::base_table ──┐
//!                      ├──► PartitionTable ──► relayout(image size)
//!   builder::* ────────┘        │
//!                               ├─ Partition (plain filesystem)
//!                               └─ Partition (LVM) ─► VolumeGroup ─► LogicalVolume
//! ```
//!
//! Sizes are in bytes. Partitions are aligned to [`ALIGNMENT`], logical
//! volumes to [`EXTENT_SIZE`].

pub mod base;
pub mod builder;

pub use builder::{from_disk_customization, from_filesystems};

use serde::Serialize;

use crate::blueprint::{FsType, MIB};
use crate::error::{ManifestError, Result};

/// Partition start and size alignment.
pub const ALIGNMENT: u64 = MIB;

/// LVM physical extent size.
pub const EXTENT_SIZE: u64 = 4 * MIB;

/// Space before the first partition (label and GPT header).
const HEADER_SIZE: u64 = MIB;

/// Space after the last partition (GPT backup header).
const FOOTER_SIZE: u64 = MIB;

/// Partition table label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TableLabel {
    Gpt,
    Dos,
}

impl TableLabel {
    /// Maximum number of partitions the label can hold, if limited.
    pub fn max_partitions(self) -> Option<usize> {
        match self {
            TableLabel::Gpt => None,
            TableLabel::Dos => Some(4),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartitionRole {
    BiosBoot,
    Prep,
    Esp,
    Data,
    Lvm,
    Swap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PartitionTable {
    pub label: TableLabel,
    pub size: u64,
    pub partitions: Vec<Partition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Partition {
    pub start: u64,
    pub size: u64,
    pub role: PartitionRole,
    pub bootable: bool,
    pub payload: Option<Payload>,
}

/// What a partition holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Payload {
    Filesystem(Filesystem),
    VolumeGroup(VolumeGroup),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Filesystem {
    pub fs_type: FsType,
    /// Absent for swap.
    pub mountpoint: Option<String>,
    pub label: Option<String>,
    pub fstab_options: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeGroup {
    pub name: String,
    pub logical_volumes: Vec<LogicalVolume>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogicalVolume {
    pub name: String,
    pub size: u64,
    pub filesystem: Filesystem,
}

impl Filesystem {
    pub fn new(fs_type: FsType, mountpoint: Option<&str>, label: Option<&str>) -> Self {
        Self {
            fs_type,
            mountpoint: mountpoint.map(str::to_string),
            label: label.map(str::to_string),
            fstab_options: "defaults".to_string(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.mountpoint.as_deref() == Some("/")
    }

    fn is_mounted_at(&self, mountpoint: &str) -> bool {
        self.mountpoint.as_deref() == Some(mountpoint)
    }
}

impl Partition {
    /// A partition with no filesystem (BIOS boot, PReP).
    pub fn raw(size: u64, role: PartitionRole) -> Self {
        Self {
            start: 0,
            size,
            role,
            bootable: false,
            payload: None,
        }
    }

    pub fn with_filesystem(size: u64, role: PartitionRole, filesystem: Filesystem) -> Self {
        Self {
            start: 0,
            size,
            role,
            bootable: false,
            payload: Some(Payload::Filesystem(filesystem)),
        }
    }

    pub fn with_volume_group(size: u64, volume_group: VolumeGroup) -> Self {
        Self {
            start: 0,
            size,
            role: PartitionRole::Lvm,
            bootable: false,
            payload: Some(Payload::VolumeGroup(volume_group)),
        }
    }

    pub fn filesystem(&self) -> Option<&Filesystem> {
        match &self.payload {
            Some(Payload::Filesystem(fs)) => Some(fs),
            _ => None,
        }
    }

    pub fn volume_group(&self) -> Option<&VolumeGroup> {
        match &self.payload {
            Some(Payload::VolumeGroup(vg)) => Some(vg),
            _ => None,
        }
    }

    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.size)
    }
}

impl VolumeGroup {
    pub fn contains_root(&self) -> bool {
        self.logical_volumes.iter().any(|lv| lv.filesystem.is_root())
    }
}

impl PartitionTable {
    pub fn new(label: TableLabel) -> Self {
        Self {
            label,
            size: 0,
            partitions: Vec::new(),
        }
    }

    /// Every mount point in partition order, logical volumes included.
    pub fn mountpoints(&self) -> Vec<&str> {
        let mut mountpoints = Vec::new();
        for partition in &self.partitions {
            match &partition.payload {
                Some(Payload::Filesystem(fs)) => mountpoints.extend(fs.mountpoint.as_deref()),
                Some(Payload::VolumeGroup(vg)) => {
                    for lv in &vg.logical_volumes {
                        mountpoints.extend(lv.filesystem.mountpoint.as_deref());
                    }
                }
                None => {}
            }
        }
        mountpoints
    }

    pub fn contains_mountpoint(&self, mountpoint: &str) -> bool {
        self.mountpoints().contains(&mountpoint)
    }

    /// Size of the partition or logical volume mounted at `mountpoint`.
    pub fn size_of(&self, mountpoint: &str) -> Option<u64> {
        for partition in &self.partitions {
            match &partition.payload {
                Some(Payload::Filesystem(fs)) if fs.is_mounted_at(mountpoint) => {
                    return Some(partition.size)
                }
                Some(Payload::VolumeGroup(vg)) => {
                    if let Some(lv) = vg
                        .logical_volumes
                        .iter()
                        .find(|lv| lv.filesystem.is_mounted_at(mountpoint))
                    {
                        return Some(lv.size);
                    }
                }
                _ => {}
            }
        }
        None
    }

    pub fn volume_group_mut(&mut self) -> Option<&mut VolumeGroup> {
        self.partitions.iter_mut().find_map(|p| match &mut p.payload {
            Some(Payload::VolumeGroup(vg)) => Some(vg),
            _ => None,
        })
    }

    /// Raise the entry mounted at `mountpoint` to at least `size`.
    ///
    /// Returns false if no entry has that mount point.
    pub fn grow_mountpoint(&mut self, mountpoint: &str, size: u64) -> bool {
        for partition in &mut self.partitions {
            match &mut partition.payload {
                Some(Payload::Filesystem(fs)) if fs.is_mounted_at(mountpoint) => {
                    partition.size = partition.size.max(size);
                    return true;
                }
                Some(Payload::VolumeGroup(vg)) => {
                    if let Some(lv) = vg
                        .logical_volumes
                        .iter_mut()
                        .find(|lv| lv.filesystem.is_mounted_at(mountpoint))
                    {
                        lv.size = lv.size.max(size);
                        return true;
                    }
                }
                _ => {}
            }
        }
        false
    }

    /// Align every entry, let the root entry absorb space up to `min_size`
    /// and assign partition offsets.
    ///
    /// Fails if any size, once aligned and summed, does not fit in a `u64`.
    pub fn relayout(&mut self, min_size: u64) -> Result<()> {
        for partition in &mut self.partitions {
            if let Some(Payload::VolumeGroup(vg)) = &mut partition.payload {
                let mut needed = EXTENT_SIZE;
                for lv in &mut vg.logical_volumes {
                    lv.size = align_up(lv.size, EXTENT_SIZE).ok_or_else(overflow)?;
                    needed = needed.checked_add(lv.size).ok_or_else(overflow)?;
                }
                partition.size = partition.size.max(needed);
            }
            partition.size = align_up(partition.size, ALIGNMENT).ok_or_else(overflow)?;
        }

        let used = self
            .partitions
            .iter()
            .try_fold(HEADER_SIZE + FOOTER_SIZE, |acc, p| acc.checked_add(p.size))
            .ok_or_else(overflow)?;
        if min_size > used {
            self.grow_root(min_size - used)?;
        }

        let mut start = HEADER_SIZE;
        for partition in &mut self.partitions {
            partition.start = start;
            start = start.checked_add(partition.size).ok_or_else(overflow)?;
        }
        let end = start.checked_add(FOOTER_SIZE).ok_or_else(overflow)?;
        self.size = min_size.max(end);
        Ok(())
    }

    fn grow_root(&mut self, extra: u64) -> Result<()> {
        for partition in &mut self.partitions {
            match &mut partition.payload {
                Some(Payload::Filesystem(fs)) if fs.is_root() => {
                    partition.size = partition
                        .size
                        .checked_add(align_down(extra, ALIGNMENT))
                        .ok_or_else(overflow)?;
                    return Ok(());
                }
                Some(Payload::VolumeGroup(vg)) => {
                    if let Some(lv) = vg.logical_volumes.iter_mut().find(|lv| lv.filesystem.is_root()) {
                        let grow = align_down(extra, EXTENT_SIZE);
                        lv.size = lv.size.checked_add(grow).ok_or_else(overflow)?;
                        partition.size = partition.size.checked_add(grow).ok_or_else(overflow)?;
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }
}

/// Round `size` up to a multiple of `alignment`; `None` on overflow.
pub fn align_up(size: u64, alignment: u64) -> Option<u64> {
    size.div_ceil(alignment).checked_mul(alignment)
}

pub fn align_down(size: u64, alignment: u64) -> u64 {
    size / alignment * alignment
}

fn overflow() -> ManifestError {
    ManifestError::structural("partition layout exceeds the maximum representable disk size")
}
