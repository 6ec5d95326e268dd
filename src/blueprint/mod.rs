//! Blueprint model: the caller's customization request.
//!
//! Blueprints are plain data. They are parsed from TOML by [`crate::config`]
//! or built in code, and are only read by the validator and the builders.
//!
//! ```toml
//! name = "base"
//!
//! [[packages]]
//! name = "tmux"
//!
//! [customizations.kernel]
//! append = "debug"
//!
//! [[customizations.filesystem]]
//! mountpoint = "/var/log"
//! minsize = "2 GiB"
//! ```

pub mod size;

pub use size::{DataSize, GIB, KIB, MIB, TIB};

use serde::{Deserialize, Serialize};

/// A user-supplied image description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blueprint {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub packages: Vec<Package>,
    #[serde(default)]
    pub modules: Vec<Package>,
    #[serde(default)]
    pub customizations: Option<Customizations>,
}

impl Blueprint {
    /// Blueprint carrying only the given customizations.
    pub fn with_customizations(customizations: Customizations) -> Self {
        Self {
            customizations: Some(customizations),
            ..Default::default()
        }
    }

    pub fn filesystems(&self) -> &[FilesystemCustomization] {
        self.customizations
            .as_ref()
            .map(|c| c.filesystem.as_slice())
            .unwrap_or(&[])
    }

    pub fn disk(&self) -> Option<&DiskCustomization> {
        self.customizations.as_ref().and_then(|c| c.disk.as_ref())
    }

    pub fn kernel(&self) -> Option<&KernelCustomization> {
        self.customizations.as_ref().and_then(|c| c.kernel.as_ref())
    }
}

/// A package (or module) selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

impl Package {
    /// Package spec handed to the resolver: `name` or `name-version`.
    ///
    /// An empty version or the `*` wildcard selects any version.
    pub fn spec(&self) -> String {
        match self.version.as_deref().map(str::trim) {
            Some(v) if !v.is_empty() && v != "*" => format!("{}-{}", self.name, v),
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customizations {
    #[serde(default)]
    pub filesystem: Vec<FilesystemCustomization>,
    #[serde(default)]
    pub disk: Option<DiskCustomization>,
    #[serde(default)]
    pub kernel: Option<KernelCustomization>,
}

/// Legacy mount-point request: a mount point and its minimum size.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilesystemCustomization {
    pub mountpoint: String,
    #[serde(default)]
    pub minsize: DataSize,
}

impl FilesystemCustomization {
    pub fn new(mountpoint: impl Into<String>, minsize: u64) -> Self {
        Self {
            mountpoint: mountpoint.into(),
            minsize: DataSize(minsize),
        }
    }
}

/// Structured partitioning request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskCustomization {
    #[serde(default)]
    pub minsize: DataSize,
    #[serde(default)]
    pub partitions: Vec<PartitionCustomization>,
}

impl DiskCustomization {
    pub fn is_empty(&self) -> bool {
        self.minsize.is_zero() && self.partitions.is_empty()
    }

    /// Every mount point in declaration order, logical volumes included.
    pub fn mountpoints(&self) -> Vec<&str> {
        let mut mountpoints = Vec::new();
        for partition in &self.partitions {
            match partition {
                PartitionCustomization::Plain(plain) => {
                    mountpoints.extend(plain.mountpoint());
                }
                PartitionCustomization::Lvm(vg) => {
                    for lv in &vg.logical_volumes {
                        mountpoints.extend(lv.mountpoint());
                    }
                }
            }
        }
        mountpoints
    }

    /// True if any entry, at any depth, is a swap area.
    pub fn has_swap(&self) -> bool {
        self.partitions.iter().any(|partition| match partition {
            PartitionCustomization::Plain(plain) => plain.fs_type == FsType::Swap,
            PartitionCustomization::Lvm(vg) => {
                vg.logical_volumes.iter().any(|lv| lv.fs_type == FsType::Swap)
            }
        })
    }
}

/// One top-level entry of a disk customization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PartitionCustomization {
    Plain(PlainPartitionCustomization),
    Lvm(VolumeGroupCustomization),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainPartitionCustomization {
    #[serde(default)]
    pub minsize: DataSize,
    #[serde(default)]
    pub fs_type: FsType,
    #[serde(default)]
    pub mountpoint: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

impl PlainPartitionCustomization {
    /// The mount point; an empty string counts as none.
    pub fn mountpoint(&self) -> Option<&str> {
        non_empty(self.mountpoint.as_deref())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeGroupCustomization {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub minsize: DataSize,
    #[serde(default)]
    pub logical_volumes: Vec<LogicalVolumeCustomization>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalVolumeCustomization {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub minsize: DataSize,
    #[serde(default)]
    pub fs_type: FsType,
    #[serde(default)]
    pub mountpoint: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

impl LogicalVolumeCustomization {
    /// The mount point; an empty string counts as none.
    pub fn mountpoint(&self) -> Option<&str> {
        non_empty(self.mountpoint.as_deref())
    }
}

fn non_empty(mountpoint: Option<&str>) -> Option<&str> {
    mountpoint.filter(|mp| !mp.is_empty())
}

/// Filesystem types a customization may request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FsType {
    Ext4,
    #[default]
    Xfs,
    Vfat,
    Swap,
}

impl FsType {
    pub fn as_str(self) -> &'static str {
        match self {
            FsType::Ext4 => "ext4",
            FsType::Xfs => "xfs",
            FsType::Vfat => "vfat",
            FsType::Swap => "swap",
        }
    }
}

/// Kernel package and boot parameter customization.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelCustomization {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub append: String,
}

impl KernelCustomization {
    pub fn is_empty(&self) -> bool {
        self.name.as_deref().map_or(true, |n| n.trim().is_empty()) && self.append.trim().is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helper functions for readable disk customizations
// ─────────────────────────────────────────────────────────────────────────────

/// A plain partition with a filesystem mounted at `mountpoint`.
pub fn plain(fs_type: FsType, mountpoint: &str, label: &str) -> PartitionCustomization {
    PartitionCustomization::Plain(PlainPartitionCustomization {
        fs_type,
        mountpoint: Some(mountpoint.to_string()),
        label: (!label.is_empty()).then(|| label.to_string()),
        ..Default::default()
    })
}

/// A plain swap partition.
pub fn plain_swap() -> PartitionCustomization {
    PartitionCustomization::Plain(PlainPartitionCustomization {
        fs_type: FsType::Swap,
        ..Default::default()
    })
}

/// A logical volume with a filesystem mounted at `mountpoint`.
pub fn logical_volume(fs_type: FsType, mountpoint: &str, label: &str) -> LogicalVolumeCustomization {
    LogicalVolumeCustomization {
        fs_type,
        mountpoint: Some(mountpoint.to_string()),
        label: (!label.is_empty()).then(|| label.to_string()),
        ..Default::default()
    }
}

/// A swap logical volume.
pub fn swap_volume() -> LogicalVolumeCustomization {
    LogicalVolumeCustomization {
        fs_type: FsType::Swap,
        ..Default::default()
    }
}

/// An unnamed volume group holding `logical_volumes`.
pub fn lvm(logical_volumes: Vec<LogicalVolumeCustomization>) -> PartitionCustomization {
    PartitionCustomization::Lvm(VolumeGroupCustomization {
        logical_volumes,
        ..Default::default()
    })
}
