//! Per-architecture base partition tables.

use crate::blueprint::{FsType, GIB, MIB};
use crate::kind::{BaseLayout, BootScheme};

use super::{
    Filesystem, LogicalVolume, Partition, PartitionRole, PartitionTable, TableLabel, VolumeGroup,
};

/// Root filesystem size when nothing larger is requested.
pub const DEFAULT_ROOT_SIZE: u64 = 2 * GIB;

/// Size of a `/boot` partition added in front of an LVM root.
pub const DEFAULT_BOOT_SIZE: u64 = GIB;

const BIOS_BOOT_SIZE: u64 = MIB;
const PREP_SIZE: u64 = 4 * MIB;
/// EFI system partition size outside the Azure layout.
pub const ESP_SIZE: u64 = 200 * MIB;
const AZURE_ESP_SIZE: u64 = 500 * MIB;
const AZURE_BOOT_SIZE: u64 = 500 * MIB;

const ESP_FSTAB_OPTIONS: &str = "defaults,uid=0,gid=0,umask=077,shortname=winnt";

/// Volumes of the Azure LVM layout: (name, mount point, size).
const AZURE_VOLUMES: &[(&str, &str, u64)] = &[
    ("rootlv", "/", 2 * GIB),
    ("homelv", "/home", GIB),
    ("tmplv", "/tmp", 2 * GIB),
    ("usrlv", "/usr", 10 * GIB),
    ("varlv", "/var", 10 * GIB),
];

/// Table label and firmware partitions a boot scheme needs.
pub fn boot_partitions(scheme: BootScheme, esp_size: u64) -> (TableLabel, Vec<Partition>) {
    match scheme {
        BootScheme::Hybrid => (
            TableLabel::Gpt,
            vec![
                Partition::raw(BIOS_BOOT_SIZE, PartitionRole::BiosBoot),
                esp(esp_size),
            ],
        ),
        BootScheme::Uefi => (TableLabel::Gpt, vec![esp(esp_size)]),
        BootScheme::Prep => {
            let mut prep = Partition::raw(PREP_SIZE, PartitionRole::Prep);
            prep.bootable = true;
            (TableLabel::Dos, vec![prep])
        }
        BootScheme::Zipl => (TableLabel::Dos, Vec::new()),
    }
}

fn esp(size: u64) -> Partition {
    let mut filesystem = Filesystem::new(FsType::Vfat, Some("/boot/efi"), Some("EFI-SYSTEM"));
    filesystem.fstab_options = ESP_FSTAB_OPTIONS.to_string();
    Partition::with_filesystem(size, PartitionRole::Esp, filesystem)
}

pub fn root_partition(size: u64) -> Partition {
    Partition::with_filesystem(
        size,
        PartitionRole::Data,
        Filesystem::new(FsType::Xfs, Some("/"), Some("root")),
    )
}

pub fn boot_partition(size: u64) -> Partition {
    Partition::with_filesystem(
        size,
        PartitionRole::Data,
        Filesystem::new(FsType::Xfs, Some("/boot"), Some("boot")),
    )
}

/// Starting table for an image kind before customizations are applied.
pub fn base_table(layout: BaseLayout, scheme: BootScheme) -> PartitionTable {
    let mut table = match layout {
        BaseLayout::Plain => {
            let (label, mut partitions) = boot_partitions(scheme, ESP_SIZE);
            partitions.push(root_partition(DEFAULT_ROOT_SIZE));
            PartitionTable {
                label,
                size: 0,
                partitions,
            }
        }
        BaseLayout::AzureLvm => {
            let (label, mut partitions) = boot_partitions(scheme, AZURE_ESP_SIZE);
            partitions.push(boot_partition(AZURE_BOOT_SIZE));
            partitions.push(Partition::with_volume_group(
                0,
                VolumeGroup {
                    name: "rootvg".to_string(),
                    logical_volumes: AZURE_VOLUMES
                        .iter()
                        .map(|(name, mountpoint, size)| LogicalVolume {
                            name: name.to_string(),
                            size: *size,
                            filesystem: Filesystem::new(FsType::Xfs, Some(*mountpoint), None),
                        })
                        .collect(),
                },
            ));
            PartitionTable {
                label,
                size: 0,
                partitions,
            }
        }
    };
    mark_boot_partition(&mut table, scheme);
    table
}

/// zipl needs the partition holding `/boot`, or `/` without one, flagged
/// bootable.
pub fn mark_boot_partition(table: &mut PartitionTable, scheme: BootScheme) {
    if scheme != BootScheme::Zipl {
        return;
    }
    for partition in &mut table.partitions {
        partition.bootable = false;
    }
    let target = ["/boot", "/"].into_iter().find_map(|mountpoint| {
        table.partitions.iter().position(|p| {
            p.filesystem()
                .is_some_and(|fs| fs.mountpoint.as_deref() == Some(mountpoint))
        })
    });
    if let Some(index) = target {
        table.partitions[index].bootable = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_x86_64_plain_table() {
        let table = base_table(BaseLayout::Plain, BootScheme::Hybrid);
        assert_eq!(table.label, TableLabel::Gpt);
        let roles: Vec<_> = table.partitions.iter().map(|p| p.role).collect();
        assert_eq!(
            roles,
            vec![PartitionRole::BiosBoot, PartitionRole::Esp, PartitionRole::Data]
        );
        assert_eq!(table.mountpoints(), vec!["/boot/efi", "/"]);
        assert_eq!(table.size_of("/boot/efi"), Some(200 * MIB));
    }

    #[test]
    fn test_power_and_z_tables_are_dos() {
        let ppc = base_table(BaseLayout::Plain, BootScheme::Prep);
        assert_eq!(ppc.label, TableLabel::Dos);
        assert!(ppc.partitions[0].bootable);
        assert_eq!(ppc.partitions[0].role, PartitionRole::Prep);

        let z = base_table(BaseLayout::Plain, BootScheme::Zipl);
        assert_eq!(z.label, TableLabel::Dos);
        assert_eq!(z.partitions.len(), 1);
        assert!(z.partitions[0].bootable);
    }

    #[test]
    fn test_azure_lvm_table() {
        let table = base_table(BaseLayout::AzureLvm, BootScheme::Uefi);
        assert_eq!(
            table.mountpoints(),
            vec!["/boot/efi", "/boot", "/", "/home", "/tmp", "/usr", "/var"]
        );
        assert_eq!(table.size_of("/boot/efi"), Some(500 * MIB));
        assert_eq!(table.size_of("/usr"), Some(10 * GIB));
        assert_eq!(table.partitions[2].volume_group().unwrap().name, "rootvg");
    }
}
