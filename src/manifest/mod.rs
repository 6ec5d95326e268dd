//! Manifest assembly.
//!
//! ```text
//!   ImageKind + Blueprint + ImageOptions
//!        │
//!        ├─► validate::check_customizations
//!        ├─► ostree::resolve
//!        ├─► disk::from_disk_customization | disk::from_filesystems
//!        └─► packages::package_set_chains
//!        │
//!        ▼
//!     Manifest  (or the first error, never both)
//! ```

pub mod ostree;
pub mod packages;

pub use ostree::OstreeSource;
pub use packages::{PackageSet, PackageSetChains};

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::blueprint::Blueprint;
use crate::disk::{self, PartitionTable};
use crate::error::Result;
use crate::kind::{BaseLayout, ImageKind, OutputDescriptor};
use crate::options::ImageOptions;
use crate::validate::check_customizations;

/// Fully resolved build description for one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub distro: String,
    pub arch: String,
    pub image_kind: String,
    pub output: OutputDescriptor,
    /// Image size in bytes; the partition table size for disk-bearing kinds.
    pub size: u64,
    pub partition_table: Option<PartitionTable>,
    pub package_set_chains: PackageSetChains,
    pub kernel: KernelSpec,
    pub ostree: Option<OstreeSource>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KernelSpec {
    pub name: String,
    pub options: Vec<String>,
}

impl Manifest {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Hex SHA-256 of the manifest's JSON form.
    pub fn digest(&self) -> serde_json::Result<String> {
        let json = serde_json::to_vec(self)?;
        let mut hasher = Sha256::new();
        hasher.update(&json);
        Ok(format!("{:x}", hasher.finalize()))
    }
}

/// Validate the blueprint for `kind` and build its manifest.
pub fn assemble(kind: &ImageKind, blueprint: &Blueprint, options: &ImageOptions) -> Result<Manifest> {
    check_customizations(kind, blueprint, options)?;

    let ostree = ostree::resolve(kind, options)?;
    let image_size = kind.size(options.size.bytes())?;

    let partition_table = match kind.layout() {
        Some(layout) => Some(partition_table(kind, layout, blueprint, image_size)?),
        None => None,
    };
    let size = partition_table.as_ref().map_or(image_size, |table| table.size);

    let package_set_chains = packages::package_set_chains(kind, blueprint);

    let mut kernel_options = kind.kernel_options().to_vec();
    if let Some(kernel) = blueprint.kernel() {
        kernel_options.extend(kernel.append.split_whitespace().map(str::to_string));
    }
    let kernel = KernelSpec {
        name: packages::kernel_name(blueprint).to_string(),
        options: kernel_options,
    };

    debug!(
        distro = kind.distro_name(),
        arch = kind.arch_name(),
        kind = kind.name(),
        size,
        chains = package_set_chains.len(),
        "manifest assembled"
    );

    Ok(Manifest {
        distro: kind.distro_name().to_string(),
        arch: kind.arch_name().to_string(),
        image_kind: kind.name().to_string(),
        output: kind.output().clone(),
        size,
        partition_table,
        package_set_chains,
        kernel,
        ostree,
    })
}

fn partition_table(
    kind: &ImageKind,
    layout: BaseLayout,
    blueprint: &Blueprint,
    image_size: u64,
) -> Result<PartitionTable> {
    match blueprint.disk().filter(|d| !d.is_empty()) {
        Some(customization) => disk::from_disk_customization(kind.platform(), customization, image_size),
        None => disk::from_filesystems(kind.platform(), layout, blueprint.filesystems(), image_size),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{Customizations, FilesystemCustomization, KernelCustomization, GIB, MIB};
    use crate::error::ManifestError;
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

    #[test]
    fn test_disk_manifest_has_partition_table() {
        let manifest = assemble(kind("x86_64", "qcow2"), &Blueprint::default(), &ImageOptions::default())
            .unwrap();
        assert_eq!(manifest.output.filename, "disk.qcow2");
        assert_eq!(manifest.size, 10 * GIB);
        let table = manifest.partition_table.unwrap();
        assert_eq!(table.size, 10 * GIB);
        assert!(table.contains_mountpoint("/"));
    }

    #[test]
    fn test_archive_manifest_has_no_partition_table() {
        let manifest =
            assemble(kind("x86_64", "tar"), &Blueprint::default(), &ImageOptions::with_size(GIB)).unwrap();
        assert!(manifest.partition_table.is_none());
        assert_eq!(manifest.size, GIB);
        assert!(manifest.ostree.is_none());
    }

    #[test]
    fn test_vhd_size_rounds_to_mib() {
        let manifest = assemble(
            kind("x86_64", "vhd"),
            &Blueprint::default(),
            &ImageOptions::with_size(5 * GIB + 1),
        )
        .unwrap();
        assert_eq!(manifest.size, 5 * GIB + MIB);
    }

    #[test]
    fn test_kernel_options_append_blueprint_words() {
        let blueprint = Blueprint::with_customizations(Customizations {
            kernel: Some(KernelCustomization {
                name: None,
                append: "debug  nosmt=force".into(),
            }),
            ..Default::default()
        });
        let manifest = assemble(kind("x86_64", "qcow2"), &blueprint, &ImageOptions::default()).unwrap();
        let options = &manifest.kernel.options;
        assert_eq!(options.first().map(String::as_str), Some("console=tty0"));
        assert_eq!(&options[options.len() - 2..], &["debug".to_string(), "nosmt=force".to_string()]);
        assert_eq!(manifest.kernel.name, "kernel");
    }

    #[test]
    fn test_commit_manifest_carries_ostree_source() {
        let manifest = assemble(
            kind("aarch64", "edge-commit"),
            &Blueprint::default(),
            &ImageOptions::default(),
        )
        .unwrap();
        assert_eq!(manifest.ostree.unwrap().image_ref, "rhel/8/aarch64/edge");
        assert!(manifest.partition_table.is_none());
    }

    #[test]
    fn test_failure_is_atomic() {
        let blueprint = Blueprint::with_customizations(Customizations {
            filesystem: vec![FilesystemCustomization::new("/etc", GIB)],
            ..Default::default()
        });
        let result = assemble(kind("x86_64", "qcow2"), &blueprint, &ImageOptions::default());
        assert!(matches!(result, Err(ManifestError::PathValidation(_))));
    }

    #[test]
    fn test_json_and_digest_are_stable() {
        let a = assemble(kind("x86_64", "ami"), &Blueprint::default(), &ImageOptions::default()).unwrap();
        let b = assemble(kind("x86_64", "ami"), &Blueprint::default(), &ImageOptions::default()).unwrap();
        assert_eq!(a.to_json().unwrap(), b.to_json().unwrap());
        let digest = a.digest().unwrap();
        assert_eq!(digest, b.digest().unwrap());
        assert_eq!(digest.len(), 64);

        let json: serde_json::Value = serde_json::from_str(&a.to_json().unwrap()).unwrap();
        assert_eq!(json["image_kind"], "ami");
        assert_eq!(json["partition_table"]["label"], "gpt");
        assert_eq!(json["partition_table"]["partitions"][0]["role"], "bios-boot");
    }
}
