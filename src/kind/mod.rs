//! Image kind capability descriptors.
//!
//! An [`ImageKind`] is plain data: output descriptor, category, capability
//! mask, package templates and layout. Behaviour is selected by matching on
//! [`Category`] and [`Capabilities`], never by per-kind types.
//!
//! Kinds are declared as [`KindTemplate`] constants and instantiated once per
//! architecture, which binds them to a shared [`Platform`].

use std::sync::Arc;

use serde::Serialize;

use crate::blueprint::{Blueprint, MIB};
use crate::error::{ManifestError, Result};
use crate::manifest::Manifest;
use crate::options::ImageOptions;
use crate::validate::PathPolicy;

/// What an image kind produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    /// Tarball of an OSTree repository with a single commit.
    OstreeCommit,
    /// OCI container serving an OSTree commit.
    OstreeContainer,
    /// Bootable ISO installer.
    Installer,
    /// Bootable disk image.
    Disk,
    /// Filesystem tree archive.
    Archive,
}

impl Category {
    /// Kinds whose payload is an OSTree commit rather than a deployment.
    pub fn is_ostree_payload(self) -> bool {
        matches!(self, Category::OstreeCommit | Category::OstreeContainer)
    }
}

/// Artifact filename and MIME type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OutputDescriptor {
    pub filename: String,
    pub mime_type: String,
}

/// Which customization categories an image kind accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Capabilities {
    pub filesystem: bool,
    pub disk: bool,
    pub kernel: bool,
    /// The kind deploys an existing OSTree commit and needs its URL.
    pub ostree_source: bool,
}

impl Capabilities {
    pub const ALL: Capabilities = Capabilities {
        filesystem: true,
        disk: true,
        kernel: true,
        ostree_source: false,
    };

    pub const OSTREE_PAYLOAD: Capabilities = Capabilities {
        filesystem: false,
        disk: false,
        kernel: false,
        ostree_source: false,
    };

    pub const OSTREE_DEPLOYMENT: Capabilities = Capabilities {
        filesystem: false,
        disk: false,
        kernel: true,
        ostree_source: true,
    };

    pub const NO_DISK: Capabilities = Capabilities {
        filesystem: true,
        disk: false,
        kernel: true,
        ostree_source: false,
    };
}

/// Boot partitions an architecture needs in front of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BootScheme {
    /// GPT with a BIOS boot partition and an ESP.
    Hybrid,
    /// GPT with an ESP.
    Uefi,
    /// DOS label with a PReP boot partition.
    Prep,
    /// DOS label, zipl reads the boot partition directly.
    Zipl,
}

/// Per-architecture feature flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArchFeatures {
    pub swap_partitions: bool,
    pub boot: BootScheme,
}

/// Base partition layout an image kind starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseLayout {
    /// Boot partitions plus a single xfs root.
    Plain,
    /// ESP, `/boot` and an LVM volume group with the usual system volumes.
    AzureLvm,
}

/// Facts shared by every image kind of one distribution/architecture pair.
#[derive(Debug, Clone)]
pub struct Platform {
    pub distro: String,
    pub arch: String,
    pub features: ArchFeatures,
    pub path_policy: PathPolicy,
    /// Minimum sizes for mount points the platform reserves.
    pub reserved_sizes: &'static [(&'static str, u64)],
    pub release_package: &'static str,
    /// Bootloader packages installed into disk-bearing payloads.
    pub boot_packages: &'static [&'static str],
    /// First ref components, e.g. `rhel/8`; `None` disables OSTree defaults.
    pub ostree_ref_prefix: Option<String>,
}

impl Platform {
    /// Reserved minimum size for `mountpoint`, if any.
    pub fn reserved_size(&self, mountpoint: &str) -> Option<u64> {
        self.reserved_sizes
            .iter()
            .find(|(mp, _)| *mp == mountpoint)
            .map(|(_, size)| *size)
    }
}

/// Include/exclude package lists of a template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackageTemplate {
    pub include: &'static [&'static str],
    pub exclude: &'static [&'static str],
}

/// Static declaration of an image kind, independent of architecture.
#[derive(Debug, Clone, Copy)]
pub struct KindTemplate {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub filename: &'static str,
    pub mime_type: &'static str,
    pub category: Category,
    pub capabilities: Capabilities,
    pub default_size: u64,
    /// Round requested sizes up to whole MiB (VHD requirement).
    pub mib_aligned: bool,
    pub payload: Option<PackageTemplate>,
    pub installer: Option<PackageTemplate>,
    pub kernel_options: &'static str,
    pub layout: Option<BaseLayout>,
}

impl KindTemplate {
    /// Bind the template to an architecture.
    pub fn instantiate(&self, platform: &Arc<Platform>, build_packages: &[&str]) -> ImageKind {
        ImageKind {
            name: self.name.to_string(),
            aliases: self.aliases.iter().map(|a| a.to_string()).collect(),
            output: OutputDescriptor {
                filename: self.filename.to_string(),
                mime_type: self.mime_type.to_string(),
            },
            category: self.category,
            capabilities: self.capabilities,
            default_size: self.default_size,
            mib_aligned: self.mib_aligned,
            build_packages: build_packages.iter().map(|p| p.to_string()).collect(),
            payload: self.payload,
            installer: self.installer,
            kernel_options: self
                .kernel_options
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            layout: self.layout,
            platform: Arc::clone(platform),
        }
    }
}

/// Leaf capability unit of the registry.
#[derive(Debug, Clone)]
pub struct ImageKind {
    name: String,
    aliases: Vec<String>,
    output: OutputDescriptor,
    category: Category,
    capabilities: Capabilities,
    default_size: u64,
    mib_aligned: bool,
    build_packages: Vec<String>,
    payload: Option<PackageTemplate>,
    installer: Option<PackageTemplate>,
    kernel_options: Vec<String>,
    layout: Option<BaseLayout>,
    platform: Arc<Platform>,
}

impl ImageKind {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn output(&self) -> &OutputDescriptor {
        &self.output
    }

    pub fn filename(&self) -> &str {
        &self.output.filename
    }

    pub fn mime_type(&self) -> &str {
        &self.output.mime_type
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    pub fn default_size(&self) -> u64 {
        self.default_size
    }

    /// Effective image size for a requested size; zero selects the default.
    pub fn size(&self, requested: u64) -> Result<u64> {
        let size = if requested == 0 {
            self.default_size
        } else {
            requested
        };
        if !self.mib_aligned {
            return Ok(size);
        }
        size.div_ceil(MIB).checked_mul(MIB).ok_or_else(|| {
            ManifestError::InvalidImageOptions(format!(
                "image size of {} bytes cannot be rounded up to a whole MiB",
                size
            ))
        })
    }

    pub fn build_packages(&self) -> &[String] {
        &self.build_packages
    }

    pub fn payload_template(&self) -> Option<&PackageTemplate> {
        self.payload.as_ref()
    }

    pub fn installer_template(&self) -> Option<&PackageTemplate> {
        self.installer.as_ref()
    }

    pub fn kernel_options(&self) -> &[String] {
        &self.kernel_options
    }

    pub fn layout(&self) -> Option<BaseLayout> {
        self.layout
    }

    /// Whether manifests of this kind carry a partition table.
    pub fn has_partition_table(&self) -> bool {
        self.layout.is_some()
    }

    pub fn platform(&self) -> &Platform {
        &self.platform
    }

    pub fn distro_name(&self) -> &str {
        &self.platform.distro
    }

    pub fn arch_name(&self) -> &str {
        &self.platform.arch
    }

    /// Validate `blueprint` and assemble the manifest for this kind.
    pub fn manifest(&self, blueprint: &Blueprint, options: &ImageOptions) -> Result<Manifest> {
        crate::manifest::assemble(self, blueprint, options)
    }
}
