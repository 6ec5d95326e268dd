//! RHEL 8 family tables: image kinds, package templates and platforms.
//!
//! `rhel-8.10` registers every kind; `centos-8` shares the rules but omits
//! the RHUI, HA/SAP and edge kinds and has no s390x.

use std::sync::Arc;

use crate::blueprint::GIB;
use crate::kind::{
    ArchFeatures, BaseLayout, BootScheme, Capabilities, Category, KindTemplate, PackageTemplate,
    Platform,
};
use crate::validate::{PathPolicy, PathRule};

use super::{Architecture, Distribution};

// ─────────────────────────────────────────────────────────────────────────────
// Releases and architectures
// ─────────────────────────────────────────────────────────────────────────────

struct Release {
    name: &'static str,
    product: &'static str,
    os_version: &'static str,
    release_package: &'static str,
    ostree_ref_prefix: &'static str,
}

const RHEL_810: Release = Release {
    name: "rhel-8.10",
    product: "Red Hat Enterprise Linux",
    os_version: "8.10",
    release_package: "redhat-release",
    ostree_ref_prefix: "rhel/8",
};

const CENTOS_8: Release = Release {
    name: "centos-8",
    product: "CentOS Stream",
    os_version: "8",
    release_package: "centos-stream-release",
    ostree_ref_prefix: "centos/8",
};

const MODULE_PLATFORM_ID: &str = "platform:el8";

struct ArchSpec {
    name: &'static str,
    features: ArchFeatures,
    build_packages: &'static [&'static str],
    boot_packages: &'static [&'static str],
}

const X86_64: ArchSpec = ArchSpec {
    name: "x86_64",
    features: ArchFeatures {
        swap_partitions: true,
        boot: BootScheme::Hybrid,
    },
    build_packages: &[
        "dnf",
        "dosfstools",
        "e2fsprogs",
        "grub2-efi-x64",
        "grub2-pc",
        "policycoreutils",
        "shim-x64",
        "systemd",
        "tar",
        "qemu-img",
        "xz",
    ],
    boot_packages: &["dracut-config-generic", "efibootmgr", "grub2-efi-x64", "grub2-pc", "shim-x64"],
};

const AARCH64: ArchSpec = ArchSpec {
    name: "aarch64",
    features: ArchFeatures {
        swap_partitions: false,
        boot: BootScheme::Uefi,
    },
    build_packages: &[
        "dnf",
        "dosfstools",
        "e2fsprogs",
        "policycoreutils",
        "qemu-img",
        "systemd",
        "tar",
        "xz",
    ],
    boot_packages: &["dracut-config-generic", "efibootmgr", "grub2-efi-aa64", "grub2-tools", "shim-aa64"],
};

const PPC64LE: ArchSpec = ArchSpec {
    name: "ppc64le",
    features: ArchFeatures {
        swap_partitions: true,
        boot: BootScheme::Prep,
    },
    build_packages: &[
        "dnf",
        "dosfstools",
        "e2fsprogs",
        "policycoreutils",
        "qemu-img",
        "systemd",
        "tar",
        "xz",
        "grub2-ppc64le",
        "grub2-ppc64le-modules",
    ],
    boot_packages: &["dracut-config-generic", "powerpc-utils", "grub2-ppc64le", "grub2-ppc64le-modules"],
};

const S390X: ArchSpec = ArchSpec {
    name: "s390x",
    features: ArchFeatures {
        swap_partitions: true,
        boot: BootScheme::Zipl,
    },
    build_packages: &[
        "dnf",
        "dosfstools",
        "e2fsprogs",
        "policycoreutils",
        "qemu-img",
        "systemd",
        "tar",
        "xz",
        "s390utils-base",
    ],
    boot_packages: &["dracut-config-generic", "s390utils-base"],
};

/// Mount points below these sizes are raised (legacy) or rejected (disk).
const RESERVED_SIZES: &[(&str, u64)] = &[("/", GIB), ("/usr", 2 * GIB)];

const MOUNTPOINT_POLICY: &[(&str, PathRule)] = &[
    ("/", PathRule::EXACT),
    ("/boot", PathRule::EXACT),
    ("/var", PathRule::SUBTREE),
    ("/opt", PathRule::SUBTREE),
    ("/srv", PathRule::SUBTREE),
    ("/usr", PathRule::SUBTREE),
    ("/app", PathRule::SUBTREE),
    ("/data", PathRule::SUBTREE),
    ("/home", PathRule::SUBTREE),
    ("/tmp", PathRule::SUBTREE),
    ("/var/run", PathRule::DENY),
    ("/var/lock", PathRule::DENY),
];

// ─────────────────────────────────────────────────────────────────────────────
// Package templates
// ─────────────────────────────────────────────────────────────────────────────

const COMMON_EXCLUDES: &[&str] = &[
    "aic94xx-firmware",
    "alsa-firmware",
    "alsa-lib",
    "alsa-tools-firmware",
    "ivtv-firmware",
    "iwl100-firmware",
    "iwl1000-firmware",
    "iwl105-firmware",
    "iwl135-firmware",
    "iwl2000-firmware",
    "iwl2030-firmware",
    "iwl3160-firmware",
    "iwl5000-firmware",
    "iwl6000-firmware",
    "iwl7260-firmware",
    "libertas-sd8686-firmware",
    "plymouth",
    "rng-tools",
];

const QCOW2_PACKAGES: PackageTemplate = PackageTemplate {
    include: &[
        "@core",
        "authselect-compat",
        "chrony",
        "cloud-init",
        "cloud-utils-growpart",
        "cockpit-system",
        "cockpit-ws",
        "dhcp-client",
        "dnf-utils",
        "dosfstools",
        "net-tools",
        "nfs-utils",
        "oddjob",
        "oddjob-mkhomedir",
        "psmisc",
        "python3-jsonschema",
        "qemu-guest-agent",
        "rsync",
        "tar",
        "tcpdump",
        "yum",
    ],
    exclude: COMMON_EXCLUDES,
};

const OPENSTACK_PACKAGES: PackageTemplate = PackageTemplate {
    include: &[
        "@core",
        "langpacks-en",
        "cloud-init",
        "qemu-guest-agent",
        "spice-vdagent",
    ],
    exclude: &["dracut-config-rescue", "rng-tools"],
};

const AZURE_PACKAGES: PackageTemplate = PackageTemplate {
    include: &[
        "@core",
        "NetworkManager",
        "WALinuxAgent",
        "bzip2",
        "cloud-init",
        "cloud-utils-growpart",
        "gdisk",
        "hyperv-daemons",
        "langpacks-en",
        "lvm2",
        "patch",
        "rng-tools",
        "uuid",
    ],
    exclude: &["dracut-config-rescue", "iwl*-firmware", "NetworkManager-config-server"],
};

const AZURE_RHUI_PACKAGES: PackageTemplate = PackageTemplate {
    include: &[
        "@core",
        "NetworkManager",
        "WALinuxAgent",
        "bzip2",
        "cloud-init",
        "cloud-utils-growpart",
        "gdisk",
        "hyperv-daemons",
        "langpacks-en",
        "lvm2",
        "patch",
        "rhui-azure-rhel8",
        "rng-tools",
        "uuid",
    ],
    exclude: &["dracut-config-rescue", "iwl*-firmware", "NetworkManager-config-server"],
};

const AZURE_SAP_RHUI_PACKAGES: PackageTemplate = PackageTemplate {
    include: &[
        "@core",
        "@Server",
        "WALinuxAgent",
        "cloud-init",
        "compat-sap-c++-9",
        "hyperv-daemons",
        "lvm2",
        "rhel-system-roles-sap",
        "rhui-azure-rhel8-sap-ha",
        "tuned-profiles-sap-hana",
        "uuidd",
    ],
    exclude: &["dracut-config-rescue", "iwl*-firmware"],
};

const AZURE_EAP7_RHUI_PACKAGES: PackageTemplate = PackageTemplate {
    include: &[
        "@core",
        "WALinuxAgent",
        "cloud-init",
        "eap7-jboss-server-cli",
        "eap7-wildfly",
        "hyperv-daemons",
        "java-1.8.0-openjdk-headless",
        "lvm2",
        "rhui-azure-rhel8",
    ],
    exclude: &["dracut-config-rescue", "iwl*-firmware"],
};

const VMWARE_PACKAGES: PackageTemplate = PackageTemplate {
    include: &["@core", "chrony", "cloud-init", "firewalld", "langpacks-en", "open-vm-tools"],
    exclude: COMMON_EXCLUDES,
};

const EC2_PACKAGES: PackageTemplate = PackageTemplate {
    include: &[
        "@core",
        "authselect-compat",
        "chrony",
        "cloud-init",
        "cloud-utils-growpart",
        "dhcp-client",
        "yum-utils",
        "gdisk",
        "insights-client",
        "redhat-cloud-client-configuration",
    ],
    exclude: COMMON_EXCLUDES,
};

const EC2_HA_PACKAGES: PackageTemplate = PackageTemplate {
    include: &[
        "@core",
        "chrony",
        "cloud-init",
        "cloud-utils-growpart",
        "fence-agents-all",
        "pacemaker",
        "pcs",
        "rh-amazon-rhui-client-ha",
    ],
    exclude: COMMON_EXCLUDES,
};

const EC2_SAP_PACKAGES: PackageTemplate = PackageTemplate {
    include: &[
        "@core",
        "@Server",
        "chrony",
        "cloud-init",
        "compat-sap-c++-9",
        "rh-amazon-rhui-client-sap-bundle-e4s",
        "rhel-system-roles-sap",
        "tuned-profiles-sap-hana",
        "uuidd",
    ],
    exclude: COMMON_EXCLUDES,
};

const GCE_PACKAGES: PackageTemplate = PackageTemplate {
    include: &[
        "@core",
        "chrony",
        "google-compute-engine",
        "google-osconfig-agent",
        "gce-disk-expand",
        "langpacks-en",
        "timedatex",
    ],
    exclude: &["alsa-utils", "b43-fwcutter", "dmraid", "irqbalance", "microcode_ctl", "smartmontools"],
};

const GCE_RHUI_PACKAGES: PackageTemplate = PackageTemplate {
    include: &[
        "@core",
        "chrony",
        "google-compute-engine",
        "google-osconfig-agent",
        "gce-disk-expand",
        "google-rhui-client-rhel8",
        "langpacks-en",
        "timedatex",
    ],
    exclude: &["alsa-utils", "b43-fwcutter", "dmraid", "irqbalance", "microcode_ctl", "smartmontools"],
};

const EDGE_COMMIT_PACKAGES: PackageTemplate = PackageTemplate {
    include: &[
        "attr",
        "audit",
        "bash-completion",
        "chrony",
        "clevis",
        "clevis-dracut",
        "clevis-luks",
        "container-selinux",
        "containernetworking-plugins",
        "dnsmasq",
        "fdo-client",
        "firewalld",
        "greenboot",
        "greenboot-default-health-checks",
        "podman",
        "rpm-ostree",
        "setools-console",
        "skopeo",
        "sssd-client",
        "sudo",
    ],
    exclude: &["rng-tools"],
};

const TAR_PACKAGES: PackageTemplate = PackageTemplate {
    include: &["policycoreutils", "selinux-policy-targeted"],
    exclude: &["rng-tools"],
};

const IMAGE_INSTALLER_PACKAGES: PackageTemplate = PackageTemplate {
    include: &["@core", "fwupd", "kernel", "nfs-utils", "policycoreutils", "selinux-policy-targeted"],
    exclude: &["rng-tools"],
};

const WSL_PACKAGES: PackageTemplate = PackageTemplate {
    include: &[
        "alternatives",
        "audit-libs",
        "basesystem",
        "bash",
        "ca-certificates",
        "coreutils-single",
        "dnf",
        "glibc-minimal-langpack",
        "libcurl-minimal",
        "shadow-utils",
        "sudo",
        "systemd",
        "util-linux",
    ],
    exclude: &["gawk-all-langpacks", "glibc-langpack-en"],
};

const MINIMAL_RAW_PACKAGES: PackageTemplate = PackageTemplate {
    include: &["@core", "initial-setup", "libxkbcommon", "NetworkManager-wifi", "iwl7260-firmware"],
    exclude: &["dracut-config-rescue"],
};

const ANACONDA_PACKAGES: PackageTemplate = PackageTemplate {
    include: &[
        "anaconda",
        "anaconda-dracut",
        "anaconda-widgets",
        "biosdevname",
        "dracut-network",
        "dracut-live",
        "glibc-all-langpacks",
        "grub2-tools-efi",
        "isomd5sum",
        "kbd",
        "lorax-templates-generic",
        "nss-tools",
        "rdma-core",
        "rng-tools",
        "squashfs-tools",
        "xorriso",
    ],
    exclude: &[],
};

const COREOS_INSTALLER_PACKAGES: PackageTemplate = PackageTemplate {
    include: &[
        "coreos-installer",
        "coreos-installer-dracut",
        "dracut-network",
        "fdo-init",
        "kernel",
        "lvm2",
        "xz",
    ],
    exclude: &[],
};

// ─────────────────────────────────────────────────────────────────────────────
// Image kinds
// ─────────────────────────────────────────────────────────────────────────────

const QCOW2_KERNEL_OPTIONS: &str =
    "console=tty0 console=ttyS0,115200n8 no_timer_check net.ifnames=0 crashkernel=auto";
const AZURE_KERNEL_OPTIONS: &str =
    "ro crashkernel=auto console=tty1 console=ttyS0 earlyprintk=ttyS0 rootdelay=300";
const EC2_KERNEL_OPTIONS: &str = "console=ttyS0,115200n8 console=tty0 net.ifnames=0 rd.blacklist=nouveau nvme_core.io_timeout=4294967295 crashkernel=auto";
const GCE_KERNEL_OPTIONS: &str =
    "net.ifnames=0 biosdevname=0 scsi_mod.use_blk_mq=Y crashkernel=auto console=ttyS0,38400n8d";
const EDGE_KERNEL_OPTIONS: &str = "modprobe.blacklist=vc4";

/// Disk image defaults; kinds override what differs.
const DISK: KindTemplate = KindTemplate {
    name: "",
    aliases: &[],
    filename: "",
    mime_type: "",
    category: Category::Disk,
    capabilities: Capabilities::ALL,
    default_size: 10 * GIB,
    mib_aligned: false,
    payload: None,
    installer: None,
    kernel_options: "",
    layout: Some(BaseLayout::Plain),
};

pub const QCOW2: KindTemplate = KindTemplate {
    name: "qcow2",
    filename: "disk.qcow2",
    mime_type: "application/x-qemu-disk",
    payload: Some(QCOW2_PACKAGES),
    kernel_options: QCOW2_KERNEL_OPTIONS,
    ..DISK
};

pub const OCI: KindTemplate = KindTemplate {
    name: "oci",
    default_size: 4 * GIB,
    ..QCOW2
};

pub const OPENSTACK: KindTemplate = KindTemplate {
    name: "openstack",
    filename: "disk.qcow2",
    mime_type: "application/x-qemu-disk",
    default_size: 4 * GIB,
    payload: Some(OPENSTACK_PACKAGES),
    kernel_options: "ro net.ifnames=0",
    ..DISK
};

pub const VHD: KindTemplate = KindTemplate {
    name: "vhd",
    filename: "disk.vhd",
    mime_type: "application/x-vhd",
    default_size: 4 * GIB,
    mib_aligned: true,
    payload: Some(AZURE_PACKAGES),
    kernel_options: AZURE_KERNEL_OPTIONS,
    ..DISK
};

pub const AZURE_RHUI: KindTemplate = KindTemplate {
    name: "azure-rhui",
    filename: "disk.vhd.xz",
    mime_type: "application/xz",
    default_size: 64 * GIB,
    payload: Some(AZURE_RHUI_PACKAGES),
    layout: Some(BaseLayout::AzureLvm),
    ..VHD
};

pub const AZURE_SAP_RHUI: KindTemplate = KindTemplate {
    name: "azure-sap-rhui",
    payload: Some(AZURE_SAP_RHUI_PACKAGES),
    ..AZURE_RHUI
};

pub const AZURE_EAP7_RHUI: KindTemplate = KindTemplate {
    name: "azure-eap7-rhui",
    capabilities: Capabilities::NO_DISK,
    payload: Some(AZURE_EAP7_RHUI_PACKAGES),
    ..AZURE_RHUI
};

pub const VMDK: KindTemplate = KindTemplate {
    name: "vmdk",
    filename: "disk.vmdk",
    mime_type: "application/x-vmdk",
    default_size: 4 * GIB,
    payload: Some(VMWARE_PACKAGES),
    kernel_options: "ro net.ifnames=0",
    ..DISK
};

pub const OVA: KindTemplate = KindTemplate {
    name: "ova",
    filename: "image.ova",
    mime_type: "application/ovf",
    ..VMDK
};

pub const AMI: KindTemplate = KindTemplate {
    name: "ami",
    filename: "image.raw",
    mime_type: "application/octet-stream",
    payload: Some(EC2_PACKAGES),
    kernel_options: EC2_KERNEL_OPTIONS,
    ..DISK
};

pub const EC2: KindTemplate = KindTemplate {
    name: "ec2",
    filename: "image.raw.xz",
    mime_type: "application/xz",
    ..AMI
};

pub const EC2_HA: KindTemplate = KindTemplate {
    name: "ec2-ha",
    payload: Some(EC2_HA_PACKAGES),
    ..EC2
};

pub const EC2_SAP: KindTemplate = KindTemplate {
    name: "ec2-sap",
    payload: Some(EC2_SAP_PACKAGES),
    ..EC2
};

pub const GCE: KindTemplate = KindTemplate {
    name: "gce",
    filename: "image.tar.gz",
    mime_type: "application/gzip",
    default_size: 20 * GIB,
    payload: Some(GCE_PACKAGES),
    kernel_options: GCE_KERNEL_OPTIONS,
    ..DISK
};

pub const GCE_RHUI: KindTemplate = KindTemplate {
    name: "gce-rhui",
    payload: Some(GCE_RHUI_PACKAGES),
    ..GCE
};

pub const EDGE_COMMIT: KindTemplate = KindTemplate {
    name: "edge-commit",
    aliases: &["rhel-edge-commit"],
    filename: "commit.tar",
    mime_type: "application/x-tar",
    category: Category::OstreeCommit,
    capabilities: Capabilities::OSTREE_PAYLOAD,
    default_size: 0,
    mib_aligned: false,
    payload: Some(EDGE_COMMIT_PACKAGES),
    installer: None,
    kernel_options: "",
    layout: None,
};

pub const EDGE_CONTAINER: KindTemplate = KindTemplate {
    name: "edge-container",
    aliases: &["rhel-edge-container"],
    filename: "container.tar",
    category: Category::OstreeContainer,
    ..EDGE_COMMIT
};

pub const EDGE_INSTALLER: KindTemplate = KindTemplate {
    name: "edge-installer",
    aliases: &["rhel-edge-installer"],
    filename: "installer.iso",
    mime_type: "application/x-iso9660-image",
    category: Category::Installer,
    capabilities: Capabilities::OSTREE_DEPLOYMENT,
    default_size: 0,
    mib_aligned: false,
    payload: None,
    installer: Some(ANACONDA_PACKAGES),
    kernel_options: "",
    layout: None,
};

pub const EDGE_SIMPLIFIED_INSTALLER: KindTemplate = KindTemplate {
    name: "edge-simplified-installer",
    aliases: &[],
    filename: "simplified-installer.iso",
    default_size: 10 * GIB,
    installer: Some(COREOS_INSTALLER_PACKAGES),
    kernel_options: EDGE_KERNEL_OPTIONS,
    layout: Some(BaseLayout::Plain),
    ..EDGE_INSTALLER
};

pub const EDGE_RAW_IMAGE: KindTemplate = KindTemplate {
    name: "edge-raw-image",
    filename: "image.raw.xz",
    mime_type: "application/xz",
    capabilities: Capabilities::OSTREE_DEPLOYMENT,
    kernel_options: EDGE_KERNEL_OPTIONS,
    ..DISK
};

pub const TAR: KindTemplate = KindTemplate {
    name: "tar",
    aliases: &[],
    filename: "root.tar.xz",
    mime_type: "application/x-tar",
    category: Category::Archive,
    capabilities: Capabilities::ALL,
    default_size: 0,
    mib_aligned: false,
    payload: Some(TAR_PACKAGES),
    installer: None,
    kernel_options: "",
    layout: None,
};

pub const WSL: KindTemplate = KindTemplate {
    name: "wsl",
    filename: "disk.tar.gz",
    payload: Some(WSL_PACKAGES),
    ..TAR
};

pub const IMAGE_INSTALLER: KindTemplate = KindTemplate {
    name: "image-installer",
    aliases: &[],
    filename: "installer.iso",
    mime_type: "application/x-iso9660-image",
    category: Category::Installer,
    capabilities: Capabilities::ALL,
    default_size: 10 * GIB,
    mib_aligned: false,
    payload: Some(IMAGE_INSTALLER_PACKAGES),
    installer: Some(ANACONDA_PACKAGES),
    kernel_options: "",
    layout: Some(BaseLayout::Plain),
};

pub const MINIMAL_RAW: KindTemplate = KindTemplate {
    name: "minimal-raw",
    filename: "disk.raw.xz",
    mime_type: "application/xz",
    default_size: 2 * GIB,
    payload: Some(MINIMAL_RAW_PACKAGES),
    kernel_options: "ro",
    ..DISK
};

const RHEL_X86_64_KINDS: &[KindTemplate] = &[
    QCOW2,
    OPENSTACK,
    VHD,
    AZURE_RHUI,
    AZURE_SAP_RHUI,
    AZURE_EAP7_RHUI,
    VMDK,
    OVA,
    AMI,
    EC2,
    EC2_HA,
    EC2_SAP,
    GCE,
    GCE_RHUI,
    EDGE_COMMIT,
    EDGE_CONTAINER,
    EDGE_INSTALLER,
    EDGE_RAW_IMAGE,
    EDGE_SIMPLIFIED_INSTALLER,
    TAR,
    IMAGE_INSTALLER,
    OCI,
    WSL,
    MINIMAL_RAW,
];

const RHEL_AARCH64_KINDS: &[KindTemplate] = &[
    QCOW2,
    OPENSTACK,
    VHD,
    AZURE_RHUI,
    AMI,
    EC2,
    EDGE_COMMIT,
    EDGE_CONTAINER,
    EDGE_INSTALLER,
    EDGE_SIMPLIFIED_INSTALLER,
    EDGE_RAW_IMAGE,
    TAR,
    IMAGE_INSTALLER,
    WSL,
    MINIMAL_RAW,
];

const CENTOS_X86_64_KINDS: &[KindTemplate] = &[
    QCOW2,
    OPENSTACK,
    VHD,
    VMDK,
    OVA,
    AMI,
    GCE,
    TAR,
    IMAGE_INSTALLER,
    OCI,
    WSL,
    MINIMAL_RAW,
];

const CENTOS_AARCH64_KINDS: &[KindTemplate] = &[
    QCOW2,
    OPENSTACK,
    VHD,
    AMI,
    TAR,
    IMAGE_INSTALLER,
    WSL,
    MINIMAL_RAW,
];

const POWER_KINDS: &[KindTemplate] = &[QCOW2, TAR];

// ─────────────────────────────────────────────────────────────────────────────
// Distributions
// ─────────────────────────────────────────────────────────────────────────────

/// Red Hat Enterprise Linux 8.10.
pub fn rhel810() -> Distribution {
    distribution(
        &RHEL_810,
        &[
            (&AARCH64, RHEL_AARCH64_KINDS),
            (&PPC64LE, POWER_KINDS),
            (&S390X, POWER_KINDS),
            (&X86_64, RHEL_X86_64_KINDS),
        ],
    )
}

/// CentOS Stream 8.
pub fn centos8() -> Distribution {
    distribution(
        &CENTOS_8,
        &[
            (&AARCH64, CENTOS_AARCH64_KINDS),
            (&PPC64LE, POWER_KINDS),
            (&X86_64, CENTOS_X86_64_KINDS),
        ],
    )
}

fn distribution(release: &Release, arches: &[(&ArchSpec, &[KindTemplate])]) -> Distribution {
    let arches = arches
        .iter()
        .map(|(spec, kinds)| architecture(release, spec, kinds))
        .collect();
    Distribution::new(
        release.name,
        release.product,
        release.os_version,
        MODULE_PLATFORM_ID,
        arches,
    )
}

fn architecture(release: &Release, spec: &ArchSpec, kinds: &[KindTemplate]) -> Architecture {
    let platform = Arc::new(Platform {
        distro: release.name.to_string(),
        arch: spec.name.to_string(),
        features: spec.features,
        path_policy: PathPolicy::new(MOUNTPOINT_POLICY),
        reserved_sizes: RESERVED_SIZES,
        release_package: release.release_package,
        boot_packages: spec.boot_packages,
        ostree_ref_prefix: Some(release.ostree_ref_prefix.to_string()),
    });

    let kinds = kinds
        .iter()
        .map(|template| template.instantiate(&platform, spec.build_packages))
        .collect();

    Architecture::new(spec.name, release.name, spec.features, kinds)
}
