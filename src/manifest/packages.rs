//! Package-set chains: build tooling, payload and installer.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::blueprint::Blueprint;
use crate::kind::{Category, ImageKind, PackageTemplate};

pub const BUILD_CHAIN: &str = "build";
pub const PAYLOAD_CHAIN: &str = "payload";
pub const INSTALLER_CHAIN: &str = "installer";

const DEFAULT_KERNEL: &str = "kernel";

/// Package names to install and to keep out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageSet {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
}

impl PackageSet {
    fn from_template(template: &PackageTemplate) -> Self {
        let mut set = Self::default();
        set.extend_include(template.include.iter().copied());
        set.exclude = template.exclude.iter().map(|p| p.to_string()).collect();
        set
    }

    /// Append names not already included, keeping first-seen order.
    fn extend_include<'a, I>(&mut self, names: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen: BTreeSet<String> = self.include.iter().cloned().collect();
        for name in names {
            if seen.insert(name.to_string()) {
                self.include.push(name.to_string());
            }
        }
    }
}

/// Chain name → package sets, one set per chain.
pub type PackageSetChains = BTreeMap<String, Vec<PackageSet>>;

/// Kernel package selected by the blueprint, or the distribution default.
pub fn kernel_name(blueprint: &Blueprint) -> &str {
    blueprint
        .kernel()
        .and_then(|k| k.name.as_deref())
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_KERNEL)
}

/// Assemble the chains for `kind`.
pub fn package_set_chains(kind: &ImageKind, blueprint: &Blueprint) -> PackageSetChains {
    let mut chains = PackageSetChains::new();

    let mut build = PackageSet::default();
    build.extend_include(kind.build_packages().iter().map(String::as_str));
    chains.insert(BUILD_CHAIN.to_string(), vec![build]);

    if let Some(template) = kind.payload_template() {
        chains.insert(
            PAYLOAD_CHAIN.to_string(),
            vec![payload_set(kind, template, blueprint)],
        );
    }

    if let Some(template) = kind.installer_template() {
        chains.insert(
            INSTALLER_CHAIN.to_string(),
            vec![PackageSet::from_template(template)],
        );
    }

    chains
}

fn payload_set(kind: &ImageKind, template: &PackageTemplate, blueprint: &Blueprint) -> PackageSet {
    let platform = kind.platform();
    let mut set = PackageSet::from_template(template);

    set.extend_include([platform.release_package]);
    if kind.has_partition_table() && kind.category() == Category::Disk {
        set.extend_include(platform.boot_packages.iter().copied());
    }
    set.extend_include([kernel_name(blueprint)]);

    let requested: Vec<String> = blueprint
        .packages
        .iter()
        .chain(&blueprint.modules)
        .map(|p| p.spec())
        .collect();
    set.extend_include(requested.iter().map(String::as_str));

    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{Customizations, KernelCustomization, Package};
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
    fn test_build_chain_is_arch_list() {
        let chains = package_set_chains(kind("s390x", "qcow2"), &Blueprint::default());
        let build = &chains[BUILD_CHAIN];
        assert_eq!(build.len(), 1);
        assert!(build[0].include.contains(&"s390utils-base".to_string()));
        assert!(build[0].exclude.is_empty());
    }

    #[test]
    fn test_payload_includes_blueprint_packages_once() {
        let blueprint = Blueprint {
            packages: vec![
                Package {
                    name: "tmux".into(),
                    version: Some("*".into()),
                },
                Package {
                    name: "chrony".into(),
                    version: None,
                },
                Package {
                    name: "vim-enhanced".into(),
                    version: Some("8.0".into()),
                },
            ],
            ..Default::default()
        };
        let chains = package_set_chains(kind("x86_64", "qcow2"), &blueprint);
        let payload = &chains[PAYLOAD_CHAIN][0];

        assert_eq!(payload.include.first().map(String::as_str), Some("@core"));
        assert_eq!(payload.include.iter().filter(|p| *p == "chrony").count(), 1);
        assert!(payload.include.contains(&"tmux".to_string()));
        assert!(payload.include.contains(&"vim-enhanced-8.0".to_string()));
        assert!(payload.include.contains(&"redhat-release".to_string()));
        assert!(payload.include.contains(&"kernel".to_string()));
        assert!(payload.include.contains(&"grub2-pc".to_string()));
    }

    #[test]
    fn test_custom_kernel_replaces_default() {
        let blueprint = Blueprint::with_customizations(Customizations {
            kernel: Some(KernelCustomization {
                name: Some("kernel-debug".into()),
                append: String::new(),
            }),
            ..Default::default()
        });
        let chains = package_set_chains(kind("x86_64", "tar"), &blueprint);
        let payload = &chains[PAYLOAD_CHAIN][0];
        assert!(payload.include.contains(&"kernel-debug".to_string()));
        assert!(!payload.include.contains(&"kernel".to_string()));
        assert!(!payload.include.contains(&"grub2-pc".to_string()));
    }

    #[test]
    fn test_chain_names_per_category() {
        let names = |name: &str| -> Vec<String> {
            package_set_chains(kind("x86_64", name), &Blueprint::default())
                .into_keys()
                .collect()
        };
        assert_eq!(names("qcow2"), vec!["build", "payload"]);
        assert_eq!(names("edge-commit"), vec!["build", "payload"]);
        assert_eq!(names("edge-installer"), vec!["build", "installer"]);
        assert_eq!(names("edge-raw-image"), vec!["build"]);
        assert_eq!(names("image-installer"), vec!["build", "installer", "payload"]);
    }
}
