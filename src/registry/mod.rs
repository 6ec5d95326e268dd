//! Platform registry: distribution → architecture → image kind.
//!
//! The registry is built once on first use and never mutated, so references
//! handed out by [`registry()`] are `'static` and can be shared freely across
//! threads.

pub mod rhel8;
pub mod version;

use std::collections::BTreeMap;
use std::sync::OnceLock;

use tracing::debug;

use crate::error::{NotFound, Result};
use crate::kind::{ArchFeatures, ImageKind};

static REGISTRY: OnceLock<Registry> = OnceLock::new();

/// The process-wide registry.
pub fn registry() -> &'static Registry {
    REGISTRY.get_or_init(|| {
        let registry = Registry::new(vec![rhel8::rhel810(), rhel8::centos8()]);
        debug!(
            distributions = ?registry.list_distributions(),
            "platform registry initialized"
        );
        registry
    })
}

/// All known distributions.
#[derive(Debug)]
pub struct Registry {
    distributions: BTreeMap<String, Distribution>,
}

impl Registry {
    pub fn new(distributions: Vec<Distribution>) -> Self {
        Self {
            distributions: distributions
                .into_iter()
                .map(|d| (d.name.clone(), d))
                .collect(),
        }
    }

    /// Sorted distribution names.
    pub fn list_distributions(&self) -> Vec<&str> {
        self.distributions.keys().map(String::as_str).collect()
    }

    /// Resolve a distribution by (normalized) identifier.
    pub fn get_distribution(&self, id: &str) -> Result<&Distribution> {
        let name = version::normalize(id);
        self.distributions
            .get(&name)
            .ok_or_else(|| NotFound::Distribution(id.to_string()).into())
    }
}

/// One distribution release and its architectures.
#[derive(Debug)]
pub struct Distribution {
    name: String,
    product: String,
    os_version: String,
    releasever: String,
    module_platform_id: String,
    arches: BTreeMap<String, Architecture>,
}

impl Distribution {
    pub fn new(
        name: &str,
        product: &str,
        os_version: &str,
        module_platform_id: &str,
        arches: Vec<Architecture>,
    ) -> Self {
        let releasever = os_version
            .split('.')
            .next()
            .unwrap_or(os_version)
            .to_string();
        Self {
            name: name.to_string(),
            product: product.to_string(),
            os_version: os_version.to_string(),
            releasever,
            module_platform_id: module_platform_id.to_string(),
            arches: arches.into_iter().map(|a| (a.name.clone(), a)).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn product(&self) -> &str {
        &self.product
    }

    pub fn os_version(&self) -> &str {
        &self.os_version
    }

    pub fn releasever(&self) -> &str {
        &self.releasever
    }

    /// Module platform identifier used by package tooling.
    pub fn module_platform_id(&self) -> &str {
        &self.module_platform_id
    }

    /// Architecture names in sorted order.
    pub fn list_arches(&self) -> Vec<&str> {
        self.arches.keys().map(String::as_str).collect()
    }

    pub fn get_arch(&self, name: &str) -> Result<&Architecture> {
        self.arches
            .get(name)
            .ok_or_else(|| NotFound::Architecture(name.to_string()).into())
    }
}

/// Image kinds available for one architecture of a distribution.
#[derive(Debug)]
pub struct Architecture {
    name: String,
    distro: String,
    features: ArchFeatures,
    kinds: Vec<ImageKind>,
    /// Canonical names and aliases → index into `kinds`.
    index: BTreeMap<String, usize>,
}

impl Architecture {
    pub fn new(name: &str, distro: &str, features: ArchFeatures, kinds: Vec<ImageKind>) -> Self {
        let mut index = BTreeMap::new();
        for (i, kind) in kinds.iter().enumerate() {
            index.insert(kind.name().to_string(), i);
            for alias in kind.aliases() {
                index.insert(alias.clone(), i);
            }
        }
        Self {
            name: name.to_string(),
            distro: distro.to_string(),
            features,
            kinds,
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn distro_name(&self) -> &str {
        &self.distro
    }

    pub fn features(&self) -> ArchFeatures {
        self.features
    }

    /// Canonical image kind names in registration order.
    pub fn list_image_kinds(&self) -> Vec<&str> {
        self.kinds.iter().map(ImageKind::name).collect()
    }

    pub fn image_kinds(&self) -> &[ImageKind] {
        &self.kinds
    }

    /// Look up an image kind by canonical name or alias.
    pub fn get_image_kind(&self, name: &str) -> Result<&ImageKind> {
        self.index
            .get(name)
            .map(|&i| &self.kinds[i])
            .ok_or_else(|| NotFound::ImageKind(name.to_string()).into())
    }
}
