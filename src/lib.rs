//! Declarative image-manifest compiler for RHEL-family distributions.
//!
//! A (distribution, architecture, image kind) selector plus a blueprint
//! becomes a deterministic build manifest: package-set chains, partition
//! layout, kernel command line and OSTree source. Nothing here runs a build;
//! the manifest is handed to a downstream build engine.
//!
//! - **Registry** - distribution → architecture → image kind, with aliases
//! - **Validator** - blueprint customizations against kind capabilities
//! - **Disk** - partition tables from mount-point lists or plain/LVM trees
//! - **Manifest** - package-set chains and the final [`Manifest`]
//!
//! # Architecture
//!
//! ```text
//! registry() ─► Distribution ─► Architecture ─► ImageKind
//!                                                  │
//!                       Blueprint + ImageOptions ──┤
//!                                                  ▼
//!                                          ImageKind::manifest
//!                                                  │
//!            ┌──────────────────┬──────────────────┼──────────────────┐
//!            ▼                  ▼                  ▼                  ▼
//!   validate::check_*    manifest::ostree    disk::builder    manifest::packages
//!            └──────────────────┴─────────┬────────┴──────────────────┘
//!                                         ▼
//!                              Manifest | ManifestError
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use distro_manifest::{registry, Blueprint, ImageOptions};
//!
//! let kind = registry()
//!     .get_distribution("rhel-8.10")?
//!     .get_arch("x86_64")?
//!     .get_image_kind("qcow2")?;
//! let manifest = kind.manifest(&Blueprint::default(), &ImageOptions::default())?;
//! println!("{}", manifest.to_json()?);
//! ```

pub mod blueprint;
pub mod config;
pub mod disk;
pub mod error;
pub mod kind;
pub mod manifest;
pub mod options;
pub mod registry;
pub mod validate;

pub use blueprint::{Blueprint, Customizations, DataSize};
pub use error::{ManifestError, NotFound, Result};
pub use kind::{Category, ImageKind, OutputDescriptor};
pub use manifest::{Manifest, PackageSet};
pub use options::{ImageOptions, OstreeOptions};
pub use registry::{registry, Architecture, Distribution, Registry};
