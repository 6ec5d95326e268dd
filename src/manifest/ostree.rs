//! OSTree ref resolution for commit, container and deployment kinds.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::error::{quote, ManifestError, Result};
use crate::kind::ImageKind;
use crate::options::ImageOptions;

const REF_PATTERN: &str = r"^(?:[\w\d][-._\w\d]*/)*[\w\d][-._\w\d]*$";

static REF_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

/// Where the OSTree content of a manifest comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OstreeSource {
    #[serde(rename = "ref")]
    pub image_ref: String,
    pub url: Option<String>,
    pub parent: Option<String>,
}

/// Whether `name` is a well-formed OSTree ref.
pub fn is_valid_ref(name: &str) -> bool {
    REF_REGEX
        .get_or_init(|| Regex::new(REF_PATTERN).ok())
        .as_ref()
        .is_some_and(|re| re.is_match(name))
}

/// Default ref for a kind: `<prefix>/<arch>/edge`.
pub fn default_ref(kind: &ImageKind) -> Option<String> {
    let prefix = kind.platform().ostree_ref_prefix.as_deref()?;
    Some(format!("{}/{}/edge", prefix, kind.arch_name()))
}

/// Resolve the OSTree source of a manifest.
///
/// Kinds that neither produce nor deploy a commit get `None`, whatever the
/// options say.
pub fn resolve(kind: &ImageKind, options: &ImageOptions) -> Result<Option<OstreeSource>> {
    let produces_commit = kind.category().is_ostree_payload();
    let deploys_commit = kind.capabilities().ostree_source;
    if !produces_commit && !deploys_commit {
        if options.ostree.is_some() {
            debug!(kind = kind.name(), "ignoring ostree options");
        }
        return Ok(None);
    }

    let image_ref = match options.ostree_ref() {
        Some(r) => r.to_string(),
        None => default_ref(kind).ok_or_else(|| {
            ManifestError::InvalidImageOptions(format!(
                "no default ostree ref for {} {}",
                kind.distro_name(),
                kind.arch_name()
            ))
        })?,
    };
    if !is_valid_ref(&image_ref) {
        return Err(ManifestError::InvalidImageOptions(format!(
            "invalid ostree ref {}",
            quote(&image_ref)
        )));
    }

    let url = options.ostree_url().map(str::to_string);
    let parent = match options.ostree_parent() {
        Some(parent) if produces_commit => {
            if url.is_none() {
                return Err(ManifestError::InvalidImageOptions(
                    "ostree parent ref specified, but no URL to retrieve it".to_string(),
                ));
            }
            if !is_valid_ref(parent) {
                return Err(ManifestError::InvalidImageOptions(format!(
                    "invalid ostree parent ref {}",
                    quote(parent)
                )));
            }
            Some(parent.to_string())
        }
        _ => None,
    };

    Ok(Some(OstreeSource {
        image_ref,
        url,
        parent,
    }))
}
