//! Per-call image options: size override and OSTree source.

use serde::{Deserialize, Serialize};

use crate::blueprint::DataSize;

/// Options that accompany a blueprint into a manifest call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageOptions {
    /// Requested image size; zero selects the image kind's default.
    #[serde(default)]
    pub size: DataSize,
    #[serde(default)]
    pub ostree: Option<OstreeOptions>,
}

/// Where OSTree content comes from and which ref it lands on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OstreeOptions {
    #[serde(rename = "ref", default)]
    pub image_ref: Option<String>,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl ImageOptions {
    pub fn with_size(size: u64) -> Self {
        Self {
            size: DataSize(size),
            ..Default::default()
        }
    }

    pub fn with_ostree_url(url: impl Into<String>) -> Self {
        Self {
            ostree: Some(OstreeOptions {
                url: Some(url.into()),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    /// The OSTree source URL, if one was given and is not blank.
    pub fn ostree_url(&self) -> Option<&str> {
        non_blank(self.ostree.as_ref()?.url.as_deref())
    }

    pub fn ostree_ref(&self) -> Option<&str> {
        non_blank(self.ostree.as_ref()?.image_ref.as_deref())
    }

    pub fn ostree_parent(&self) -> Option<&str> {
        non_blank(self.ostree.as_ref()?.parent.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_url_counts_as_missing() {
        let options = ImageOptions::with_ostree_url("   ");
        assert_eq!(options.ostree_url(), None);
        assert_eq!(ImageOptions::default().ostree_url(), None);
    }

    #[test]
    fn test_ostree_accessors() {
        let options = ImageOptions {
            size: DataSize(0),
            ostree: Some(OstreeOptions {
                image_ref: Some("rhel/8/x86_64/edge".into()),
                parent: None,
                url: Some("http://example.com/repo".into()),
            }),
        };
        assert_eq!(options.ostree_ref(), Some("rhel/8/x86_64/edge"));
        assert_eq!(options.ostree_url(), Some("http://example.com/repo"));
        assert_eq!(options.ostree_parent(), None);
    }
}
