//! Error types for manifest construction.
//!
//! Every failure is terminal for the manifest call that produced it. Only
//! mount-point path problems are aggregated ([`PathErrors`]); everything else
//! short-circuits with a single message.

use std::fmt;

use thiserror::Error;

/// Result type for registry lookups and manifest construction.
pub type Result<T> = std::result::Result<T, ManifestError>;

/// Errors returned by the registry, the validator and the assembler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestError {
    /// Unknown distribution, architecture or image kind.
    #[error(transparent)]
    NotFound(#[from] NotFound),

    /// A customization category the image kind does not accept.
    #[error("{0}")]
    UnsupportedCustomization(String),

    /// The image kind needs an input the caller did not provide.
    #[error("{0}")]
    MissingRequiredInput(String),

    /// Canonicalization and allow-list violations, one line per path.
    #[error(transparent)]
    PathValidation(#[from] PathErrors),

    /// Malformed disk or filesystem customization.
    #[error("{0}")]
    Structural(String),

    /// A feature not available on this platform and architecture.
    #[error("{feature} creation is not supported on {distro} {arch}")]
    FeatureUnsupported {
        feature: Feature,
        distro: String,
        arch: String,
    },

    /// A reserved mount point was requested below its minimum size.
    #[error(
        "mountpoint {} requires a minimum size of {} bytes, but {} bytes were requested",
        quote(.mountpoint),
        .required,
        .requested
    )]
    Size {
        mountpoint: String,
        required: u64,
        requested: u64,
    },

    /// Image options that cannot be used with the selected image kind.
    #[error("{0}")]
    InvalidImageOptions(String),
}

impl ManifestError {
    pub(crate) fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedCustomization(msg.into())
    }

    pub(crate) fn structural(msg: impl Into<String>) -> Self {
        Self::Structural(msg.into())
    }
}

/// Lookup failures in the platform registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotFound {
    #[error("invalid distro name: {0}")]
    Distribution(String),
    #[error("invalid architecture: {0}")]
    Architecture(String),
    #[error("invalid image type: {0}")]
    ImageKind(String),
}

/// Platform features that can be switched off per architecture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    SwapPartition,
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Feature::SwapPartition => write!(f, "swap partition"),
        }
    }
}

/// Why a single mount point was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathViolationKind {
    NotAbsolute,
    NotCanonical,
    NotAllowed,
}

/// One rejected mount point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathViolation {
    pub path: String,
    pub kind: PathViolationKind,
}

impl fmt::Display for PathViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            PathViolationKind::NotAbsolute => write!(f, "path {} must be absolute", quote(&self.path)),
            PathViolationKind::NotCanonical => write!(f, "path {} must be canonical", quote(&self.path)),
            PathViolationKind::NotAllowed => write!(f, "path {} is not allowed", quote(&self.path)),
        }
    }
}

/// Double-quote user input for messages: printable characters verbatim,
/// `"` and `\` backslashed, control characters as `\n`, `\xNN` or `\uNNNN`.
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{7}' => out.push_str("\\a"),
            '\u{8}' => out.push_str("\\b"),
            '\u{b}' => out.push_str("\\v"),
            '\u{c}' => out.push_str("\\f"),
            c if c.is_control() && (c as u32) < 0x80 => out.push_str(&format!("\\x{:02x}", c as u32)),
            c if c.is_control() => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Aggregate of every rejected mount point in one blueprint, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathErrors {
    violations: Vec<PathViolation>,
}

impl PathErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: &str, kind: PathViolationKind) {
        self.violations.push(PathViolation {
            path: path.to_string(),
            kind,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn violations(&self) -> &[PathViolation] {
        &self.violations
    }

    /// `Ok(())` when nothing was collected, otherwise the combined error.
    pub fn into_result(self) -> Result<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ManifestError::PathValidation(self))
        }
    }
}

impl fmt::Display for PathErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "The following errors occurred while setting up custom mountpoints:"
        )?;
        for violation in &self.violations {
            write!(f, "\n{}", violation)?;
        }
        Ok(())
    }
}

impl std::error::Error for PathErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_errors_render_one_line_per_path() {
        let mut errors = PathErrors::new();
        errors.push("//", PathViolationKind::NotCanonical);
        errors.push("/etc", PathViolationKind::NotAllowed);
        errors.push("var", PathViolationKind::NotAbsolute);

        assert_eq!(
            errors.to_string(),
            "The following errors occurred while setting up custom mountpoints:\n\
             path \"//\" must be canonical\n\
             path \"/etc\" is not allowed\n\
             path \"var\" must be absolute"
        );
    }

    #[test]
    fn test_quote_keeps_printable_unicode() {
        assert_eq!(quote("/var"), "\"/var\"");
        assert_eq!(quote("/srv/café"), "\"/srv/café\"");
        assert_eq!(quote("/a\"b\\c"), "\"/a\\\"b\\\\c\"");
        assert_eq!(quote("/tmp\n\u{7}\u{1b}\u{85}"), "\"/tmp\\n\\a\\x1b\\u0085\"");

        let mut errors = PathErrors::new();
        errors.push("/srv/café//", PathViolationKind::NotCanonical);
        assert!(errors.to_string().ends_with("path \"/srv/café//\" must be canonical"));
    }

    #[test]
    fn test_empty_path_errors_is_ok() {
        assert!(PathErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_feature_unsupported_message() {
        let err = ManifestError::FeatureUnsupported {
            feature: Feature::SwapPartition,
            distro: "rhel-8.10".into(),
            arch: "aarch64".into(),
        };
        assert_eq!(
            err.to_string(),
            "swap partition creation is not supported on rhel-8.10 aarch64"
        );
    }

    #[test]
    fn test_not_found_is_transparent() {
        let err: ManifestError = NotFound::Architecture("foo-arch".into()).into();
        assert_eq!(err.to_string(), "invalid architecture: foo-arch");
    }
}
