//! Mount-point canonicalization and allow-list policy.

use crate::error::{PathErrors, PathViolationKind, Result};

/// How a policy entry treats its subtree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PathRule {
    /// Only the entry itself may be a mount point, nothing below it.
    pub exact: bool,
    /// Nothing at or below the entry may be a mount point.
    pub deny: bool,
}

impl PathRule {
    pub const SUBTREE: PathRule = PathRule {
        exact: false,
        deny: false,
    };
    pub const EXACT: PathRule = PathRule {
        exact: true,
        deny: false,
    };
    pub const DENY: PathRule = PathRule {
        exact: false,
        deny: true,
    };
}

/// Allow-list of mount points for one platform. The longest matching entry
/// decides; a path no entry matches is not allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPolicy {
    rules: Vec<(String, PathRule)>,
}

impl PathPolicy {
    pub fn new(rules: &[(&str, PathRule)]) -> Self {
        Self {
            rules: rules
                .iter()
                .map(|(path, rule)| (path.to_string(), *rule))
                .collect(),
        }
    }

    /// Whether a canonical absolute path may be used as a mount point.
    pub fn allows(&self, path: &str) -> bool {
        let matched = self
            .rules
            .iter()
            .filter(|(prefix, _)| is_under(path, prefix))
            .max_by_key(|(prefix, _)| prefix.len());

        match matched {
            Some((_, rule)) if rule.deny => false,
            Some((prefix, rule)) if rule.exact => path == prefix,
            Some(_) => true,
            None => false,
        }
    }
}

fn is_under(path: &str, prefix: &str) -> bool {
    if prefix == "/" {
        return path.starts_with('/');
    }
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Lexically clean a slash-separated path.
///
/// Collapses repeated separators, drops `.` elements, resolves `..` against
/// the preceding element and removes a trailing separator. The root stays
/// `/`; an empty result becomes `.`.
pub fn canonicalize(path: &str) -> String {
    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();

    for element in path.split('/') {
        match element {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if rooted => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{}", joined),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Check every mount point against absoluteness, canonical form and the
/// policy, collecting one violation per offending path in input order.
pub fn check_mountpoints<'a, I>(mountpoints: I, policy: &PathPolicy) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut errors = PathErrors::new();

    for mountpoint in mountpoints {
        if !mountpoint.starts_with('/') {
            errors.push(mountpoint, PathViolationKind::NotAbsolute);
            continue;
        }
        if canonicalize(mountpoint) != mountpoint {
            errors.push(mountpoint, PathViolationKind::NotCanonical);
            continue;
        }
        if mountpoint != "/" && !policy.allows(mountpoint) {
            errors.push(mountpoint, PathViolationKind::NotAllowed);
        }
    }

    errors.into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ManifestError;
    use proptest::prelude::*;

    fn policy() -> PathPolicy {
        PathPolicy::new(&[
            ("/", PathRule::EXACT),
            ("/boot", PathRule::EXACT),
            ("/var", PathRule::SUBTREE),
            ("/var/run", PathRule::DENY),
            ("/home", PathRule::SUBTREE),
        ])
    }

    #[test]
    fn test_canonicalize() {
        assert_eq!(canonicalize("/"), "/");
        assert_eq!(canonicalize("//"), "/");
        assert_eq!(canonicalize("/var//"), "/var");
        assert_eq!(canonicalize("/var//log/audit/"), "/var/log/audit");
        assert_eq!(canonicalize("/var/./log"), "/var/log");
        assert_eq!(canonicalize("/var/../etc"), "/etc");
        assert_eq!(canonicalize("/.."), "/");
        assert_eq!(canonicalize("var/"), "var");
        assert_eq!(canonicalize("../x"), "../x");
        assert_eq!(canonicalize(""), ".");
    }

    #[test]
    fn test_policy_longest_prefix_wins() {
        let policy = policy();
        assert!(policy.allows("/var"));
        assert!(policy.allows("/var/a/b/c/d"));
        assert!(!policy.allows("/var/run"));
        assert!(!policy.allows("/var/run/user"));
        assert!(policy.allows("/boot"));
        assert!(!policy.allows("/boot/efi"));
        assert!(!policy.allows("/etc"));
        assert!(!policy.allows("/variable"));
    }

    #[test]
    fn test_check_mountpoints_aggregates_in_input_order() {
        let err = check_mountpoints(["/etc", "/var//", "/var/log", "home"], &policy()).unwrap_err();
        match err {
            ManifestError::PathValidation(errors) => {
                let paths: Vec<_> = errors.violations().iter().map(|v| v.path.as_str()).collect();
                assert_eq!(paths, vec!["/etc", "/var//", "home"]);
            }
            other => panic!("expected path validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_root_always_allowed() {
        let policy = PathPolicy::new(&[]);
        assert!(check_mountpoints(["/"], &policy).is_ok());
    }

    proptest! {
        #[test]
        fn prop_repeated_separator_is_reported_verbatim(
            parts in prop::collection::vec("[a-z]{1,6}", 1..4),
            at in 0usize..4,
        ) {
            let at = at % parts.len();
            let mut path = String::new();
            for (i, part) in parts.iter().enumerate() {
                path.push('/');
                if i == at {
                    path.push('/');
                }
                path.push_str(part);
            }

            let err = check_mountpoints([path.as_str()], &policy()).unwrap_err();
            let expected = format!("path {:?} must be canonical", path);
            prop_assert!(err.to_string().contains(&expected));
        }

        #[test]
        fn prop_trailing_separator_is_reported_verbatim(
            parts in prop::collection::vec("[a-z]{1,6}", 1..4),
        ) {
            let path = format!("/{}/", parts.join("/"));
            let err = check_mountpoints([path.as_str()], &policy()).unwrap_err();
            let expected = format!("path {:?} must be canonical", path);
            prop_assert!(err.to_string().contains(&expected));
        }

        #[test]
        fn prop_canonicalize_is_idempotent(path in "(/[a-z.]{0,3}){0,5}/?") {
            let once = canonicalize(&path);
            prop_assert_eq!(canonicalize(&once), once);
        }
    }
}
