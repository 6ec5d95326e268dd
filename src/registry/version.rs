//! Distribution identifier normalization.

/// Normalize a distribution identifier before lookup.
///
/// A dot-less numeric version of two or more digits is split after its first
/// digit: `rhel-810` becomes `rhel-8.10`. Everything else is returned as is,
/// so `rhel-8` and `rhel-8.4.1` only match distributions registered under
/// exactly that name.
pub fn normalize(id: &str) -> String {
    let Some((name, version)) = id.rsplit_once('-') else {
        return id.to_string();
    };

    if version.len() >= 2 && version.bytes().all(|b| b.is_ascii_digit()) {
        let (major, minor) = version.split_at(1);
        return format!("{}-{}.{}", name, major, minor);
    }

    id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_compact_versions() {
        assert_eq!(normalize("rhel-810"), "rhel-8.10");
        assert_eq!(normalize("rhel-86"), "rhel-8.6");
    }

    #[test]
    fn test_normalize_leaves_other_ids_alone() {
        assert_eq!(normalize("rhel-8.10"), "rhel-8.10");
        assert_eq!(normalize("rhel-8"), "rhel-8");
        assert_eq!(normalize("rhel-8.4.1"), "rhel-8.4.1");
        assert_eq!(normalize("centos-8"), "centos-8");
        assert_eq!(normalize("fedora"), "fedora");
        assert_eq!(normalize("rhel-8a"), "rhel-8a");
    }
}
