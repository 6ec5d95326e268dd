//! Loading blueprints and image options from TOML files.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::blueprint::Blueprint;
use crate::options::ImageOptions;

/// Read and parse a blueprint file.
pub fn load_blueprint(path: &Path) -> Result<Blueprint> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading blueprint '{}'", path.display()))?;
    parse_blueprint(&text).with_context(|| format!("parsing blueprint '{}'", path.display()))
}

/// Parse blueprint TOML.
pub fn parse_blueprint(text: &str) -> Result<Blueprint> {
    let blueprint: Blueprint = toml::from_str(text)?;
    Ok(blueprint)
}

/// Read and parse an image options file (`size`, `[ostree]`).
pub fn load_image_options(path: &Path) -> Result<ImageOptions> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("reading image options '{}'", path.display()))?;
    let options: ImageOptions = toml::from_str(&text)
        .with_context(|| format!("parsing image options '{}'", path.display()))?;
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{DataSize, FsType, PartitionCustomization, GIB, MIB};
    use std::io::Write;

    #[test]
    fn test_parse_full_blueprint() {
        let blueprint = parse_blueprint(
            r#"
            name = "edge-base"
            version = "0.0.1"

            [[packages]]
            name = "tmux"
            version = "*"

            [customizations.kernel]
            append = "debug nosmt=force"

            [[customizations.filesystem]]
            mountpoint = "/var/log"
            minsize = "2 GiB"

            [[customizations.filesystem]]
            mountpoint = "/home"
            minsize = 536870912
            "#,
        )
        .unwrap();

        assert_eq!(blueprint.name, "edge-base");
        assert_eq!(blueprint.packages[0].spec(), "tmux");
        assert_eq!(blueprint.kernel().unwrap().append, "debug nosmt=force");
        let fs = blueprint.filesystems();
        assert_eq!(fs.len(), 2);
        assert_eq!(fs[0].minsize, DataSize(2 * GIB));
        assert_eq!(fs[1].minsize, DataSize(512 * MIB));
    }

    #[test]
    fn test_parse_disk_blueprint() {
        let blueprint = parse_blueprint(
            r#"
            [customizations.disk]
            minsize = "20 GiB"

            [[customizations.disk.partitions]]
            type = "plain"
            mountpoint = "/data"
            fs_type = "ext4"
            minsize = "1 GiB"

            [[customizations.disk.partitions]]
            type = "lvm"
            name = "mainvg"

            [[customizations.disk.partitions.logical_volumes]]
            name = "rootlv"
            mountpoint = "/"
            fs_type = "xfs"
            "#,
        )
        .unwrap();

        let disk = blueprint.disk().unwrap();
        assert_eq!(disk.minsize, DataSize(20 * GIB));
        match &disk.partitions[0] {
            PartitionCustomization::Plain(plain) => {
                assert_eq!(plain.fs_type, FsType::Ext4);
                assert_eq!(plain.mountpoint.as_deref(), Some("/data"));
            }
            other => panic!("expected plain partition, got {:?}", other),
        }
        match &disk.partitions[1] {
            PartitionCustomization::Lvm(vg) => {
                assert_eq!(vg.name.as_deref(), Some("mainvg"));
                assert_eq!(vg.logical_volumes[0].name.as_deref(), Some("rootlv"));
            }
            other => panic!("expected volume group, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_unknown_partition_type() {
        let result = parse_blueprint(
            r#"
            [[customizations.disk.partitions]]
            type = "raid"
            mountpoint = "/"
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_blueprint_reports_path() {
        let err = load_blueprint(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(format!("{:#}", err).contains("/definitely/not/here.toml"));
    }

    #[test]
    fn test_load_image_options_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "size = \"12 GiB\"\n\n[ostree]\nref = \"rhel/8/x86_64/edge\"\nurl = \"http://example.com/repo\""
        )
        .unwrap();

        let options = load_image_options(file.path()).unwrap();
        assert_eq!(options.size, DataSize(12 * GIB));
        assert_eq!(options.ostree_url(), Some("http://example.com/repo"));
    }

    #[test]
    fn test_load_image_options_rejects_unknown_fields() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sise = 10").unwrap();
        assert!(load_image_options(file.path()).is_err());
    }
}
