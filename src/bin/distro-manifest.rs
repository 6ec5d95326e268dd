use std::path::Path;

use anyhow::{bail, Context, Result};
use distro_manifest::config::{load_blueprint, load_image_options};
use distro_manifest::{registry, Blueprint, ImageOptions};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn usage() -> &'static str {
    "Usage:\n  distro-manifest list\n  distro-manifest list <distro>\n  distro-manifest list <distro> <arch>\n  distro-manifest manifest <distro> <arch> <image-kind> [blueprint.toml] [options.toml]"
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    match args.as_slice() {
        [list] if list == "list" => list_distributions(),
        [list, distro] if list == "list" => list_arches(distro),
        [list, distro, arch] if list == "list" => list_image_kinds(distro, arch),
        [manifest, distro, arch, kind] if manifest == "manifest" => {
            print_manifest(distro, arch, kind, None, None)
        }
        [manifest, distro, arch, kind, blueprint] if manifest == "manifest" => {
            print_manifest(distro, arch, kind, Some(Path::new(blueprint)), None)
        }
        [manifest, distro, arch, kind, blueprint, options] if manifest == "manifest" => print_manifest(
            distro,
            arch,
            kind,
            Some(Path::new(blueprint)),
            Some(Path::new(options)),
        ),
        _ => bail!(usage()),
    }
}

fn list_distributions() -> Result<()> {
    for name in registry().list_distributions() {
        println!("{name}");
    }
    Ok(())
}

fn list_arches(distro: &str) -> Result<()> {
    let distribution = registry().get_distribution(distro)?;
    for arch in distribution.list_arches() {
        println!("{arch}");
    }
    Ok(())
}

fn list_image_kinds(distro: &str, arch: &str) -> Result<()> {
    let architecture = registry().get_distribution(distro)?.get_arch(arch)?;
    for kind in architecture.image_kinds() {
        if kind.aliases().is_empty() {
            println!("{}", kind.name());
        } else {
            println!("{} (aliases: {})", kind.name(), kind.aliases().join(", "));
        }
    }
    Ok(())
}

fn print_manifest(
    distro: &str,
    arch: &str,
    kind: &str,
    blueprint: Option<&Path>,
    options: Option<&Path>,
) -> Result<()> {
    let image_kind = registry()
        .get_distribution(distro)?
        .get_arch(arch)?
        .get_image_kind(kind)?;

    let blueprint = match blueprint {
        Some(path) => load_blueprint(path)?,
        None => Blueprint::default(),
    };
    let options = match options {
        Some(path) => load_image_options(path)?,
        None => ImageOptions::default(),
    };

    let manifest = image_kind.manifest(&blueprint, &options).with_context(|| {
        format!(
            "building {} manifest for {} {}",
            image_kind.name(),
            image_kind.distro_name(),
            arch
        )
    })?;

    let json = manifest.to_json().context("serializing manifest")?;
    let digest = manifest.digest().context("hashing manifest")?;
    println!("{json}");
    info!(kind = image_kind.name(), %digest, "manifest written");
    Ok(())
}
