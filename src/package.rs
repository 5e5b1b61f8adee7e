//! The terminal fpm invocation.

use anyhow::Result;

use crate::config::{BuildPaths, Config};
use crate::process::Cmd;
use crate::setup_meta::{Field, SetupMeta};

/// The version string handed to fpm.
///
/// A configured build number is appended as `<version>~<build-number>`; the
/// tilde makes dpkg order the suffixed version *before* the bare one, so a
/// CI build never outranks a proper release. The resolved version fact
/// itself is left untouched.
pub fn version_string(version: &str, build_number: Option<&str>) -> String {
    match build_number {
        Some(number) => format!("{}~{}", version, number),
        None => version.to_string(),
    }
}

/// Assemble and run fpm over the build root. Once this runs the pipeline is
/// complete or has fatally failed; there is no undo.
pub fn package(config: &Config, paths: &BuildPaths, meta: &mut SetupMeta) -> Result<()> {
    let name = meta.resolve(Field::Name, config, paths)?;
    let url = meta.resolve(Field::Url, config, paths)?;
    let version = meta.resolve(Field::Version, config, paths)?;
    let version = version_string(&version, config.build_number.as_deref());

    // -s dir: build the package from a directory tree
    // --prefix: file root the tree installs under
    // -C: content root, i.e. our .build directory
    // the trailing '.' is the path inside -C to package
    let mut cmd = Cmd::new("fpm")
        .args([
            "--deb-no-default-config-files",
            "--verbose",
            "-s",
            "dir",
            "-t",
            &config.package_format,
            "-n",
            &name,
            "--prefix",
            &config.package_prefix,
            "-v",
            &version,
            "--url",
            &url,
            "-C",
        ])
        .arg_path(&paths.build_root);
    for dependency in &config.dependency {
        cmd = cmd.arg("-d").arg(dependency);
    }
    cmd.arg(".").dir(&paths.project_dir).stream_to_stdout()
}
