//! Optional user shim script, run between build and package.
//!
//! The escape hatch for packages that need surgery the pipeline does not
//! know about. The script sees the parent environment plus a fixed set of
//! variables describing the build layout.

use anyhow::Result;

use crate::config::{BuildPaths, Config};
use crate::process::Cmd;

/// Run the configured shim script, if any. Non-zero exit is fatal.
pub fn run_shim(config: &Config, paths: &BuildPaths, package_name: &str) -> Result<()> {
    let script = match &config.shim_script {
        Some(script) => script,
        None => return Ok(()),
    };

    println!("running shim script: {}", script.display());
    Cmd::from_path(script)
        .dir(&paths.project_dir)
        .env("PACKAGE_PREFIX", &config.package_prefix)
        .env("PACKAGE_NAME", package_name)
        .env(
            "PACKAGE_DIR",
            config.install_path(package_name).to_string_lossy(),
        )
        .env("TARGET", paths.target().to_string_lossy())
        .env("BUILD_DIR", paths.build_root.to_string_lossy())
        .stream_to_stdout()
}
