//! Relocation of the built virtualenv, plus bytecode cleanup.
//!
//! The environment is built at `.build/virtualenv` but installs to
//! `<prefix>/<package-name>` on a target host. This stage renames the build
//! directory to the package name and has virtualenv-tools rewrite the
//! absolute paths baked into the environment's scripts. The build-time path
//! and the install-time path are deliberately different strings; only the
//! install-time path ever reaches virtualenv-tools.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{BuildPaths, Config};
use crate::error::Error;
use crate::process::Cmd;
use crate::setup_meta::{Field, SetupMeta};

/// Locate virtualenv-tools: prefer the copy installed inside the built
/// environment, fall back to $PATH.
pub fn find_vetools(target: &Path) -> Result<PathBuf> {
    let inside = target.join("bin").join("virtualenv-tools");
    if inside.is_file() {
        return Ok(inside);
    }
    which::which("virtualenv-tools").map_err(|_| {
        Error::Configuration(format!(
            "no virtualenv-tools in {} or on $PATH",
            target.join("bin").display()
        ))
        .into()
    })
}

/// Rename the virtualenv to the package name and rewrite its internal paths
/// to the install-time location.
pub fn relocate(config: &Config, paths: &mut BuildPaths, meta: &mut SetupMeta) -> Result<()> {
    let name = meta.resolve(Field::Name, config, paths)?;
    // Where the package will live once installed on a target host.
    let install_path = config.install_path(&name);

    let old_target = paths.target().to_path_buf();
    let new_target = paths.retarget(&name);
    fs::rename(&old_target, &new_target).with_context(|| {
        format!(
            "failed to move {} to {}",
            old_target.display(),
            new_target.display()
        )
    })?;

    println!(
        "updating paths in {} to {}",
        new_target.display(),
        install_path.display()
    );
    let vetools = find_vetools(&new_target)?;
    Cmd::from_path(&vetools)
        .arg("--update-path")
        .arg_path(&install_path)
        .dir(&new_target)
        .stream_to_stdout()
}

/// Delete compiled bytecode from the relocated tree.
///
/// Purely advisory; it only trims package size. An empty sweep is fine.
pub fn clean_bytecode(target: &Path) -> Result<()> {
    println!("removing .pyc and .pyo files in {}", target.display());

    let mut stale_files = Vec::new();
    let mut cache_dirs = Vec::new();
    for entry in WalkDir::new(target).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if entry.file_type().is_dir() {
            if entry.file_name() == "__pycache__" {
                cache_dirs.push(path.to_path_buf());
            }
        } else if matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("pyc") | Some("pyo")
        ) {
            stale_files.push(path.to_path_buf());
        }
    }

    // Cache directories go first; their contents are the bulk of the files.
    for dir in cache_dirs {
        if dir.exists() {
            fs::remove_dir_all(&dir)
                .with_context(|| format!("failed to remove {}", dir.display()))?;
        }
    }
    for file in stale_files {
        if file.exists() {
            fs::remove_file(&file)
                .with_context(|| format!("failed to remove {}", file.display()))?;
        }
    }
    Ok(())
}
