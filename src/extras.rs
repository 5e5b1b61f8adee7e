//! Extra project paths copied into the package tree.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;
use walkdir::WalkDir;

use crate::config::{BuildPaths, Config};
use crate::error::Error;

/// Copy every configured extra path into `<build-root>/<name>/<basename>`.
///
/// A missing source or an already-present destination is fatal; there are
/// no merge semantics.
pub fn copy_extra_paths(config: &Config, paths: &BuildPaths, package_name: &str) -> Result<()> {
    for extra in &config.extra_path {
        let src = if extra.is_absolute() {
            extra.clone()
        } else {
            paths.project_dir.join(extra)
        };
        if !src.exists() {
            return Err(
                Error::MissingArtifact(format!("extra path {} does not exist", src.display()))
                    .into(),
            );
        }
        let basename = src
            .file_name()
            .with_context(|| format!("extra path {} has no basename", src.display()))?;
        let dst = paths.build_root.join(package_name).join(basename);
        if dst.exists() {
            bail!("refusing to copy over existing {}", dst.display());
        }
        println!("copying {} to {}", src.display(), dst.display());
        copy_tree(&src, &dst)?;
    }
    Ok(())
}

/// Recursive copy preserving symlinks. The destination must not exist.
fn copy_tree(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry = entry?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .expect("walkdir yields paths under its root");
        let dest = dst.join(rel);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&dest)
                .with_context(|| format!("failed to create {}", dest.display()))?;
        } else if file_type.is_symlink() {
            let link = fs::read_link(entry.path())?;
            std::os::unix::fs::symlink(&link, &dest)
                .with_context(|| format!("failed to symlink {}", dest.display()))?;
        } else {
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &dest).with_context(|| {
                format!("failed to copy {} to {}", entry.path().display(), dest.display())
            })?;
        }
    }
    Ok(())
}
