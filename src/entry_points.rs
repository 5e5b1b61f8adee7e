//! Console entry-point discovery and symlinking.
//!
//! `setup.py install` leaves an `entry_points.txt` inside the project's
//! egg-info directory. Its `console_scripts` section names the executables
//! the environment generated under the virtualenv's bin. Each one gets a
//! relative symlink in `<build-root>/bin`, which lands at `<prefix>/bin`
//! once the package is installed.

use anyhow::{Context, Result};
use std::fs;
use std::os::unix::fs as unix_fs;
use std::path::PathBuf;

use crate::config::BuildPaths;

/// Metadata directory for a package name: hyphens become underscores.
/// Someone could be foolish enough to use a hyphen in their package name.
pub fn egg_info_dir(name: &str) -> String {
    format!("{}.egg-info", name.replace('-', "_"))
}

/// Pull the `console_scripts` entries out of an entry_points.txt, in
/// declaration order.
///
/// The file is INI-style: `[section]` headers over `key = value` lines.
/// Anything outside `console_scripts` is ignored, as are comments and
/// malformed lines.
pub fn parse_console_scripts(text: &str) -> Vec<(String, String)> {
    let mut in_section = false;
    let mut scripts = Vec::new();
    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        if let Some(header) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            in_section = header.trim() == "console_scripts";
            continue;
        }
        if in_section {
            if let Some((key, value)) = line.split_once('=') {
                scripts.push((key.trim().to_string(), value.trim().to_string()));
            }
        }
    }
    scripts
}

/// Symlink every declared console entry point into `<build-root>/bin`.
///
/// A project without entry points (no egg-info, no entry_points.txt, or no
/// console_scripts section) is valid; this becomes a no-op. Pre-existing
/// symlinks at a destination are replaced.
pub fn link_entry_points(paths: &BuildPaths, package_name: &str) -> Result<()> {
    println!("sym-linking entry points");
    let bin_dir = paths.bin_dir();
    fs::create_dir_all(&bin_dir)
        .with_context(|| format!("failed to create {}", bin_dir.display()))?;

    let entry_points = paths
        .project_dir
        .join(egg_info_dir(package_name))
        .join("entry_points.txt");
    if !entry_points.is_file() {
        println!("no entry points, so no symlinks to create");
        return Ok(());
    }

    let text = fs::read_to_string(&entry_points)
        .with_context(|| format!("failed to read {}", entry_points.display()))?;
    for (command, _target) in parse_console_scripts(&text) {
        // Relative so the link survives the move from the build root to the
        // install prefix.
        let src = PathBuf::from("..").join(package_name).join("bin").join(&command);
        let dest = bin_dir.join(&command);
        println!("sym-linking {} to {}", src.display(), dest.display());
        if dest.symlink_metadata().is_ok() {
            fs::remove_file(&dest)
                .with_context(|| format!("failed to replace {}", dest.display()))?;
        }
        unix_fs::symlink(&src, &dest)
            .with_context(|| format!("failed to symlink {}", dest.display()))?;
    }
    Ok(())
}
