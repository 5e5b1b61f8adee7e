//! Virtualenv construction: the first and largest pipeline stage.
//!
//! Builds a throwaway environment under `.build/virtualenv`, installs build
//! tooling at the configured versions, then the project's requirements, then
//! the project itself. Every step is fatal on failure; nothing is retried.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{BuildPaths, Config};
use crate::error::Error;
use crate::process::Cmd;

/// Build the virtualenv and install everything into it.
pub fn build(config: &Config, paths: &BuildPaths) -> Result<()> {
    destroy_previous(paths.target())?;
    create(config, paths)?;
    install_build_tools(config, &paths.venv_pip())?;
    install_requirements(config, paths)?;
    install_project(paths)?;
    Ok(())
}

/// Remove any virtualenv left over from a previous run. Absence is fine.
fn destroy_previous(target: &Path) -> Result<()> {
    if target.exists() {
        println!("deleting previous virtual environment");
        fs::remove_dir_all(target)
            .with_context(|| format!("failed to remove {}", target.display()))?;
    }
    Ok(())
}

/// Locate the virtualenv executable.
///
/// A virtualenv living next to the configured interpreter wins (it is built
/// for that interpreter); otherwise fall back to $PATH.
pub fn find_virtualenv(python: &Path) -> Result<PathBuf> {
    if let Some(bin_dir) = python.parent() {
        let sibling = bin_dir.join("virtualenv");
        if sibling.is_file() {
            return Ok(sibling);
        }
    }
    which::which("virtualenv").map_err(|_| {
        Error::Configuration(format!(
            "no virtualenv found next to {} or on $PATH",
            python.display()
        ))
        .into()
    })
}

fn create(config: &Config, paths: &BuildPaths) -> Result<()> {
    println!("creating new virtual environment");
    let virtualenv = find_virtualenv(&config.python)?;
    Cmd::from_path(&virtualenv)
        .arg("-p")
        .arg_path(&config.python)
        .arg_path(paths.target())
        .stream_to_stdout()
}

/// Install pip and setuptools into the fresh environment, pinned when a
/// version is configured, upgraded to latest otherwise.
fn install_build_tools(config: &Config, pip: &Path) -> Result<()> {
    for (tool, version) in [
        ("pip", &config.pip_version),
        ("setuptools", &config.setuptools_version),
    ] {
        println!("installing {}=={}", tool, version);
        let cmd = Cmd::from_path(pip).arg("install");
        let cmd = if version == "latest" {
            cmd.arg(tool).arg("--upgrade")
        } else {
            cmd.arg(format!("{}=={}", tool, version))
        };
        cmd.stream_to_stdout()?;
    }
    Ok(())
}

/// Pick the requirements file: first existing candidate wins.
///
/// Candidates come from the configuration, or default to requirements.txt
/// then requirements.pip. No usable file is a fatal, user-facing error.
pub fn requirements_filename(dir: &Path, candidates: &[String]) -> Result<PathBuf> {
    for candidate in candidates {
        let path = dir.join(candidate);
        if path.is_file() {
            return Ok(path);
        }
    }
    Err(Error::MissingArtifact(format!(
        "could not find any of these pip requirements files: {}",
        candidates.join(", ")
    ))
    .into())
}

fn install_requirements(config: &Config, paths: &BuildPaths) -> Result<()> {
    let requirements =
        requirements_filename(&paths.project_dir, &config.requirements_candidates())?;

    println!("installing requirements from {}", requirements.display());
    let mut cmd = Cmd::from_path(&paths.venv_pip())
        .arg("install")
        .arg("-r")
        .arg_path(&requirements)
        .arg("-I")
        .dir(&paths.project_dir);
    if let Some(cache) = &config.pip_cache {
        cmd = cmd.arg("--cache-dir").arg_path(cache);
    }
    cmd.stream_to_stdout()
}

/// Install the project itself with the environment's own interpreter.
fn install_project(paths: &BuildPaths) -> Result<()> {
    println!("running setup.py install");
    Cmd::from_path(&paths.venv_python())
        .arg("setup.py")
        .arg("install")
        .dir(&paths.project_dir)
        .stream_to_stdout()
}
