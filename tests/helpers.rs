//! Shared test utilities for vep tests.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use clap::Parser;
use vep::config::{Args, BuildPaths, Config};

/// A scratch Python project checkout.
pub struct TestProject {
    /// Temporary directory (kept alive for the lifetime of the project).
    pub _temp_dir: TempDir,
    /// The project checkout root.
    pub dir: PathBuf,
}

impl TestProject {
    /// Create a minimal project: a setup.py and a requirements.txt.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let dir = temp_dir.path().join("project");
        fs::create_dir_all(&dir).expect("failed to create project dir");
        fs::write(
            dir.join("setup.py"),
            "from setuptools import setup\nsetup(name='my-app', version='1.2.3')\n",
        )
        .expect("failed to write setup.py");
        fs::write(dir.join("requirements.txt"), "requests\n")
            .expect("failed to write requirements");

        Self {
            _temp_dir: temp_dir,
            dir,
        }
    }

    /// Create an empty checkout with no setup.py.
    pub fn bare() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let dir = temp_dir.path().join("project");
        fs::create_dir_all(&dir).expect("failed to create project dir");
        Self {
            _temp_dir: temp_dir,
            dir,
        }
    }

    /// Parse a config rooted at this project.
    pub fn config(&self, extra_args: &[&str]) -> Config {
        let dir = self.dir.to_string_lossy().into_owned();
        let argv = ["vep", "--directory", &dir]
            .into_iter()
            .chain(extra_args.iter().copied());
        let args = Args::try_parse_from(argv).expect("failed to parse test args");
        Config::from_args(args).expect("failed to resolve test config")
    }

    /// Build paths rooted at this project.
    pub fn paths(&self) -> BuildPaths {
        BuildPaths::new(self.dir.clone())
    }

    /// Create a fake virtualenv skeleton at `.build/virtualenv`.
    pub fn fake_venv(&self) -> PathBuf {
        let venv = self.dir.join(".build").join("virtualenv");
        fs::create_dir_all(venv.join("bin")).expect("failed to create venv skeleton");
        venv
    }
}

/// Drop a fake executable shell script at `path`.
pub fn create_mock_executable(path: &Path, body: &str) {
    let script = format!("#!/bin/sh\n{}\n", body);
    fs::write(path, script).expect("failed to write mock executable");
    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .expect("failed to chmod mock executable");
}

/// Assert that `path` is a symlink pointing at `target`.
pub fn assert_symlink(path: &Path, target: &Path) {
    let meta = path
        .symlink_metadata()
        .unwrap_or_else(|_| panic!("expected symlink at {}", path.display()));
    assert!(
        meta.file_type().is_symlink(),
        "{} is not a symlink",
        path.display()
    );
    assert_eq!(
        fs::read_link(path).expect("failed to read symlink"),
        target,
        "wrong symlink target at {}",
        path.display()
    );
}
