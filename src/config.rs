//! CLI surface and resolved build configuration.
//!
//! Flags map 1:1 onto [`Config`] fields. The config is resolved once at
//! startup and read-only afterwards; the only mutable path state lives in
//! [`BuildPaths`].

use anyhow::Result;
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};

/// Default package format handed to fpm.
pub const DEFAULT_PACKAGE_FORMAT: &str = "deb";

/// Default interpreter used to seed the virtualenv.
pub const DEFAULT_PYTHON: &str = "/usr/bin/python3";

/// Requirements files tried, in order, when none are configured explicitly.
/// requirements.txt became the convention later; requirements.pip is kept
/// for older projects.
pub const DEFAULT_REQUIREMENTS_FILES: [&str; 2] = ["requirements.txt", "requirements.pip"];

#[derive(Parser, Debug)]
#[command(name = "vep")]
#[command(about = "Build a Python project into a relocated virtualenv and package it with fpm")]
pub struct Args {
    /// Path to prefix the entire package with.
    #[arg(long, default_value = "/usr/local")]
    pub package_prefix: String,

    /// Repo URL to pass through to fpm.
    #[arg(long)]
    pub repo_url: Option<String>,

    /// The package format, if not deb.
    #[arg(long, default_value = DEFAULT_PACKAGE_FORMAT)]
    pub package_format: String,

    /// The package name, as seen in apt. Defaults to `setup.py --name`.
    #[arg(long)]
    pub package_name: Option<String>,

    /// The package version. Defaults to `setup.py --version`.
    #[arg(long)]
    pub package_version: Option<String>,

    /// The python interpreter to seed the virtualenv with. Symlinks are
    /// followed to the real binary.
    #[arg(long, default_value = DEFAULT_PYTHON)]
    pub python: PathBuf,

    /// Skip symlinking console entry points into the package bin directory.
    #[arg(long)]
    pub skip_scripts: bool,

    /// An extra script to run between the build and package steps. If you
    /// need to do unnatural things to make your package work, this is the
    /// place to do them. Needs a shebang line.
    #[arg(long)]
    pub shim_script: Option<PathBuf>,

    /// A build number, i.e. from your CI, appended to the version as
    /// `<version>~<build-number>`.
    #[arg(long)]
    pub build_number: Option<String>,

    /// Requirements file to look for, in priority order. Repeatable.
    /// Defaults to requirements.txt then requirements.pip.
    #[arg(long = "pip-requirements")]
    pub pip_requirements: Vec<String>,

    /// Version of pip to install in the virtualenv where your application
    /// is built.
    #[arg(long, default_value = "latest")]
    pub pip_version: String,

    /// Version of setuptools to install in the virtualenv where your
    /// application is built.
    #[arg(long, default_value = "latest")]
    pub setuptools_version: String,

    /// Path to look in for the code to package. Defaults to the current
    /// directory.
    #[arg(long)]
    pub directory: Option<PathBuf>,

    /// A package on which your package should depend. Passed through to fpm
    /// as -d. Repeatable.
    #[arg(long = "dependency")]
    pub dependency: Vec<String>,

    /// Additional paths *in your project* to add to the package. Repeatable.
    #[arg(long = "extra-path")]
    pub extra_path: Vec<PathBuf>,

    /// Directory to use as the pip cache; passed to pip as --cache-dir.
    #[arg(long, env = "PIP_CACHE")]
    pub pip_cache: Option<PathBuf>,
}

/// Immutable build configuration, resolved once from CLI input.
#[derive(Debug, Clone)]
pub struct Config {
    pub package_prefix: String,
    pub repo_url: Option<String>,
    pub package_format: String,
    pub package_name: Option<String>,
    pub package_version: Option<String>,
    pub python: PathBuf,
    pub skip_scripts: bool,
    pub shim_script: Option<PathBuf>,
    pub build_number: Option<String>,
    pub pip_requirements: Vec<String>,
    pub pip_version: String,
    pub setuptools_version: String,
    pub directory: PathBuf,
    pub dependency: Vec<String>,
    pub extra_path: Vec<PathBuf>,
    pub pip_cache: Option<PathBuf>,
}

impl Config {
    /// Resolve CLI arguments into a configuration.
    ///
    /// The project directory defaults to the current directory, and the
    /// interpreter path is resolved to its real file: virtualenv wants an
    /// actual binary, not a symlink farm entry.
    pub fn from_args(args: Args) -> Result<Self> {
        let directory = match args.directory {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        let python = resolve_interpreter(&args.python);

        Ok(Self {
            package_prefix: args.package_prefix,
            repo_url: args.repo_url,
            package_format: args.package_format,
            package_name: args.package_name,
            package_version: args.package_version,
            python,
            skip_scripts: args.skip_scripts,
            shim_script: args.shim_script,
            build_number: args.build_number,
            pip_requirements: args.pip_requirements,
            pip_version: args.pip_version,
            setuptools_version: args.setuptools_version,
            directory,
            dependency: args.dependency,
            extra_path: args.extra_path,
            pip_cache: args.pip_cache,
        })
    }

    /// The directory the package lands in once installed on a target host:
    /// `<prefix>/<package-name>`.
    pub fn install_path(&self, package_name: &str) -> PathBuf {
        Path::new(&self.package_prefix).join(package_name)
    }

    /// Requirements candidates: the configured list, or the defaults.
    pub fn requirements_candidates(&self) -> Vec<String> {
        if self.pip_requirements.is_empty() {
            DEFAULT_REQUIREMENTS_FILES
                .iter()
                .map(|s| s.to_string())
                .collect()
        } else {
            self.pip_requirements.clone()
        }
    }
}

/// Follow a symlinked interpreter to its real path.
fn resolve_interpreter(python: &Path) -> PathBuf {
    match fs::canonicalize(python) {
        Ok(real) if real != python => {
            println!(
                "you asked to use {}, which is a link to {}, so we are using that.",
                python.display(),
                real.display()
            );
            real
        }
        Ok(real) => real,
        // Leave a missing interpreter alone; virtualenv will report it.
        Err(_) => python.to_path_buf(),
    }
}

/// Mutable path state derived from the configuration.
///
/// Exactly one target path is current at any time: `.build/virtualenv`
/// until relocation renames it to `.build/<package-name>`.
#[derive(Debug, Clone)]
pub struct BuildPaths {
    /// The project checkout being packaged.
    pub project_dir: PathBuf,
    /// `<project>/.build`, the fpm content root.
    pub build_root: PathBuf,
    target: PathBuf,
}

impl BuildPaths {
    pub fn new(project_dir: PathBuf) -> Self {
        let build_root = project_dir.join(".build");
        let target = build_root.join("virtualenv");
        Self {
            project_dir,
            build_root,
            target,
        }
    }

    /// The current virtualenv location under the build root.
    pub fn target(&self) -> &Path {
        &self.target
    }

    /// Rename the in-memory target to `<build-root>/<name>` and return the
    /// new path. The old path must not be used afterwards.
    pub fn retarget(&mut self, name: &str) -> PathBuf {
        self.target = self.build_root.join(name);
        self.target.clone()
    }

    /// The interpreter inside the current virtualenv.
    pub fn venv_python(&self) -> PathBuf {
        self.target.join("bin").join("python")
    }

    /// pip inside the current virtualenv.
    pub fn venv_pip(&self) -> PathBuf {
        self.target.join("bin").join("pip")
    }

    /// `<build-root>/bin`, where console entry points are symlinked.
    pub fn bin_dir(&self) -> PathBuf {
        self.build_root.join("bin")
    }
}
