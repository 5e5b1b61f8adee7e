//! The build pipeline: a fixed sequence of stages, each fatal on failure.
//!
//! Order matters everywhere. Metadata can only be resolved once the
//! virtualenv exists; relocation must happen before the symlink, shim, and
//! copy stages that reference the renamed tree; fpm runs last.

use anyhow::Result;

use crate::config::{BuildPaths, Config};
use crate::entry_points;
use crate::error::Error;
use crate::extras;
use crate::package;
use crate::relocate;
use crate::setup_meta::{Field, SetupMeta};
use crate::shim;
use crate::venv;

/// Run the whole pipeline for one project checkout.
pub fn run(config: &Config) -> Result<()> {
    let mut paths = BuildPaths::new(config.directory.clone());

    // The one hard precondition, checked before any external command runs.
    if !config.directory.join("setup.py").is_file() {
        return Err(Error::MissingArtifact(format!(
            "no setup.py in {}; can't proceed; try --help",
            config.directory.display()
        ))
        .into());
    }

    // The virtualenv must exist before anything else: resolving metadata
    // runs setup.py, which may import modules only available inside it.
    venv::build(config, &paths)?;

    let mut meta = SetupMeta::default();
    for field in [Field::Name, Field::Url, Field::Version] {
        meta.resolve(field, config, &paths)?;
    }

    relocate::relocate(config, &mut paths, &mut meta)?;
    relocate::clean_bytecode(paths.target())?;

    let name = meta.resolve(Field::Name, config, &paths)?;
    if !config.skip_scripts {
        entry_points::link_entry_points(&paths, &name)?;
    }
    shim::run_shim(config, &paths, &name)?;
    extras::copy_extra_paths(config, &paths, &name)?;
    package::package(config, &paths, &mut meta)
}
