//! Lazily resolved setup.py metadata.
//!
//! Three facts drive the package step: name, url, and version. Each comes
//! from an explicit CLI override when given, otherwise from querying
//! `setup.py` with the virtualenv's own interpreter (the project's setup.py
//! may import modules that only exist inside the built environment). Each
//! fact is resolved at most once per run.

use anyhow::Result;

use crate::config::{BuildPaths, Config};
use crate::error::Error;
use crate::process::Cmd;

/// A queryable setup.py field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Url,
    Version,
}

impl Field {
    /// The setup.py query flag for this field.
    fn flag(self) -> &'static str {
        match self {
            Field::Name => "--name",
            Field::Url => "--url",
            Field::Version => "--version",
        }
    }

    /// The CLI override for this field, if one was given.
    fn override_in(self, config: &Config) -> Option<&str> {
        match self {
            Field::Name => config.package_name.as_deref(),
            Field::Url => config.repo_url.as_deref(),
            Field::Version => config.package_version.as_deref(),
        }
    }
}

/// Memoized {name, url, version} cells. Once a cell is populated it is
/// never overwritten for the remainder of the run.
#[derive(Debug, Default)]
pub struct SetupMeta {
    name: Option<String>,
    url: Option<String>,
    version: Option<String>,
}

impl SetupMeta {
    fn cell(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Name => &mut self.name,
            Field::Url => &mut self.url,
            Field::Version => &mut self.version,
        }
    }

    /// Resolve a field, caching the result.
    ///
    /// The fallback query runs `<venv>/bin/python setup.py --<field>` in the
    /// project directory, so it is only valid once the virtualenv has been
    /// built; calling it earlier is a configuration error.
    pub fn resolve(
        &mut self,
        field: Field,
        config: &Config,
        paths: &BuildPaths,
    ) -> Result<String> {
        if let Some(value) = self.cell(field).as_ref() {
            return Ok(value.clone());
        }

        let value = match field.override_in(config) {
            Some(explicit) => explicit.to_string(),
            None => {
                let python = paths.venv_python();
                if !python.is_file() {
                    return Err(Error::Configuration(format!(
                        "cannot query setup.py {}: no interpreter at {} (virtualenv not built yet?)",
                        field.flag(),
                        python.display()
                    ))
                    .into());
                }
                let result = Cmd::from_path(&python)
                    .arg("setup.py")
                    .arg(field.flag())
                    .dir(&paths.project_dir)
                    .run()?;
                result.stdout_trimmed().to_string()
            }
        };

        *self.cell(field) = Some(value.clone());
        Ok(value)
    }
}
