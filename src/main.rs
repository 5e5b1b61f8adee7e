//! vep - build a Python project into a virtualenv and package it with fpm.
//!
//! The pipeline: build virtualenv -> install requirements and project ->
//! rename and relocate the environment -> prune bytecode -> symlink entry
//! points -> optional shim script -> copy extra paths -> fpm.

use anyhow::Result;
use clap::Parser;

use vep::config::{Args, Config};
use vep::pipeline;

fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_args(args)?;
    pipeline::run(&config)
}
