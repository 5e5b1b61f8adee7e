//! Integration tests for the build pipeline stages.
//!
//! External tools (python, virtualenv-tools, shim scripts) are replaced by
//! mock shell scripts inside scratch projects; no real virtualenv or fpm is
//! needed.

mod helpers;

use helpers::{assert_symlink, create_mock_executable, TestProject};
use std::fs;
use std::path::{Path, PathBuf};

use vep::config::BuildPaths;
use vep::entry_points;
use vep::error::Error;
use vep::extras;
use vep::pipeline;
use vep::relocate;
use vep::setup_meta::{Field, SetupMeta};
use vep::shim;

// =============================================================================
// Pipeline precondition
// =============================================================================

#[test]
fn missing_setup_py_fails_before_any_command_runs() {
    let project = TestProject::bare();
    let config = project.config(&[]);

    let err = pipeline::run(&config).unwrap_err();

    match err.downcast_ref::<Error>() {
        Some(Error::MissingArtifact(msg)) => assert!(msg.contains("setup.py")),
        other => panic!("unexpected error: {:?}", other),
    }
    // Nothing was built: the precondition fired before the venv stage.
    assert!(!project.dir.join(".build").exists());
}

// =============================================================================
// Metadata resolution
// =============================================================================

#[test]
fn setup_query_is_memoized() {
    let project = TestProject::new();
    let config = project.config(&[]);
    let paths = project.paths();
    let venv = project.fake_venv();

    let log = project.dir.join("python-calls.log");
    create_mock_executable(
        &venv.join("bin/python"),
        &format!("echo called >> {}\necho my-app", log.display()),
    );

    let mut meta = SetupMeta::default();
    let first = meta.resolve(Field::Name, &config, &paths).unwrap();
    let second = meta.resolve(Field::Name, &config, &paths).unwrap();

    assert_eq!(first, "my-app");
    assert_eq!(second, "my-app");
    let calls = fs::read_to_string(&log).unwrap();
    assert_eq!(calls.lines().count(), 1, "setup.py was queried more than once");
}

#[test]
fn setup_query_output_is_trimmed() {
    let project = TestProject::new();
    let config = project.config(&[]);
    let paths = project.paths();
    let venv = project.fake_venv();

    create_mock_executable(&venv.join("bin/python"), "echo '  1.2.3  '");

    let mut meta = SetupMeta::default();
    let version = meta.resolve(Field::Version, &config, &paths).unwrap();
    assert_eq!(version, "1.2.3");
}

// =============================================================================
// Relocation
// =============================================================================

#[test]
fn relocate_renames_and_rewrites_to_the_install_path() {
    let project = TestProject::new();
    let config = project.config(&["--package-name", "my-app", "--package-prefix", "/opt"]);
    let mut paths = project.paths();
    let venv = project.fake_venv();

    let log = project.dir.join("vetools.log");
    create_mock_executable(
        &venv.join("bin/virtualenv-tools"),
        &format!("echo \"$PWD|$@\" >> {}", log.display()),
    );

    let mut meta = SetupMeta::default();
    relocate::relocate(&config, &mut paths, &mut meta).unwrap();

    // The tree moved from the generic name to the package name.
    let relocated = project.dir.join(".build").join("my-app");
    assert!(relocated.is_dir());
    assert!(!project.dir.join(".build").join("virtualenv").exists());
    assert_eq!(paths.target(), relocated.as_path());

    // virtualenv-tools ran inside the relocated tree and was handed the
    // install-time path, not the build-time path.
    let call = fs::read_to_string(&log).unwrap();
    let (cwd, args) = call.trim().split_once('|').unwrap();
    assert_eq!(cwd, relocated.to_string_lossy());
    assert_eq!(args, "--update-path /opt/my-app");
}

// =============================================================================
// Entry-point linking
// =============================================================================

#[test]
fn console_scripts_become_relative_symlinks() {
    let project = TestProject::new();
    let paths = project.paths();
    fs::create_dir_all(project.dir.join(".build")).unwrap();

    // Hyphenated package name maps to an underscored egg-info directory.
    let egg = project.dir.join("my_app.egg-info");
    fs::create_dir_all(&egg).unwrap();
    fs::write(
        egg.join("entry_points.txt"),
        "[console_scripts]\nfoo = pkg.cli:main\nbar = pkg.cli:other\n",
    )
    .unwrap();

    entry_points::link_entry_points(&paths, "my-app").unwrap();

    let bin = project.dir.join(".build").join("bin");
    assert_symlink(&bin.join("foo"), Path::new("../my-app/bin/foo"));
    assert_symlink(&bin.join("bar"), Path::new("../my-app/bin/bar"));

    // Linking again replaces the existing symlinks instead of failing.
    entry_points::link_entry_points(&paths, "my-app").unwrap();
    assert_symlink(&bin.join("foo"), Path::new("../my-app/bin/foo"));
}

#[test]
fn missing_entry_points_file_is_a_noop() {
    let project = TestProject::new();
    let paths = project.paths();

    entry_points::link_entry_points(&paths, "my-app").unwrap();

    let bin = project.dir.join(".build").join("bin");
    assert!(bin.is_dir());
    assert_eq!(fs::read_dir(&bin).unwrap().count(), 0);
}

// =============================================================================
// Shim script
// =============================================================================

#[test]
fn shim_sees_the_build_environment_variables() {
    let project = TestProject::new();
    let mut paths = project.paths();
    project.fake_venv();
    fs::rename(
        project.dir.join(".build/virtualenv"),
        project.dir.join(".build/my-app"),
    )
    .unwrap();
    paths.retarget("my-app");

    let shim_path = project.dir.join("shim.sh");
    let log = project.dir.join("shim.log");
    create_mock_executable(
        &shim_path,
        &format!(
            "echo \"$PACKAGE_PREFIX|$PACKAGE_NAME|$PACKAGE_DIR|$TARGET|$BUILD_DIR\" > {}",
            log.display()
        ),
    );

    let shim_arg = shim_path.to_string_lossy().into_owned();
    let config = project.config(&["--shim-script", &shim_arg]);
    shim::run_shim(&config, &paths, "my-app").unwrap();

    let line = fs::read_to_string(&log).unwrap();
    let fields: Vec<&str> = line.trim().split('|').collect();
    assert_eq!(fields[0], "/usr/local");
    assert_eq!(fields[1], "my-app");
    assert_eq!(fields[2], "/usr/local/my-app");
    assert_eq!(fields[3], project.dir.join(".build/my-app").to_string_lossy());
    assert_eq!(fields[4], project.dir.join(".build").to_string_lossy());
}

#[test]
fn failing_shim_is_fatal() {
    let project = TestProject::new();
    let paths = project.paths();

    let shim_path = project.dir.join("shim.sh");
    create_mock_executable(&shim_path, "exit 7");

    let shim_arg = shim_path.to_string_lossy().into_owned();
    let config = project.config(&["--shim-script", &shim_arg]);
    let err = shim::run_shim(&config, &paths, "my-app").unwrap_err();

    match err.downcast_ref::<Error>() {
        Some(Error::CommandFailed { code, .. }) => assert_eq!(*code, 7),
        other => panic!("unexpected error: {:?}", other),
    }
}

// =============================================================================
// Extra paths
// =============================================================================

#[test]
fn extra_paths_copy_into_the_package_tree() {
    let project = TestProject::new();
    let paths = project.paths();
    fs::create_dir_all(project.dir.join(".build/my-app")).unwrap();

    fs::create_dir_all(project.dir.join("assets/img")).unwrap();
    fs::write(project.dir.join("assets/img/logo.txt"), "logo").unwrap();

    let config = project.config(&["--extra-path", "assets"]);
    extras::copy_extra_paths(&config, &paths, "my-app").unwrap();

    assert_eq!(
        fs::read_to_string(project.dir.join(".build/my-app/assets/img/logo.txt")).unwrap(),
        "logo"
    );
}

#[test]
fn existing_destination_is_fatal() {
    let project = TestProject::new();
    let paths = project.paths();
    fs::create_dir_all(project.dir.join(".build/my-app/assets")).unwrap();
    fs::create_dir_all(project.dir.join("assets")).unwrap();

    let config = project.config(&["--extra-path", "assets"]);
    let err = extras::copy_extra_paths(&config, &paths, "my-app").unwrap_err();
    assert!(err.to_string().contains("existing"));
}

#[test]
fn missing_extra_path_is_fatal() {
    let project = TestProject::new();
    let paths = project.paths();
    fs::create_dir_all(project.dir.join(".build/my-app")).unwrap();

    let config = project.config(&["--extra-path", "no-such-dir"]);
    let err = extras::copy_extra_paths(&config, &paths, "my-app").unwrap_err();
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::MissingArtifact(_))
    ));
}

// =============================================================================
// Paths
// =============================================================================

#[test]
fn build_paths_track_exactly_one_target() {
    let mut paths = BuildPaths::new(PathBuf::from("/work/app"));
    assert_eq!(paths.target(), Path::new("/work/app/.build/virtualenv"));
    assert_eq!(paths.bin_dir(), PathBuf::from("/work/app/.build/bin"));

    paths.retarget("my-app");
    assert_eq!(paths.target(), Path::new("/work/app/.build/my-app"));
    assert_eq!(paths.venv_pip(), PathBuf::from("/work/app/.build/my-app/bin/pip"));
}
