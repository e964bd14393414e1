//! Integration tests for CLI commands.
use rstest::rstest;

use itertools::Itertools;
use tempfile::tempdir;

mod common;
use common::{assert_gridpath_fails, assert_gridpath_runs, get_gridpath_stdout};

const EXAMPLE_NAME: &str = "simple";
const SCENARIO_DIR: &str = "scenarios/simple";
const PATCH_EXAMPLE_NAME: &str = "simple_expensive_gas";

/// Test the `run` command
#[test]
fn check_run_command() {
    // Save results to non-existent directory to check that directory creation works
    let tempdir = tempdir().unwrap();
    let output_dir = tempdir.path().join("results");
    assert_gridpath_runs(&[
        "run",
        SCENARIO_DIR,
        "--output-dir",
        &output_dir.to_string_lossy(),
    ]);

    assert!(output_dir.join("metadata.toml").is_file());
    assert!(output_dir.join("objective_function_value.txt").is_file());
    assert!(output_dir.join("results").join("costs.csv").is_file());
}

/// Test that the `run` command refuses to overwrite results unless asked to
#[test]
fn check_run_command_overwrite() {
    let tempdir = tempdir().unwrap();
    let output_dir = tempdir.path().join("results");
    let output_dir = output_dir.to_string_lossy();
    let args = ["run", SCENARIO_DIR, "--output-dir", &output_dir];
    assert_gridpath_runs(&args);
    assert_gridpath_fails(&args);

    let mut args = args.to_vec();
    args.push("--overwrite");
    assert_gridpath_runs(&args);
}

/// Test the `validate` command
#[test]
fn check_validate_command() {
    assert_gridpath_runs(&["validate", SCENARIO_DIR]);
}

/// Test the `validate` command with a directory which is not a scenario
#[test]
fn check_validate_command_missing_scenario() {
    let tempdir = tempdir().unwrap();
    assert_gridpath_fails(&["validate", &tempdir.path().to_string_lossy()]);
}

/// Test the `example list` command
#[rstest]
#[case(true)]
#[case(false)]
fn check_example_list_command(#[case] patch: bool) {
    let mut args = vec!["example", "list"];
    if patch {
        args.push("--patch");
    }

    let stdout = get_gridpath_stdout(&args);
    let lines = stdout.split('\n').collect_vec();
    assert!(lines.first().is_some_and(|s| !s.is_empty()));
    assert!(lines.last().is_some_and(|s| s.is_empty()));
}

/// Test the `example info` command
#[test]
fn check_example_info_command() {
    assert!(!get_gridpath_stdout(&["example", "info", EXAMPLE_NAME]).is_empty());
}

/// Test the `example extract`
#[rstest]
#[case(true)]
#[case(false)]
fn check_example_extract_command(#[case] patch: bool) {
    let tmp = tempdir().unwrap();
    let output_dir = tmp.path().join("out");
    let output_dir_str = output_dir.to_string_lossy();
    let mut args = vec!["example", "extract"];
    if patch {
        args.extend(["--patch", PATCH_EXAMPLE_NAME]);
    } else {
        args.push(EXAMPLE_NAME);
    }
    args.push(&output_dir_str);

    assert_gridpath_runs(&args);
    assert!(
        output_dir.join("inputs").read_dir().unwrap().next().is_some(),
        "Inputs dir is empty"
    );
}

/// Test the `settings show-default` command
#[test]
fn check_settings_show_default_command() {
    let stdout = get_gridpath_stdout(&["settings", "show-default"]);
    assert!(stdout.contains("# log_level = \"info\""));
}

// NB: `example run` is covered by regression tests
