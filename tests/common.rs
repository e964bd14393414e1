use assert_cmd::cargo_bin_cmd;

/// Run GridPath with the given arguments and check it succeeds
pub fn assert_gridpath_runs(args: &[&str]) {
    cargo_bin_cmd!("gridpath")
        .env("GRIDPATH_USE_DEFAULT_SETTINGS", "1")
        .env("GRIDPATH_LOG_LEVEL", "off")
        .args(args)
        .assert()
        .success();
}

/// Run GridPath with the given arguments and check it fails
#[allow(dead_code)]
pub fn assert_gridpath_fails(args: &[&str]) {
    cargo_bin_cmd!("gridpath")
        .env("GRIDPATH_USE_DEFAULT_SETTINGS", "1")
        .env("GRIDPATH_LOG_LEVEL", "off")
        .args(args)
        .assert()
        .failure();
}

/// Run GridPath with the given arguments and return what it wrote to stdout
#[allow(dead_code)]
pub fn get_gridpath_stdout(args: &[&str]) -> String {
    let output = cargo_bin_cmd!("gridpath")
        .env("GRIDPATH_USE_DEFAULT_SETTINGS", "1")
        .args(args)
        .output()
        .unwrap();
    assert!(output.status.success());

    String::from_utf8(output.stdout).unwrap()
}
