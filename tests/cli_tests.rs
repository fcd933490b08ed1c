mod common;

use sc_boxcutter::cli::USAGE;
use sc_settings::Settings;

use common::{ScriptedPlatform, args, run};

#[test]
fn help_prints_usage_and_exits_one() {
    let mut platform = ScriptedPlatform::default();
    let result = run(&mut platform, &Settings::default(), &args(&["--help"]));

    assert_eq!(result.status, 1);
    assert_eq!(result.stdout, USAGE);
    assert!(result.stderr.is_empty());
    assert!(platform.captures.is_empty());
}

#[test]
fn version_exits_one() {
    let mut platform = ScriptedPlatform::default();
    let result = run(&mut platform, &Settings::default(), &args(&["-v"]));

    assert_eq!(result.status, 1);
    assert!(result.stdout.contains("boxcutter 1.3"));
    assert!(platform.captures.is_empty());
}

#[test]
fn malformed_coords_print_error_and_usage() {
    let mut platform = ScriptedPlatform::default();
    let result = run(&mut platform, &Settings::default(), &args(&["-c", "1,2,3"]));

    assert_eq!(result.status, 1);
    assert_eq!(result.stderr, "error: expected 4 comma separated integers\n");
    assert_eq!(result.stdout, USAGE);
    assert!(platform.captures.is_empty());
}

#[test]
fn missing_coords_value() {
    let mut platform = ScriptedPlatform::default();
    let result = run(&mut platform, &Settings::default(), &args(&["--coords"]));

    assert_eq!(result.status, 1);
    assert_eq!(result.stderr, "error: expected argument for -c,--coord\n");
}

#[test]
fn unknown_option_is_named() {
    let mut platform = ScriptedPlatform::default();
    let result = run(&mut platform, &Settings::default(), &args(&["-q"]));

    assert_eq!(result.status, 1);
    assert_eq!(result.stderr, "error: unknown option '-q'\n");
    assert_eq!(result.stdout, USAGE);
}
