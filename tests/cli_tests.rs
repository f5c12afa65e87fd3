//! Integration tests for the ozimap binary
//!
//! Everything here runs offline: either the run stops before the first tile
//! request (dry run, argument errors) or downloading is switched off.

use std::path::Path;
use std::process::{Command, Output};

fn ozimap(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_ozimap"))
        .args(args)
        .env_remove("RUST_LOG")
        .env_remove("OZIMAP_API_KEY")
        .output()
        .expect("Failed to run ozimap")
}

fn path_arg(path: &Path) -> &str {
    path.to_str().expect("temp path is not UTF-8")
}

#[test]
fn test_help_lists_region_options() {
    let output = ozimap(&["--help"]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("--region-center"));
    assert!(stdout.contains("--region-from-url"));
    assert!(stdout.contains("--image-height"));
}

#[test]
fn test_dry_run_json_plan() {
    let dir = tempfile::tempdir().unwrap();
    let map = dir.path().join("moscow.map");

    let output = ozimap(&[
        "-c", "55.928817,37.758293", "-z", "12", "-w", "1000", "-h", "1000",
        "--api-key", "abc", "--dry-run", "--json", path_arg(&map),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let plan: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(plan["zoom"], 12);
    assert_eq!(plan["image_width"], 1000);

    let tiles = plan["tiles"].as_array().unwrap();
    assert_eq!(tiles.len(), 4);
    assert_eq!(tiles[1]["x"], 640);
    assert_eq!(tiles[1]["width"], 360);
    assert!(tiles[0]["url"].as_str().unwrap().contains("key=abc"));

    assert!(!map.exists(), "dry run must not write files");
}

#[test]
fn test_dry_run_text_plan() {
    let output = ozimap(&[
        "-n", "56.0,38.0", "-s", "55.5,37.0", "-w", "800", "-h", "800", "--dry-run", "area.map",
    ]);
    let stdout = String::from_utf8_lossy(&output.stdout);

    assert!(output.status.success());
    assert!(stdout.contains("DRY RUN"));
    assert!(stdout.contains("area.jpg"));
    assert!(stdout.contains("Tiles:"));
}

#[test]
fn test_no_download_writes_blank_map() {
    let dir = tempfile::tempdir().unwrap();
    let map = dir.path().join("blank.map");

    let output = ozimap(&[
        "-c", "55.9,37.7", "-x", "10,300,200", "-t", "png8", "--no-download",
        "--copyright", "blank test", path_arg(&map),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let image = dir.path().join("blank.png");
    assert!(image.exists());
    let content = std::fs::read_to_string(&map).unwrap();
    assert!(content.contains("blank test"));
    assert!(content.contains("blank.png"));
    assert!(content.contains("IWH,Map Image Width/Height,300,200"));
}

#[test]
fn test_no_clobber_keeps_existing_map() {
    let dir = tempfile::tempdir().unwrap();
    let map = dir.path().join("kept.map");
    std::fs::write(&map, "original").unwrap();

    let output = ozimap(&[
        "-c", "55.9,37.7", "-x", "10,100,100", "--no-download", "--no-clobber", path_arg(&map),
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("use --force to overwrite"));
    assert_eq!(std::fs::read_to_string(&map).unwrap(), "original");
}

#[test]
fn test_insufficient_parameters() {
    let output = ozimap(&["-c", "55.9,37.7", "--dry-run", "x.map"]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr)
        .contains("Not enough parameters to calculate region size"));
}

#[test]
fn test_missing_template() {
    let dir = tempfile::tempdir().unwrap();
    let map = dir.path().join("t.map");
    let template = dir.path().join("nope.tpl");

    let output = ozimap(&[
        "-c", "55.9,37.7", "-x", "10,100,100", "--no-download", "--force",
        "--template", path_arg(&template), path_arg(&map),
    ]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("Template file not found"));
    assert!(!map.exists());
}

#[test]
fn test_invalid_arguments_rejected() {
    assert!(!ozimap(&["-c", "95.0,10.0", "--dry-run", "x.map"]).status.success());
    assert!(!ozimap(&["-t", "tif", "x.map"]).status.success());
    assert!(!ozimap(&["--force", "--no-clobber", "x.map"]).status.success());
    assert!(!ozimap(&[]).status.success());
}
