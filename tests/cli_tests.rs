//! CLI integration tests for the rvl binary
//!
//! These tests run the built binary in a scratch directory and check exit
//! codes, stdout and written files.

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use image::{Rgba, RgbaImage};
use tempfile::TempDir;

fn rvl(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_rvl"))
        .current_dir(dir)
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute rvl")
}

fn write_fixture(dir: &Path, name: &str, size: u32) {
    let mut img = RgbaImage::new(size, size);
    for (x, y, pixel) in img.enumerate_pixels_mut() {
        *pixel = Rgba([(x * 8) as u8, (y * 8) as u8, 128, 255]);
    }
    img.save(dir.join(name)).expect("should write fixture");
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

#[test]
fn test_catalog_json_lists_default_collections() {
    let temp = TempDir::new().unwrap();
    let output = rvl(temp.path(), &["catalog", "--json"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let rows = stdout_json(&output);
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 8);
    assert_eq!(rows[0]["id"], "pixel_animals");
    assert_eq!(rows[0]["included"], true);
    assert_eq!(rows[3]["items"], 71);
}

#[test]
fn test_catalog_uses_discovered_config() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("rvl.toml"),
        r#"
[[collections]]
id = "cats"
title = "Pixel Cats"
folder = "pixel_cats"
prefix = "cat_"
label_prefix = "Pixel cat"
count = 12
"#,
    )
    .unwrap();
    let nested = temp.path().join("sub");
    fs::create_dir_all(&nested).unwrap();

    let output = rvl(&nested, &["catalog"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("cats"));
    assert!(stdout.contains("12 items"));
    assert!(stdout.contains("Unlockable - Pixel Cats"));
}

#[test]
fn test_invalid_config_exits_with_error() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("rvl.toml"), "[layout]\ntile_size = 0\n").unwrap();

    let output = rvl(temp.path(), &["catalog"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("layout.tile_size"));
}

#[test]
fn test_reveal_png_matches_source() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "dog.png", 32);

    let output = rvl(temp.path(), &["reveal", "dog.png", "-o", "out.png", "--size", "32", "--seed", "1"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let source = image::open(temp.path().join("dog.png")).unwrap().to_rgba8();
    let revealed = image::open(temp.path().join("out.png")).unwrap().to_rgba8();
    assert_eq!(revealed, source);
    assert!(String::from_utf8_lossy(&output.stdout).contains("256 chunks"));
}

#[test]
fn test_reveal_gif_default_output() {
    let temp = TempDir::new().unwrap();
    write_fixture(temp.path(), "dog.png", 32);

    let output = rvl(temp.path(), &["reveal", "dog.png", "--size", "16", "--every", "8", "--scale", "2"]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let gif = image::open(temp.path().join("dog_reveal.gif")).unwrap();
    assert_eq!((gif.width(), gif.height()), (32, 32));
}

#[test]
fn test_reveal_missing_image() {
    let temp = TempDir::new().unwrap();
    let output = rvl(temp.path(), &["reveal", "missing.png"]);
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_simulate_json_reference_layout() {
    let temp = TempDir::new().unwrap();
    let output = rvl(
        temp.path(),
        &["simulate", "--json", "--seed", "4", "--width", "1000", "--duration-ms", "2000", "--collection", "pixel_dogs"],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let report = stdout_json(&output);
    assert_eq!(report["elapsed_ms"], 2000);
    assert_eq!(report["rotations"], 2);
    let grid = &report["grids"][0];
    assert_eq!(grid["id"], "pixel_dogs");
    assert_eq!(grid["columns"], 7);
    assert_eq!(grid["visible"], 7);
    assert_eq!(grid["more_count"], 93);
    assert_eq!(grid["lit"].as_array().unwrap().len(), 3);
}

#[test]
fn test_simulate_records_gif() {
    let temp = TempDir::new().unwrap();
    let out = temp.path().join("grid.gif");
    let output = rvl(
        temp.path(),
        &[
            "simulate",
            "--seed",
            "1",
            "--width",
            "300",
            "--duration-ms",
            "200",
            "--frame-ms",
            "100",
            "--gif",
            out.to_str().unwrap(),
        ],
    );
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    // (300 - 20 + 4) / 132 = 2 columns of 128px tiles with a 4px gap
    let gif = image::open(&out).unwrap();
    assert_eq!((gif.width(), gif.height()), (260, 128));
}

#[test]
fn test_simulate_unknown_collection_is_invalid_args() {
    let temp = TempDir::new().unwrap();
    let output = rvl(temp.path(), &["simulate", "--collection", "nope"]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown collection 'nope'"));
}

#[test]
fn test_bad_flag_is_invalid_args() {
    let temp = TempDir::new().unwrap();
    let output = rvl(temp.path(), &["simulate", "--width", "wide"]);
    assert_eq!(output.status.code(), Some(2));
}
