#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::fs;
use std::process::Command;

use common::fixtures::{create_targets, schema_dir};
use tcv3::generator::{output_path, GenKind};
use tcv3::schema::ObjectType;

fn tcv3_gen() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_tcv3-gen"));
    cmd.env("TCV3_LOG_LEVEL", "error");
    cmd.arg("--schemas").arg(schema_dir());
    cmd
}

#[test]
fn test_model_command_writes_existing_target() {
    let root = tempfile::tempdir().unwrap();
    let targets = create_targets(root.path(), ObjectType::Indicators, &[GenKind::Model]);

    let output = tcv3_gen()
        .arg("--root")
        .arg(root.path())
        .args(["model", "--type", "indicators"])
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let model = fs::read_to_string(&targets[0]).unwrap();
    assert!(model.contains("pub struct IndicatorModel"));
}

#[test]
fn test_missing_target_exits_non_zero() {
    let root = tempfile::tempdir().unwrap();

    let output = tcv3_gen()
        .arg("--root")
        .arg(root.path())
        .args(["model", "--type", "indicators"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("error:"));
    assert!(!output_path(root.path(), ObjectType::Indicators, GenKind::Model).exists());
}

#[test]
fn test_args_command_prints_block() {
    let output = tcv3_gen()
        .args(["args", "--type", "tags", "--indent_blocks", "0"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("Args:\n"));
    assert!(stdout.contains("    name (str, kwargs): The **name** for the Tag."));
}

#[test]
fn test_args_command_includes_relations_and_fixed_fields() {
    let output = tcv3_gen()
        .args(["args", "--type", "indicators", "--indent_blocks", "0"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("    tags (Tags, kwargs): A list of Tags corresponding to the item"));
    assert!(stdout.contains("    associated_indicators (Indicators, kwargs):"));
    assert!(stdout.contains("    summary (str, kwargs): The indicator summary."));
    assert!(!stdout.contains("date_added"));
}

#[test]
fn test_all_reports_failures() {
    let root = tempfile::tempdir().unwrap();
    create_targets(root.path(), ObjectType::Tags, &[GenKind::Filter]);

    let output = tcv3_gen()
        .arg("--root")
        .arg(root.path())
        .args(["all", "--gen_type", "filter"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("failed to generate"));
    assert!(stderr.contains("indicators"));
    let tag_filter = output_path(root.path(), ObjectType::Tags, GenKind::Filter);
    assert!(fs::read_to_string(tag_filter)
        .unwrap()
        .contains("pub struct TagFilter"));
}

#[test]
fn test_unknown_type_is_a_usage_error() {
    let output = tcv3_gen()
        .args(["filter", "--type", "widgets"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}
