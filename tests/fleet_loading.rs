// tests/fleet_loading.rs

mod common;
use crate::common::init_tracing;

use std::io::Write;

use rigdeploy::cli::CliArgs;
use rigdeploy::config::load_and_validate;
use rigdeploy::errors::RigError;
use rigdeploy::types::Operation;
use tempfile::{Builder, NamedTempFile};

fn json_file(contents: &str) -> NamedTempFile {
    let mut file = Builder::new().suffix(".json").tempfile().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn args_for(path: &std::path::Path, command: Operation) -> CliArgs {
    CliArgs {
        command,
        config: Some(path.to_string_lossy().into_owned()),
        log_level: None,
        dry_run: false,
    }
}

#[test]
fn missing_required_field_is_a_config_error() {
    let file = json_file(
        r#"{"rigs": [{"context": "a", "thread_count": "4", "label": "x", "public_id": "p"}]}"#,
    );

    match load_and_validate(file.path()) {
        Err(e @ RigError::Json(_)) => {
            assert!(e.is_config_error());
            assert!(e.to_string().contains("url"), "message: {e}");
        }
        Err(e) => panic!("Expected Json error, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn missing_rigs_key_is_a_config_error() {
    let file = json_file(r#"{"machines": []}"#);
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(err.is_config_error(), "got {err:?}");
}

#[test]
fn toml_fleet_loads() {
    let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
    write!(
        file,
        r#"
[[rigs]]
context = "attic"
thread_count = 12
label = "attic"
backend = "xmrig"
url = "stratum+tcp://pool:3333"
public_id = "wallet"
"#
    )
    .unwrap();

    let fleet = load_and_validate(file.path()).unwrap();
    assert_eq!(fleet.rigs.len(), 1);
    assert_eq!(fleet.rigs[0].thread_count, "12");
    assert_eq!(fleet.rigs[0].backend, "xmrig");
}

/// A malformed fleet aborts `run` before anything is launched: the settings
/// point at a program that would fail loudly if it were ever spawned.
#[tokio::test]
async fn malformed_fleet_launches_nothing() {
    init_tracing();

    let file = json_file(
        r#"{"settings": {"program": "rigdeploy-must-not-run"},
            "rigs": [{"context": "a", "thread_count": "4", "label": "x",
                      "url": "u", "public_id": "p"},
                     {"context": "b", "label": "missing thread_count",
                      "url": "u", "public_id": "p"}]}"#,
    );

    let err = rigdeploy::run(args_for(file.path(), Operation::Stop))
        .await
        .unwrap_err();

    assert!(err.is_config_error(), "got {err:?}");
}

#[tokio::test]
async fn duplicate_contexts_abort_the_run() {
    init_tracing();

    let rig = r#"{"context": "same", "thread_count": "1", "label": "x", "url": "u", "public_id": "p"}"#;
    let file = json_file(&format!(r#"{{"rigs": [{rig}, {rig}]}}"#));

    let err = rigdeploy::run(args_for(file.path(), Operation::Deploy))
        .await
        .unwrap_err();

    assert!(matches!(err, RigError::ConfigLoad(ref msg) if msg.contains("same")), "got {err:?}");
}

#[tokio::test]
async fn dry_run_writes_no_artifacts() {
    init_tracing();

    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("xmrig.template.json"), "{{URL}}").unwrap();

    let fleet = format!(
        r#"{{"settings": {{"build_context": {ctx:?}}},
             "rigs": [{{"context": "x", "thread_count": "2", "label": "l",
                        "backend": "xmrig", "url": "u", "public_id": "p"}}]}}"#,
        ctx = dir.path().to_string_lossy()
    );
    let file = json_file(&fleet);

    let mut args = args_for(file.path(), Operation::Deploy);
    args.dry_run = true;
    rigdeploy::run(args).await.unwrap();

    assert!(!dir.path().join("rendered").exists());
}
