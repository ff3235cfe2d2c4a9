// tests/config_errors.rs

use std::io::Write;

use magicbuild::config::{ensure_meta_task_is_free, load_and_validate, validate_config};
use magicbuild::errors::MagicError;
use magicbuild::types::BuildMode;
use magicbuild_test_utils::builders::{ConfigFileBuilder, TaskConfigBuilder};
use tempfile::NamedTempFile;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn expect_config_error(contents: &str) -> String {
    let file = write_config(contents);
    match load_and_validate(file.path()) {
        Err(MagicError::ConfigError(msg)) => msg,
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn full_config_loads() {
    let file = write_config(
        r#"
[config]
meta_task = "all"
use_cache = false

[node."gen"]
cmd = "touch $MAGIC_TARGET"

[task.levels]
mode = "pre"
prepare = "mkdir -p gen"
scan = ["gen", "gen/**"]
build_cmd = "echo $MAGIC_TARGET"
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();

    assert_eq!(cfg.config.meta_task.as_deref(), Some("all"));
    assert!(!cfg.config.use_cache);
    assert_eq!(cfg.node["gen"].cmd, "touch $MAGIC_TARGET");

    let task = cfg.get_task("levels").unwrap();
    assert_eq!(task.mode, BuildMode::Pre);
    assert_eq!(task.prepare.as_deref(), Some("mkdir -p gen"));
    assert_eq!(task.scan, vec!["gen", "gen/**"]);
    assert_eq!(cfg.task_names().collect::<Vec<_>>(), vec!["levels"]);
}

#[test]
fn defaults_apply() {
    let file = write_config(
        r#"
[task.levels]
scan = ["gen/**"]
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert!(cfg.config.use_cache);
    assert!(cfg.config.meta_task.is_none());
    assert_eq!(cfg.task["levels"].mode, BuildMode::Full);
    assert!(cfg.node.is_empty());
}

#[test]
fn missing_tasks_is_config_error() {
    let msg = expect_config_error("[config]\nuse_cache = true\n");
    assert!(msg.contains("at least one"));
}

#[test]
fn task_without_discovery_source_is_config_error() {
    let msg = expect_config_error(
        r#"
[task.empty]
build_cmd = "true"
"#,
    );
    assert!(msg.contains("empty"));
    assert!(msg.contains("scan"));
}

#[test]
fn invalid_glob_is_config_error() {
    let msg = expect_config_error(
        r#"
[task.bad]
scan = ["gen/[oops"]
"#,
    );
    assert!(msg.contains("bad"));
    assert!(msg.contains("scan"));
}

#[test]
fn task_named_like_meta_task_is_config_error() {
    let msg = expect_config_error(
        r#"
[config]
meta_task = "all"

[task.all]
scan = ["**"]
"#,
    );
    assert!(msg.contains("meta task"));
}

#[test]
fn hidden_node_rule_is_config_error() {
    let msg = expect_config_error(
        r#"
[node.".cache"]
cmd = "true"

[task.levels]
scan = ["gen/**"]
"#,
    );
    assert!(msg.contains("hidden"));
}

#[test]
fn unknown_mode_is_toml_error() {
    let file = write_config(
        r#"
[task.levels]
mode = "sometimes"
scan = ["gen/**"]
"#,
    );

    match load_and_validate(file.path()) {
        Err(MagicError::TomlError(_)) => {}
        other => panic!("Expected TomlError, got: {:?}", other),
    }
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = load_and_validate(dir.path().join("Magicbuild.toml"));
    assert!(matches!(result, Err(MagicError::IoError(_))));
}

#[test]
fn builder_configs_validate() {
    let cfg = ConfigFileBuilder::new()
        .with_node("gen", "touch $MAGIC_TARGET")
        .with_task(
            "levels",
            TaskConfigBuilder::new()
                .mode(BuildMode::Pre)
                .scan("gen/**")
                .build(),
        )
        .build();

    assert!(validate_config(&cfg).is_ok());
}

#[test]
fn builder_rejects_empty_node_path() {
    let raw = ConfigFileBuilder::new()
        .with_node("/", "true")
        .with_task("levels", TaskConfigBuilder::new().prepare("true").build())
        .raw();

    match magicbuild::config::ConfigFile::try_from(raw) {
        Err(MagicError::ConfigError(msg)) => assert!(msg.contains("does not name a path")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn meta_task_name_must_not_shadow_a_task() {
    let cfg = ConfigFileBuilder::new()
        .meta_task("all")
        .with_task("levels", TaskConfigBuilder::new().scan("gen/**").build())
        .build();

    assert!(ensure_meta_task_is_free(cfg.task.keys(), "all").is_ok());
    match ensure_meta_task_is_free(cfg.task.keys(), "levels") {
        Err(MagicError::ConfigError(msg)) => assert!(msg.contains("levels")),
        other => panic!("Expected ConfigError, got: {:?}", other),
    }
}

#[test]
fn blank_configured_meta_task_is_config_error() {
    let msg = expect_config_error(
        r#"
[config]
meta_task = " "

[task.levels]
scan = ["gen/**"]
"#,
    );
    assert!(msg.contains("must not be empty"));
}
