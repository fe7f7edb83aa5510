//! Integration tests for Configuration System

use super::test_utils::{with_xdg_env, write_file};
use genkit::config::{ConfigLoader, GenkitConfig};
use genkit::GeneratorSource;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[test]
fn test_global_config_is_read_from_xdg_dir() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();

    let config = with_xdg_env(&test_dir, || {
        write_file(
            test_dir.path(),
            "config/genkit/config.toml",
            r#"
prefix = "make"
search_paths = ["/opt/generators"]

[logging]
level = "debug"
"#,
        );
        assert_eq!(
            ConfigLoader::xdg_config_path(),
            Some(test_dir.path().join("config/genkit/config.toml"))
        );
        ConfigLoader::load(workspace.path()).unwrap()
    });

    assert_eq!(config.prefix, "make");
    assert_eq!(config.search_paths, vec![PathBuf::from("/opt/generators")]);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.output, "stderr");
}

#[test]
fn test_workspace_overrides_global() {
    let global_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    let global = global_dir.path().join("config.toml");
    std::fs::write(
        &global,
        r#"
prefix = "make"

[options]
author = "global"
license = "MIT"
"#,
    )
    .unwrap();
    write_file(
        workspace.path(),
        "genkit.toml",
        r#"
[options]
author = "workspace"
"#,
    );

    let config = ConfigLoader::load_with_global(workspace.path(), Some(&global)).unwrap();
    assert_eq!(config.prefix, "make");
    assert_eq!(config.options.get("author"), Some(&json!("workspace")));
    assert_eq!(config.options.get("license"), Some(&json!("MIT")));
}

#[test]
fn test_env_specific_file_is_layered_last() {
    let test_dir = TempDir::new().unwrap();
    let workspace = TempDir::new().unwrap();
    write_file(workspace.path(), "genkit.toml", "prefix = \"make\"\n");
    write_file(workspace.path(), "config/ci.toml", "prefix = \"build\"\n");

    let config = with_xdg_env(&test_dir, || {
        std::env::set_var("GENKIT_ENV", "ci");
        let loaded = ConfigLoader::load(workspace.path());
        std::env::remove_var("GENKIT_ENV");
        loaded.unwrap()
    });
    assert_eq!(config.prefix, "build");
}

#[test]
fn test_invalid_workspace_config_is_reported() {
    let workspace = TempDir::new().unwrap();
    write_file(
        workspace.path(),
        "genkit.toml",
        r#"
prefix = "a.b"

[generators]
docs = ""
"#,
    );
    let config = ConfigLoader::load_with_global(workspace.path(), None).unwrap();
    let errors = config.validate().unwrap_err();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].to_string().starts_with("Prefix: "));
}

#[tokio::test]
async fn test_root_generator_runs_configured_generators() {
    let workspace = TempDir::new().unwrap();
    write_file(
        workspace.path(),
        "genkit.toml",
        r#"
[generators]
docs = "gens/docs"

[options]
dest = "site"

[config]
theme = "dark"
"#,
    );
    write_file(
        workspace.path(),
        "gens/docs/generator.toml",
        r#"
[tasks.default]
run = ["mkdir -p site", "touch site/index.html"]
"#,
    );

    let config = ConfigLoader::load_with_global(workspace.path(), None).unwrap();
    assert!(config.validate().is_ok());
    let root = config.root_generator("genkit", workspace.path());

    root.generate("docs").await.unwrap();
    assert!(workspace.path().join("site/index.html").exists());
    let docs = root.get_generator("docs").unwrap().unwrap();
    assert_eq!(docs.options().get("dest"), Some(json!("site")));

    let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
    let captured = Arc::clone(&seen);
    root.register(
        "themed",
        GeneratorSource::function(move |themed, _, _| {
            let captured = Arc::clone(&captured);
            themed.on_config(move |_, config| {
                let captured = Arc::clone(&captured);
                async move {
                    *captured.lock().unwrap() = Some(config);
                    Ok(())
                }
            });
            themed.task(genkit::Task::noop("default"));
            Ok(())
        }),
    );
    root.generate("themed").await.unwrap();
    let config = seen.lock().unwrap().clone().unwrap();
    assert_eq!(config["theme"], json!("dark"));
}

#[test]
fn test_defaults_without_any_file() {
    let workspace = TempDir::new().unwrap();
    let config = ConfigLoader::load_with_global(workspace.path(), None).unwrap();
    assert_eq!(config, GenkitConfig::default());
}
