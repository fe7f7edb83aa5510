//! Generators loaded from `generator.toml` manifests on disk

use super::test_utils::write_file;
use genkit::resolver::FsResolver;
use genkit::{GenerateError, Generator, GeneratorSource, Runtime, SourceKind};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn app_in(root: &Path, resolver: FsResolver) -> Arc<Generator> {
    let runtime = Runtime::new(root).with_resolver(Arc::new(resolver));
    Generator::with_runtime("app", Arc::new(runtime))
}

#[tokio::test]
async fn prefixed_directory_resolves_by_alias() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "generate-readme/generator.toml",
        r#"
        [tasks.default]
        run = ["echo hello > README.md"]
        "#,
    );
    let app = app_in(dir.path(), FsResolver::default());

    app.generate("readme").await.unwrap();
    let written = fs::read_to_string(dir.path().join("README.md")).unwrap();
    assert_eq!(written.trim(), "hello");

    let readme = app.get_generator("generate-readme").unwrap().unwrap();
    assert_eq!(readme.source_kind(), SourceKind::Filepath);
    assert!(Arc::ptr_eq(&readme, &app.get_generator("readme").unwrap().unwrap()));
}

#[tokio::test]
async fn nested_path_and_inline_generators() {
    let dir = TempDir::new().unwrap();
    write_file(
        dir.path(),
        "lib/generator.toml",
        r#"
        description = "library scaffold"

        [options]
        license = "MIT"

        [tasks.default]
        run = ["touch lib.txt"]

        [generators.ci]
        path = "./ci"

        [generators.docs.tasks.build]
        run = ["echo $GENKIT_GENERATOR:$GENKIT_TASK > docs.txt"]
        "#,
    );
    write_file(
        dir.path(),
        "lib/ci/generator.toml",
        r#"
        [tasks.default]
        cwd = "."
        run = ["touch ci.txt"]
        "#,
    );
    let app = app_in(dir.path(), FsResolver::default());
    app.register("lib", GeneratorSource::Path(dir.path().join("lib")));

    app.generate("lib").await.unwrap();
    assert!(dir.path().join("lib.txt").exists());

    app.generate("lib.ci").await.unwrap();
    assert!(dir.path().join("lib/ci/ci.txt").exists());

    app.generate("lib.docs:build").await.unwrap();
    let docs = fs::read_to_string(dir.path().join("docs.txt")).unwrap();
    assert_eq!(docs.trim(), "lib.docs:build");

    let lib = app.get_generator("lib").unwrap().unwrap();
    assert_eq!(lib.options().get("license"), Some(serde_json::json!("MIT")));
    assert_eq!(lib.generators().len(), 2);
}

#[tokio::test]
async fn search_paths_are_consulted_after_the_cwd() {
    let dir = TempDir::new().unwrap();
    let shared = dir.path().join("shared");
    write_file(
        &shared,
        "fmt.toml",
        r#"
        [tasks.check]
        run = ["touch checked"]
        "#,
    );
    let app = app_in(
        dir.path(),
        FsResolver::default().with_search_paths([shared.clone()]),
    );

    app.generate("fmt:check").await.unwrap();
    assert!(dir.path().join("checked").exists());

    let err = app.generate("absent").await.unwrap_err();
    assert!(matches!(err, GenerateError::GeneratorNotFound { .. }));
    assert!(err.to_string().contains(&shared.display().to_string()));
}

#[tokio::test]
async fn broken_manifest_fails_invocation() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "bad/generator.toml", "[tasks.default]\nrun = 3\n");
    let app = app_in(dir.path(), FsResolver::default());

    let err = app.generate("bad").await.unwrap_err();
    match err {
        GenerateError::InvocationFailed { name, .. } => assert_eq!(name, "bad"),
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn discover_lists_available_generators() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "docs/generator.toml", "");
    write_file(dir.path(), "generate-lint.toml", "");
    write_file(dir.path(), "notes.toml", "");
    write_file(dir.path(), "target/stale/generator.toml", "");

    let names: Vec<String> = FsResolver::default()
        .discover(dir.path())
        .into_iter()
        .map(|entry| entry.name)
        .collect();
    assert_eq!(names, vec!["docs".to_string(), "generate-lint".to_string()]);
}
