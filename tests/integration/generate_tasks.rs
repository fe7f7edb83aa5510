//! Task planning and execution through `generate`

use super::test_utils::{counting_task, empty, with_tasks};
use genkit::events::GeneratorEvent;
use genkit::{EventKind, GenerateError, Generator, GeneratorSource, Task, TaskSpec};
use serde_json::{json, Map, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

fn foo_with_counter() -> (Arc<Generator>, Arc<AtomicUsize>, Arc<Mutex<Vec<String>>>) {
    let app = Generator::new("app");
    let counter = Arc::new(AtomicUsize::new(0));
    let log = Arc::new(Mutex::new(Vec::new()));
    let (c, l) = (Arc::clone(&counter), Arc::clone(&log));
    app.register(
        "foo",
        GeneratorSource::function(move |foo, _, _| {
            for name in ["default", "a", "b", "c"] {
                foo.task(counting_task(name, &c, &l));
            }
            Ok(())
        }),
    );
    (app, counter, log)
}

#[test]
fn task_list_forms_plan_identically() {
    let (app, _, _) = foo_with_counter();
    let listed = app.plan(("foo", ["a", "b", "c"])).unwrap();
    let joined = app.plan("foo:a,b,c").unwrap();
    let expected = Some(vec!["a".to_string(), "b".to_string(), "c".to_string()]);
    assert_eq!(listed.tasks, expected);
    assert_eq!(joined.tasks, expected);
    assert!(Arc::ptr_eq(
        listed.generator.as_ref().unwrap(),
        joined.generator.as_ref().unwrap()
    ));

    app.register(
        "outer",
        GeneratorSource::function(|outer, _, _| {
            outer.register("bar", with_tasks(&["a", "b"]));
            Ok(())
        }),
    );
    let dotted = app.plan((["outer", "bar"], ["a", "b"])).unwrap();
    assert_eq!(dotted.generator.unwrap().namespace(), "outer.bar");
    assert_eq!(dotted.tasks, Some(vec!["a".to_string(), "b".to_string()]));
}

#[tokio::test]
async fn named_tasks_run_in_order() {
    let (app, counter, log) = foo_with_counter();
    app.generate(("foo", "a,b,c")).await.unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 3);
    assert_eq!(*log.lock().unwrap(), vec!["a", "b", "c"]);
}

#[tokio::test]
async fn bare_generator_runs_its_default_task() {
    let (app, counter, log) = foo_with_counter();
    app.generate("foo").await.unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
    assert_eq!(*log.lock().unwrap(), vec!["default"]);
}

#[tokio::test]
async fn unknown_name_reports_not_found() {
    let app = Generator::new("app");
    let err = app.generate("unknown-name").await.unwrap_err();
    assert!(matches!(err, GenerateError::GeneratorNotFound { .. }));
    assert!(err.to_string().contains("unknown-name"));
}

#[tokio::test]
async fn missing_task_reports_task_not_found() {
    let (app, counter, _) = foo_with_counter();
    let err = app.generate("foo:a,nope").await.unwrap_err();
    match err {
        GenerateError::TaskNotFound { generator, task } => {
            assert_eq!(generator, "foo");
            assert_eq!(task, "nope");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    app.register("bare", empty());
    let err = app.generate("bare").await.unwrap_err();
    assert!(matches!(err, GenerateError::TaskNotFound { .. }));
}

#[tokio::test]
async fn default_with_nothing_registered_is_a_noop() {
    let app = Generator::new("app");
    app.generate("default").await.unwrap();
    app.generate(TaskSpec::default()).await.unwrap();
}

#[tokio::test]
async fn dotted_request_runs_nested_tasks() {
    let app = Generator::new("app");
    let counter = Arc::new(AtomicUsize::new(0));
    let log = Arc::new(Mutex::new(Vec::new()));
    let (c, l) = (Arc::clone(&counter), Arc::clone(&log));
    app.register(
        "a",
        GeneratorSource::function(move |a, _, _| {
            let (c, l) = (Arc::clone(&c), Arc::clone(&l));
            a.register(
                "b",
                GeneratorSource::function(move |b, _, _| {
                    b.task(counting_task("build", &c, &l));
                    Ok(())
                }),
            );
            Ok(())
        }),
    );
    app.generate("a.b:build").await.unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn generate_each_runs_sequentially() {
    let (app, counter, log) = foo_with_counter();
    app.generate_each(["foo:c", "foo:a", "foo:b"], &Map::new())
        .await
        .unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 3);
    assert_eq!(*log.lock().unwrap(), vec!["c", "a", "b"]);

    let err = app
        .generate_each(["foo:a", "missing", "foo:b"], &Map::new())
        .await
        .unwrap_err();
    assert!(err.to_string().contains("missing"));
    assert_eq!(counter.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn generate_event_names_alias_and_tasks() {
    let (app, _, _) = foo_with_counter();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let events = Arc::clone(&seen);
    app.on(EventKind::Generate, move |event| {
        if let GeneratorEvent::Generate { alias, tasks, .. } = event {
            events.lock().unwrap().push((alias.clone(), tasks.clone()));
        }
    });
    app.generate("foo:a,b").await.unwrap();
    assert_eq!(
        *seen.lock().unwrap(),
        vec![("foo".to_string(), vec!["a".to_string(), "b".to_string()])]
    );
}

#[tokio::test]
async fn call_options_and_default_generator_compose() {
    let app = Generator::new("app");
    app.register(
        "default",
        GeneratorSource::function(|default, _, _| {
            default.data().set("owner", json!("platform-team"));
            Ok(())
        }),
    );
    let seen: Arc<Mutex<Option<(Option<Value>, Option<Value>)>>> = Arc::new(Mutex::new(None));
    let captured = Arc::clone(&seen);
    app.register(
        "docs",
        GeneratorSource::function(move |docs, _, _| {
            let captured = Arc::clone(&captured);
            docs.task_fn("default", move |ctx| {
                let captured = Arc::clone(&captured);
                async move {
                    let generator = &ctx.generator;
                    *captured.lock().unwrap() =
                        Some((generator.options().get("dest"), generator.data().get("owner")));
                    Ok(())
                }
            });
            Ok(())
        }),
    );

    let mut options = Map::new();
    options.insert("dest".to_string(), json!("site/"));
    app.generate_with("docs", &options).await.unwrap();
    let (dest, owner) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(dest, Some(json!("site/")));
    assert_eq!(owner, Some(json!("platform-team")));
}

#[tokio::test]
async fn bare_task_on_the_caller_takes_precedence() {
    let app = Generator::new("app");
    let counter = Arc::new(AtomicUsize::new(0));
    let log = Arc::new(Mutex::new(Vec::new()));
    app.task(counting_task("lint", &counter, &log));
    app.register("lint", with_tasks(&["default"]));
    app.generate("lint").await.unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["lint"]);

    app.task(Task::noop("fmt"));
    app.generate("lint,fmt").await.unwrap();
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn task_only_request_never_falls_back_to_a_generator() {
    let app = Generator::new("app");
    let counter = Arc::new(AtomicUsize::new(0));
    let log = Arc::new(Mutex::new(Vec::new()));
    let (c, l) = (Arc::clone(&counter), Arc::clone(&log));
    app.register(
        "build",
        GeneratorSource::function(move |build, _, _| {
            build.task(counting_task("default", &c, &l));
            Ok(())
        }),
    );

    let err = app
        .generate(TaskSpec::default().with_tasks(["build"]))
        .await
        .unwrap_err();
    match err {
        GenerateError::TaskNotFound { generator, task } => {
            assert_eq!(generator, "app");
            assert_eq!(task, "build");
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(counter.load(Ordering::SeqCst), 0);

    app.task(counting_task("build", &counter, &log));
    app.generate(TaskSpec::default().with_tasks(["build"]))
        .await
        .unwrap();
    assert_eq!(*log.lock().unwrap(), vec!["build"]);
}
