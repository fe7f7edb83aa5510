//! Failures surface through the returned Result and bubble as `error` events

use super::test_utils::error_counter;
use genkit::events::GeneratorEvent;
use genkit::{EventKind, GenerateError, Generator, GeneratorSource, Task, TaskError};
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

/// root > a > b > c > d, where d's default task fails
fn failing_tree() -> Arc<Generator> {
    let app = Generator::new("app");
    app.register(
        "a",
        GeneratorSource::function(|a, _, _| {
            a.register(
                "b",
                GeneratorSource::function(|b, _, _| {
                    b.register(
                        "c",
                        GeneratorSource::function(|c, _, _| {
                            c.register(
                                "d",
                                GeneratorSource::function(|d, _, _| {
                                    d.task(Task::new("default", |_| async {
                                        Err::<(), _>(anyhow::anyhow!("disk full"))
                                    }));
                                    Ok(())
                                }),
                            );
                            Ok(())
                        }),
                    );
                    Ok(())
                }),
            );
            Ok(())
        }),
    );
    app
}

#[tokio::test]
async fn error_fires_once_on_every_ancestor() {
    let app = failing_tree();
    let d = app.get_generator("a.b.c.d").unwrap().unwrap();
    let chain = [
        Arc::clone(&app),
        app.get_generator("a").unwrap().unwrap(),
        app.get_generator("a.b").unwrap().unwrap(),
        app.get_generator("a.b.c").unwrap().unwrap(),
        Arc::clone(&d),
    ];
    let counters: Vec<_> = chain.iter().map(error_counter).collect();

    let err = d.generate("default").await.unwrap_err();
    assert!(matches!(err, GenerateError::TaskExecutionFailed { .. }));
    assert!(err.to_string().contains("disk full"));

    let total: usize = counters.iter().map(|c| c.load(Ordering::SeqCst)).sum();
    assert_eq!(total, 5);
    for counter in &counters {
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}

#[tokio::test]
async fn every_level_sees_the_same_error_object() {
    let app = failing_tree();
    let seen: Arc<Mutex<Vec<Arc<GenerateError>>>> = Arc::new(Mutex::new(Vec::new()));
    for name in ["a", "a.b", "a.b.c", "a.b.c.d"] {
        let generator = app.get_generator(name).unwrap().unwrap();
        let sink = Arc::clone(&seen);
        generator.on(EventKind::Error, move |event| {
            if let GeneratorEvent::Error(err) = event {
                sink.lock().unwrap().push(Arc::clone(err));
            }
        });
    }
    let sink = Arc::clone(&seen);
    app.on(EventKind::Error, move |event| {
        if let GeneratorEvent::Error(err) = event {
            sink.lock().unwrap().push(Arc::clone(err));
        }
    });

    let err = app.generate("a.b.c.d").await.unwrap_err();
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 5);
    assert!(seen.iter().all(|e| Arc::ptr_eq(e, &seen[0])));
    assert_eq!(seen[0].to_string(), err.to_string());
    match &*seen[0] {
        GenerateError::TaskExecutionFailed {
            generator,
            tasks,
            source,
        } => {
            assert_eq!(generator, "a.b.c.d");
            assert_eq!(tasks, &vec!["default".to_string()]);
            assert!(matches!(source, TaskError::Failed { task, .. } if task == "default"));
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[tokio::test]
async fn lookup_failures_do_not_bubble() {
    let app = failing_tree();
    let errors = error_counter(&app);
    assert!(app.generate("a.b.missing").await.is_err());
    assert!(app.generate("a.b.c.d:nope").await.is_err());
    assert_eq!(errors.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn failing_defining_function_is_returned() {
    let app = Generator::new("app");
    app.register(
        "broken",
        GeneratorSource::function(|_, _, _| anyhow::bail!("template missing")),
    );
    let err = app.generate("broken").await.unwrap_err();
    assert!(matches!(err, GenerateError::InvocationFailed { .. }));
    assert!(err.to_string().contains("template missing"));
}

#[tokio::test]
async fn later_tasks_do_not_run_after_a_failure() {
    let app = Generator::new("app");
    let ran = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&ran);
    app.register(
        "job",
        GeneratorSource::function(move |job, _, _| {
            job.task(Task::new("first", |_| async {
                Err::<(), _>(anyhow::anyhow!("stop"))
            }));
            let log = Arc::clone(&log);
            job.task_fn("second", move |_| {
                let log = Arc::clone(&log);
                async move {
                    log.lock().unwrap().push("second");
                    Ok(())
                }
            });
            Ok(())
        }),
    );
    let err = app.generate("job:first,second").await.unwrap_err();
    assert!(err.to_string().contains("stop"));
    assert!(ran.lock().unwrap().is_empty());
}
