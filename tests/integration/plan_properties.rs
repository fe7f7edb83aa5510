//! Property-based tests: every request form for the same target plans identically

use genkit::{Generator, GeneratorSource, Task, TaskSpec};
use proptest::prelude::*;
use std::sync::Arc;

fn generator_with(name: &str, tasks: Vec<String>) -> Arc<Generator> {
    let app = Generator::new("app");
    app.register(
        name,
        GeneratorSource::function(move |generator, _, _| {
            for task in &tasks {
                generator.task(Task::noop(task.clone()));
            }
            Ok(())
        }),
    );
    app
}

#[test]
fn test_request_forms_plan_identically() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                "[a-z]{1,8}",
                proptest::collection::vec("[a-z]{1,5}", 1..4),
            ),
            |(name, tasks)| {
                let app = generator_with(&name, tasks.clone());
                let joined = tasks.join(",");

                let from_list = app.plan(TaskSpec::new(name.as_str()).with_tasks(&tasks)).unwrap();
                let from_string = app.plan(format!("{}:{}", name, joined)).unwrap();
                let from_full_name = app.plan(format!("generate-{}:{}", name, joined)).unwrap();

                let expected = from_list.generator.clone().unwrap();
                for plan in [&from_string, &from_full_name] {
                    prop_assert!(Arc::ptr_eq(plan.generator.as_ref().unwrap(), &expected));
                    prop_assert_eq!(plan.tasks.as_ref(), from_list.tasks.as_ref());
                }
                prop_assert_eq!(from_list.tasks, Some(tasks));
                Ok(())
            },
        )
        .unwrap();
}

#[test]
fn test_canonical_form_round_trips_through_planning() {
    let mut runner = proptest::test_runner::TestRunner::default();

    runner
        .run(
            &(
                proptest::collection::vec("[a-z]{1,6}", 1..4),
                proptest::collection::vec("[a-z]{1,5}", 0..3),
            ),
            |(names, tasks)| {
                let spec = TaskSpec::default().with_names(names.clone()).with_tasks(&tasks);
                let reparsed = TaskSpec::new(spec.canonical());
                prop_assert_eq!(reparsed.canonical(), spec.canonical());
                prop_assert_eq!(spec.target(), names.join("."));
                Ok(())
            },
        )
        .unwrap();
}
