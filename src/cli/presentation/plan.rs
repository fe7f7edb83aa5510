//! `genkit plan` presentation.

use crate::planner::{Plan, TaskSpec};

pub fn format_plan_text(spec: &TaskSpec, plan: &Plan) -> String {
    match (&plan.generator, &plan.tasks) {
        (Some(generator), Some(tasks)) => format!(
            "{} -> {} [{}]",
            spec,
            generator.namespace(),
            tasks.join(", ")
        ),
        (Some(generator), None) => format!(
            "{} -> {} (no \"default\" task; nothing would run)",
            spec,
            generator.namespace()
        ),
        (None, _) if !spec.is_explicit() => format!("{} -> nothing registered to run", spec),
        (None, _) => format!("{} -> no generator or task found", spec),
    }
}
