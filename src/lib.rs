//! genkit: nested generators and task dispatch
//!
//! Generators are registered under a raw name, stored under their alias and
//! full name, resolved by name, path or dot-path (`a.b.c`), invoked once on
//! first resolution, and asked to run tasks through `generate("name:task,task")`.

pub mod cli;
pub mod config;
pub mod error;
pub mod events;
pub mod generator;
pub mod invocation;
pub mod logging;
pub mod manifest;
pub mod naming;
pub mod planner;
pub mod resolver;
pub mod runtime;
pub mod store;
pub mod task;

pub use error::{AppError, GenerateError, TaskError};
pub use events::{EventKind, GeneratorAction, GeneratorEvent};
pub use generator::{
    Env, Generator, GeneratorSource, GetOptions, Lookup, LookupStrategy, RegisterOptions,
    SourceKind,
};
pub use planner::{Plan, TaskSpec};
pub use runtime::Runtime;
pub use task::{Task, TaskContext, TaskEngine, TaskSet};
