// src/task/mod.rs

//! Task definitions: descriptors and the validated registry.

pub mod descriptor;
pub mod registry;

pub use descriptor::{CommandSpec, TaskDescriptor, DEFAULT_DELAY};
pub use registry::{TaskId, TaskRegistry};
