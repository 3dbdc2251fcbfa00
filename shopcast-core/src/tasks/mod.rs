// src/tasks/mod.rs

pub mod registry;
pub mod sweepers;

pub use registry::SweeperRegistry;
pub use sweepers::{spawn_all_sweepers, spawn_sweeper_task};
