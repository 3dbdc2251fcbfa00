// src/lib.rs

pub mod api;
pub mod config;
pub mod db;
pub mod eventbus;
pub mod payments;
pub mod repositories;
pub mod services;
pub mod tasks;
pub mod utils;

pub use api::{CoreApi, Repositories};
pub use config::EngineConfig;
pub use db::Database;
pub use shopcast_common::error::Error;
