// File: shopcast-core/tests/test_utils/mod.rs

pub mod flaky;
pub mod helpers;
