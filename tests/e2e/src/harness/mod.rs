//! Test harness
//!
//! Database lifecycle for journey tests.

mod db_manager;

pub use db_manager::{TEST_USER, TestDatabaseManager};
