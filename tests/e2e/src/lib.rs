//! Studyplan end-to-end test support
//!
//! - [`harness`]: isolated on-disk planners
//! - [`mocks`]: study items, commitments and performance fixtures

pub mod harness;
pub mod mocks;

pub use harness::TestDatabaseManager;
pub use mocks::{PerformanceProfile, TestDataFactory};
