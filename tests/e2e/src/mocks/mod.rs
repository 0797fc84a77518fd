//! Test data
//!
//! Factories for study items, ad-hoc commitments and recorded performance.

mod fixtures;

pub use fixtures::{ItemBatch, PerformanceProfile, TestDataFactory};
