//! Shared helpers for integration tests.

pub mod project_fixtures;
