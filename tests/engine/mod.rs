//! Engine pipeline tests
//!
//! Tests for:
//! - Buffer monitoring and edits
//! - Directory discovery and file events
//! - Cross-module re-analysis
//! - Progress waiting and parse accounting

pub mod tests_buffers;
pub mod tests_directories;
pub mod tests_progress;
