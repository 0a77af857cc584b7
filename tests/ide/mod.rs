//! Query façade tests through a running engine
//!
//! Tests for:
//! - Code completion
//! - Signature help
//! - Import suggestions

pub mod tests_completion;
pub mod tests_imports;
pub mod tests_signatures;
