//! Shared utilities

pub mod span;
