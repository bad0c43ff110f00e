//! Property-based tests for prompt composition

mod composition;
