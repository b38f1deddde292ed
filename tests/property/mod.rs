//! Property-based tests for lifecycle guarantees
