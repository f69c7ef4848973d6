//! End-to-end integration tests

mod adaptive_test;
mod lifecycle_test;
