//! Integration test suite for scriptplan
//!
//! End-to-end tests of resolution through the public API and of the
//! `scriptplan` binary.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **scenarios**: Resolution of typical site layouts through the library
//! - **cli**: The `plan`, `render` and `validate` commands

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cli;
mod scenarios;
