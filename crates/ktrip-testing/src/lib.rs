//! Testing infrastructure for ktrip integration tests.
//!
//! This crate provides utilities for writing robust integration tests:
//! - `TestWorld`: Fluent interface for declarative test setup
//! - `assertions`: Checks on mirror files and JSON command output
//! - `fixtures`: Legacy CSV fragments as found in historical exports

pub mod assertions;
pub mod fixtures;
pub mod world;

pub use world::TestWorld;
