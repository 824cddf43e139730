//! Integration test utilities for the BBS host
//!
//! This crate provides helpers for running end-to-end tests against
//! the stateless REST surface and the shared service layer.

pub mod fixtures;
pub mod helpers;

pub use fixtures::*;
pub use helpers::*;
