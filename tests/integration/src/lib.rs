//! Integration test utilities for tether
//!
//! This crate provides helpers for running end-to-end tests of the client
//! against a real gateway, or against a server that never answers.

pub mod helpers;

pub use helpers::*;
