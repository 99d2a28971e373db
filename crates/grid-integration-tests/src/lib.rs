//! Integration test crate for the GRID marketplace settlement core.
//!
//! This crate exists solely to run integration tests that span the token and
//! market crates. It has no public API - all functionality is in the test
//! modules.

#![forbid(unsafe_code)]
