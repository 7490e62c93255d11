//! DUGOUT: MLB fantasy points service.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod calendar;
pub mod config;
pub mod dashboard;
pub mod engine;
pub mod mlb;
pub mod roster;
pub mod scoring;
pub mod storage;
pub mod types;
