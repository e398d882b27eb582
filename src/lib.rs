//! Recaer - Runtime performance regression detector
//!
//! This library compares timing measurements from a benchmark run against a
//! stored baseline, re-measures flagged benchmarks to rule out one-off
//! noise, and reports whatever survives as a confirmed regression.

pub mod artifact;
pub mod cli;
pub mod detector;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod minimum;
pub mod notify;
pub mod report;
pub mod results;
pub mod runner;
pub mod summary;
