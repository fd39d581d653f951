//! Cotejar - offline analysis of paired hardware performance-counter runs
//!
//! This library turns raw per-event counter sample logs from co-located
//! application runs into rectangular feature matrices, assembles
//! leave-application-out training/test splits across experiment
//! configurations, reports correlation-based feature redundancy, and
//! evaluates support-vector models of runtime slowdown.

pub mod cli;
pub mod config;
pub mod correlation;
pub mod dataset;
pub mod error;
pub mod evaluate;
pub mod grouping;
pub mod matrix;
pub mod pivot;
pub mod report;
pub mod runtimes;
pub mod samples;
