//! Admission status workflow and interviewer scheduling engine.

pub mod config;
pub mod error;
pub mod store;
pub mod telemetry;
pub mod workflows;
