//! Data models: configuration and the structured report record.

pub mod config;
pub mod report;
