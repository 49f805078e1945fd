//! Data types for the web intelligence pipeline.

pub mod config;
pub mod record;
pub mod url;
