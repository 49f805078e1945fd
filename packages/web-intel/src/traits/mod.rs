//! Core trait abstractions for the pipeline.
//!
//! These traits define the seams where applications plug in their own
//! network client, model provider, and persistence engine.

pub mod fetcher;
pub mod model;
pub mod store;
