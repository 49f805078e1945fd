//! Pipeline orchestration.
//!
//! - `Pipeline` - validates, checks the cache, and runs the stages on a miss
//! - `SingleFlight` - keyed registry that collapses concurrent identical work

pub mod orchestrator;
pub mod singleflight;

pub use orchestrator::Pipeline;
pub use singleflight::SingleFlight;
