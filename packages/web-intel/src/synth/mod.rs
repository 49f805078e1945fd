//! Metadata synthesis: prompt construction, model invocation, and strict
//! validation of the model's JSON answer.

pub mod parse;
pub mod prompts;
pub mod synthesizer;

pub use parse::{parse_metadata_response, strip_code_fence};
pub use prompts::{format_metadata_prompt, metadata_prompt_hash, METADATA_PROMPT, SYSTEM_PROMPT};
pub use synthesizer::MetadataSynthesizer;
