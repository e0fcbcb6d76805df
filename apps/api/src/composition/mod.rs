//! Reply composition: prompt construction, completion, quality gate, formatting.

pub mod catalog;
pub mod envelope;
pub mod facts;
pub mod formatter;
pub mod handlers;
pub mod mirroring;
pub mod parser;
pub mod pipeline;
pub mod prompts;
pub mod quality_gate;
pub mod signature;
