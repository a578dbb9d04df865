//! # Hindsight Context
//!
//! Turns workspace notes and parsed sessions into one bounded payload:
//! either a single string or an ordered list of chunks, under a hard
//! character budget with deterministic truncation.

pub mod assembler;
pub mod workspace;

pub use assembler::{
    AssembledContext, AssemblyStats, ContextAssembler, SessionPart, TRUNCATION_MARKER,
};
pub use workspace::load_workspace;
