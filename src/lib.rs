//! caption-polish - Subtitle and Transcript Normalization
//!
//! Detects whether a file is SRT or plain text and runs every cue or line
//! through terminology substitution, spelling correction and Han-script
//! conversion, keeping cue numbering and timing intact.

pub mod cli;
pub mod config;
pub mod convert;
pub mod correct;
pub mod detect;
pub mod error;
pub mod pipeline;
pub mod processor;
pub mod subtitle;
pub mod terms;
pub mod workflow;
