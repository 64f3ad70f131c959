//! Chat runtime - completion transport and conversation orchestration
//!
//! This crate turns one staff question into one completion call:
//!
//! 1. **Assembly** (`assembler`) - trim history, embed the filtered inventory
//!    context, map roles to the completion API's vocabulary
//! 2. **Transport** (`llm`) - `CompletionClient` trait plus the Gemini
//!    `generateContent` implementation
//! 3. **Orchestration** (`runtime`) - submission gating, snapshot handling,
//!    degradation to fixed fallback messages
//!
//! # Safety Principle
//!
//! The model only ever sees the bounded context payload built by
//! `cellarhand-core`; it never queries the sheet itself, and its failures
//! never escape as errors - staff see a fixed apology and the log keeps
//! accepting submissions.

pub mod assembler;
pub mod llm;
pub mod runtime;

pub use assembler::build_request;
pub use llm::{CompletionClient, CompletionError, CompletionRequest, GeminiClient};
pub use runtime::{ChatRuntime, SubmitOutcome, SubmitRejection};
