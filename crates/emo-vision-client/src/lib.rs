//! Vision model client for interpreting selected moments.
//!
//! This crate provides:
//! - The `InterpretationClient` trait the worker calls per moment
//! - A Gemini implementation with model fallback
//! - Prompt construction and lenient parsing of the model's JSON answer

pub mod client;
pub mod config;
pub mod error;
pub mod gemini;
pub mod prompt;

pub use client::InterpretationClient;
pub use config::VisionClientConfig;
pub use error::{ClientError, ClientResult};
pub use gemini::GeminiVisionClient;
pub use prompt::{build_prompt, moment_context};
