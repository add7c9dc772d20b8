//! Google Gemini provider implementation.
//!
//! Talks to the native `generateContent` endpoint, where model-authored
//! turns are labelled `"model"` and the persona travels as a
//! `systemInstruction` instead of a system message.

pub mod client;
pub mod types;

pub use client::GeminiProvider;
