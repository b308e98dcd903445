//! Text-generation providers for Veridian.
//!
//! All providers implement the `veridian_core::GenerationService` trait.
//! `GenerationInvoker` wraps the configured provider and owns the failure
//! taxonomy; `router::build_from_config` picks the provider at startup.

pub mod gemini;
mod http;
pub mod invoker;
pub mod openai_compat;
pub mod router;

pub use gemini::GeminiProvider;
pub use invoker::GenerationInvoker;
pub use openai_compat::OpenAiCompatProvider;
pub use router::build_from_config;
