//! # Veridian Core
//!
//! Domain types, traits, and error definitions for the Veridian backend.
//! This crate has **no framework dependencies**: it defines the domain model
//! that the store, provider, chat, and gateway crates implement against.
//!
//! ## Seams
//!
//! The two external collaborators of the chat pipeline are traits here:
//! - [`DocumentStore`]: blocking, keyed reads of profiles and audits
//! - [`GenerationService`]: async text generation
//!
//! Implementations live in `veridian-store` and `veridian-providers`.

pub mod carbon;
pub mod chat;
pub mod error;
pub mod generation;
pub mod record;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use chat::{ChatRequest, ChatResult, UserContext};
pub use error::{ContextError, GenerationError, ProviderError, StoreError};
pub use generation::GenerationService;
pub use record::{FieldValue, Record};
pub use store::{AuditRecord, DocumentStore};
