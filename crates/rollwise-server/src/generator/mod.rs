//! Alternative generation for decisions.
//!
//! Wraps the external text-completion provider behind a stable interface
//! that always yields 2-6 usable alternatives; provider failures degrade to
//! a fixed fallback list instead of surfacing to the caller.

mod adapter;
mod client;

pub use adapter::{GeneratorAdapter, GeneratorError, MAX_ALTERNATIVES, MIN_ALTERNATIVES};
pub use client::{
    CompletionProvider, DisabledProvider, HttpCompletionProvider, ProviderConfig, ProviderError,
};
