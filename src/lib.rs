//! Chatbot Data - Data-access layer for the chatbot platform
//!
//! Repositories over a document store with lifecycle hooks, cascading
//! deletes that keep NLP records consistent, and lifecycle events published
//! to an injected event bus.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
