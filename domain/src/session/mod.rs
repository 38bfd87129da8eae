//! Conversation domain.
//!
//! - [`entities::Conversation`]: the system + user message pair sent to a model
//! - [`entities::Message`]: a single role-tagged message

pub mod entities;
