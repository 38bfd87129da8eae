//! Protocol domain
//!
//! Everything needed to turn a question item into the conversation a subject
//! model answers under social pressure.
//!
//! - [`kind::Protocol`] / [`kind::MitigationMethod`]: what the peers do, and
//!   what the subject is told to resist them
//! - [`panel::PeerPanel`]: names and opinion templates of the synthetic peers
//! - [`composer::ProtocolComposer`]: builds the [`Conversation`](crate::session::entities::Conversation)

pub mod composer;
pub mod kind;
pub mod panel;

pub use composer::{ProtocolComposer, select_incorrect};
pub use kind::{MajorityDirection, MitigationMethod, Protocol};
pub use panel::{CHOICE_PLACEHOLDER, PeerPanel};
