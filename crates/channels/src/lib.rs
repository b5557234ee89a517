//! Outbound collaborators of the chat dispatcher.
//!
//! An [`OutboundChannel`] carries client packets to the server; a [`ChatLog`]
//! records every chat line that actually leaves the client.

pub mod chat_log;
pub mod error;
pub mod outbound;

pub use {
    chat_log::{ChatDirection, ChatLog, TracingChatLog},
    error::{Error, Result},
    outbound::{OutboundChannel, PacketOutbound},
};
