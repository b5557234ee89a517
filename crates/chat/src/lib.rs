//! Client-side chat dispatch.
//!
//! [`ChatDispatcher`] turns chat intents into outbound packets: lines are
//! validated, offered to `ChatMessageSending` hooks (which may rewrite or
//! cancel them), logged and sent. Fake messages only go through the
//! `ChatMessageReceiving` notification and never reach the server.

pub mod dispatcher;
pub mod error;
pub mod validate;

pub use {
    dispatcher::{ChatDispatcher, SendOutcome},
    error::{Error, Result},
    validate::{RejectReason, validate_chat_message},
};
