use std::sync::Arc;

use {
    plume_channels::{ChatDirection, ChatLog, OutboundChannel, TracingChatLog},
    plume_common::{
        ConnectionId,
        hooks::{HookAction, HookPayload, HookRegistry},
    },
    plume_config::PlumeConfig,
    plume_protocol::{ChatComponent, ChatTextPosition, ClientAction, FORMATTING_PREFIX},
    tracing::{debug, info},
};

use crate::{
    error::{Error, Result},
    validate::{RejectReason, validate_chat_message},
};

/// What became of a chat line handed to [`ChatDispatcher::send_chat_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Logged and queued; carries the text after hook rewrites.
    Sent(String),
    /// Failed validation. Nothing was dispatched, logged or sent.
    Rejected(RejectReason),
    /// A `ChatMessageSending` hook blocked the line.
    Cancelled { reason: String },
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent(_))
    }

    /// Turn a dropped line into an error, returning the sent text otherwise.
    pub fn into_result(self) -> Result<String> {
        match self {
            Self::Sent(text) => Ok(text),
            Self::Rejected(reason) => Err(Error::Rejected(reason)),
            Self::Cancelled { reason } => Err(Error::Cancelled { reason }),
        }
    }
}

/// Per-connection chat front end.
///
/// Holds only shared, immutable state, so one dispatcher can serve callers on
/// several threads. Every operation runs to completion before returning.
pub struct ChatDispatcher {
    connection: ConnectionId,
    outbound: Arc<dyn OutboundChannel>,
    hooks: Arc<HookRegistry>,
    chat_log: Arc<dyn ChatLog>,
    illegal_chars: Vec<char>,
}

impl ChatDispatcher {
    /// A dispatcher with no hooks, the tracing chat log and `§` as the only
    /// illegal character.
    pub fn new(connection: ConnectionId, outbound: Arc<dyn OutboundChannel>) -> Self {
        Self {
            connection,
            outbound,
            hooks: Arc::new(HookRegistry::new()),
            chat_log: Arc::new(TracingChatLog),
            illegal_chars: vec![FORMATTING_PREFIX],
        }
    }

    /// Build from loaded configuration, registering the configured shell hooks.
    pub fn from_config(
        config: &PlumeConfig,
        connection: ConnectionId,
        outbound: Arc<dyn OutboundChannel>,
    ) -> Self {
        let registry = plume_plugins::hooks::build_registry(&config.hooks);
        info!(
            connection = %connection,
            hooks = registry.handler_names().len(),
            "chat dispatcher configured"
        );
        Self::new(connection, outbound)
            .with_hooks(Arc::new(registry))
            .with_illegal_chars(config.chat.illegal_chars.iter().copied())
    }

    pub fn with_hooks(mut self, hooks: Arc<HookRegistry>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_chat_log(mut self, chat_log: Arc<dyn ChatLog>) -> Self {
        self.chat_log = chat_log;
        self
    }

    pub fn with_illegal_chars(mut self, chars: impl IntoIterator<Item = char>) -> Self {
        self.illegal_chars = chars.into_iter().collect();
        self
    }

    pub fn connection(&self) -> &ConnectionId {
        &self.connection
    }

    pub fn illegal_chars(&self) -> &[char] {
        &self.illegal_chars
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    // ── Outbound chat ───────────────────────────────────────────────────────

    /// Validate, offer to hooks, log and send a chat line.
    ///
    /// Rejected and cancelled lines have no side effects and are reported
    /// through [`SendOutcome`]; only a failing outbound channel is an error.
    pub fn send_chat_message(&self, text: &str) -> Result<SendOutcome> {
        if let Err(reason) = validate_chat_message(text, &self.illegal_chars) {
            debug!(connection = %self.connection, %reason, "chat message rejected");
            return Ok(SendOutcome::Rejected(reason));
        }

        let mut payload = HookPayload::ChatMessageSending {
            connection: self.connection.clone(),
            message: text.to_string(),
        };
        if let HookAction::Block(reason) = self.hooks.dispatch_sync(&mut payload)? {
            info!(connection = %self.connection, %reason, "chat message cancelled by hook");
            return Ok(SendOutcome::Cancelled { reason });
        }

        let HookPayload::ChatMessageSending { message, .. } = payload else {
            return Err(Error::Hook(anyhow::anyhow!(
                "ChatMessageSending payload changed kind during dispatch"
            )));
        };

        self.chat_log.record(&message, ChatDirection::Out);
        self.outbound.send_chat(&message)?;
        Ok(SendOutcome::Sent(message))
    }

    // ── Client status ───────────────────────────────────────────────────────

    pub fn respawn(&self) -> Result<()> {
        self.send_client_status(ClientAction::PerformRespawn)
    }

    /// Forward a status action. No validation, hooks or chat log.
    pub fn send_client_status(&self, action: ClientAction) -> Result<()> {
        debug!(connection = %self.connection, %action, "sending client status");
        self.outbound.send_client_action(action)?;
        Ok(())
    }

    // ── Local display ───────────────────────────────────────────────────────

    /// Show a message locally as if the server had sent it.
    ///
    /// Only `ChatMessageReceiving` hooks see it; blocks and patches from them
    /// are ignored and nothing reaches the outbound channel.
    pub fn send_fake_chat_message(
        &self,
        message: ChatComponent,
        position: ChatTextPosition,
    ) -> Result<()> {
        let mut payload = HookPayload::ChatMessageReceiving {
            connection: self.connection.clone(),
            message,
            position,
            sender: None,
        };
        self.hooks.dispatch_sync(&mut payload)?;
        Ok(())
    }

    /// Parse legacy `§` codes in `text` and show it in the chat box.
    pub fn send_fake_chat_text(&self, text: &str) -> Result<()> {
        self.send_fake_chat_message(ChatComponent::of(text), ChatTextPosition::ChatBox)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {plume_channels::PacketOutbound, plume_protocol::ClientPacket};

    use super::*;

    fn dispatcher() -> (
        ChatDispatcher,
        tokio::sync::mpsc::UnboundedReceiver<ClientPacket>,
    ) {
        let (outbound, rx) = PacketOutbound::pair();
        (
            ChatDispatcher::new(ConnectionId::new("local"), Arc::new(outbound)),
            rx,
        )
    }

    #[test]
    fn defaults() {
        let (d, _rx) = dispatcher();
        assert_eq!(d.illegal_chars(), &['§']);
        assert!(d.hooks().handler_names().is_empty());
        assert_eq!(d.connection().as_str(), "local");
    }

    #[test]
    fn sends_over_packet_queue() {
        let (d, mut rx) = dispatcher();
        assert_eq!(
            d.send_chat_message("hello").unwrap(),
            SendOutcome::Sent("hello".into())
        );
        d.respawn().unwrap();

        assert_eq!(rx.try_recv().unwrap(), ClientPacket::chat("hello"));
        assert_eq!(
            rx.try_recv().unwrap(),
            ClientPacket::action(ClientAction::PerformRespawn)
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn closed_connection_is_an_error() {
        let (d, rx) = dispatcher();
        drop(rx);
        let err = d.send_chat_message("hello").unwrap_err();
        assert!(err.is_unavailable());
        assert!(d.respawn().unwrap_err().is_unavailable());
    }

    #[test]
    fn rejection_is_not_an_error() {
        let (d, mut rx) = dispatcher();
        assert_eq!(
            d.send_chat_message("   ").unwrap(),
            SendOutcome::Rejected(RejectReason::Blank)
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn custom_illegal_chars_replace_default() {
        let (d, mut rx) = dispatcher();
        let d = d.with_illegal_chars(['#']);
        assert!(!d.send_chat_message("#hash").unwrap().is_sent());
        assert!(d.send_chat_message("§a fine here").unwrap().is_sent());
        assert_eq!(rx.try_recv().unwrap(), ClientPacket::chat("§a fine here"));
    }

    #[test]
    fn into_result() {
        assert_eq!(SendOutcome::Sent("x".into()).into_result().unwrap(), "x");
        assert!(matches!(
            SendOutcome::Rejected(RejectReason::IllegalCharacter('§')).into_result(),
            Err(Error::Rejected(RejectReason::IllegalCharacter('§')))
        ));
        let err = SendOutcome::Cancelled {
            reason: "muted".into(),
        }
        .into_result()
        .unwrap_err();
        assert_eq!(err.to_string(), "chat message cancelled by hook: muted");
    }

    #[test]
    fn from_config_uses_chat_settings() {
        let mut config = PlumeConfig::default();
        config.chat.illegal_chars = vec!['~'];
        let (outbound, _rx) = PacketOutbound::pair();
        let d = ChatDispatcher::from_config(&config, ConnectionId::random(), Arc::new(outbound));
        assert_eq!(d.illegal_chars(), &['~']);
        assert!(!d.hooks().dry_run);
    }

    #[test]
    fn fake_message_stays_local() {
        let (d, mut rx) = dispatcher();
        d.send_fake_chat_text("§cwarning").unwrap();
        d.send_fake_chat_message(ChatComponent::text("hi"), ChatTextPosition::Hotbar)
            .unwrap();
        assert!(rx.try_recv().is_err());
    }
}
