//! Client → server play packet definitions used by the outbound dispatcher.
//!
//! Only the packet *shapes* live here. Binary framing and serialization onto
//! the wire belong to the connection layer.
//!
//! Packet types:
//! - `ClientPacket::ChatMessage`: a chat line typed by the player
//! - `ClientPacket::ClientAction`: a payload-less client status signal

pub mod text;

use serde::{Deserialize, Serialize};

pub use text::{ChatColor, ChatComponent, ChatFormatting, ChatTextPosition, TextComponent};

// ── Constants ────────────────────────────────────────────────────────────────

/// Prefix character of legacy formatting escapes (`§c`, `§l`, ...).
pub const FORMATTING_PREFIX: char = '§';

// ── Client actions ───────────────────────────────────────────────────────────

/// Client status actions. Each variant carries no payload; the protocol only
/// transmits the numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAction {
    PerformRespawn,
    RequestStatistics,
    OpenInventory,
}

impl ClientAction {
    pub const ALL: &'static [ClientAction] = &[
        Self::PerformRespawn,
        Self::RequestStatistics,
        Self::OpenInventory,
    ];

    /// Protocol id of this action.
    #[must_use]
    pub fn id(self) -> u8 {
        match self {
            Self::PerformRespawn => 0,
            Self::RequestStatistics => 1,
            Self::OpenInventory => 2,
        }
    }

    #[must_use]
    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.id() == id)
    }
}

impl std::fmt::Display for ClientAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PerformRespawn => write!(f, "perform_respawn"),
            Self::RequestStatistics => write!(f, "request_statistics"),
            Self::OpenInventory => write!(f, "open_inventory"),
        }
    }
}

// ── Packets ──────────────────────────────────────────────────────────────────

/// Packets a client sends to the server during play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "packet", rename_all = "snake_case")]
pub enum ClientPacket {
    ChatMessage { message: String },
    ClientAction { action: ClientAction },
}

impl ClientPacket {
    pub fn chat(message: impl Into<String>) -> Self {
        Self::ChatMessage {
            message: message.into(),
        }
    }

    pub fn action(action: ClientAction) -> Self {
        Self::ClientAction { action }
    }
}
