/// Config schema types (chat validation, hooks).
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlumeConfig {
    pub chat: ChatConfig,
    pub hooks: HooksConfig,
}

/// Outgoing chat validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Characters a chat line may not contain. Defaults to the legacy
    /// formatting prefix `§`, which servers treat as a markup escape.
    pub illegal_chars: Vec<char>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            illegal_chars: vec!['§'],
        }
    }
}

/// Hook registry settings and shell hooks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    /// Log Block/Modify results without applying them.
    pub dry_run: bool,
    /// Consecutive failures before a handler is disabled.
    pub circuit_breaker_threshold: u64,
    /// Seconds a disabled handler stays disabled.
    pub circuit_breaker_cooldown_secs: u64,
    pub shell: Vec<ShellHookConfigEntry>,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            circuit_breaker_threshold: 3,
            circuit_breaker_cooldown_secs: 60,
            shell: Vec::new(),
        }
    }
}

/// A single shell hook defined in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShellHookConfigEntry {
    pub name: String,
    pub command: String,
    /// Event names, e.g. `"ChatMessageSending"`.
    pub events: Vec<String>,
    #[serde(default = "default_hook_timeout")]
    pub timeout: u64,
    #[serde(default)]
    pub priority: i32,
    #[serde(default)]
    pub env: HashMap<String, String>,
}

fn default_hook_timeout() -> u64 {
    10
}
