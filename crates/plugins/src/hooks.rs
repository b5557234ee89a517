//! Hook system: re-exports core types from `plume-common` and builds a
//! registry from config.

use std::{sync::Arc, time::Duration};

use {plume_config::HooksConfig, tracing::warn};

// Re-export all core hook types so downstream code can use `plume_plugins::hooks::*`.
pub use plume_common::hooks::{
    HookAction, HookEvent, HookHandler, HookPayload, HookRegistry, HookStats,
};

use crate::shell_hook::ShellHookHandler;

/// Build a [`HookRegistry`] with the configured circuit breaker, dry-run mode
/// and shell hooks. Unknown event names are skipped with a warning; a hook
/// left with no known events is not registered.
pub fn build_registry(config: &HooksConfig) -> HookRegistry {
    let mut registry = HookRegistry::new()
        .with_circuit_breaker(
            config.circuit_breaker_threshold,
            Duration::from_secs(config.circuit_breaker_cooldown_secs),
        )
        .with_dry_run(config.dry_run);

    for entry in &config.shell {
        let mut events = Vec::with_capacity(entry.events.len());
        for name in &entry.events {
            match HookEvent::from_name(name) {
                Some(event) => events.push(event),
                None => warn!(hook = %entry.name, event = %name, "unknown hook event, skipping"),
            }
        }
        if events.is_empty() {
            warn!(hook = %entry.name, "shell hook has no known events, not registered");
            continue;
        }
        registry.register(Arc::new(ShellHookHandler::from_config(entry, events)));
    }

    registry
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use plume_config::ShellHookConfigEntry;

    use super::*;

    fn entry(name: &str, events: &[&str]) -> ShellHookConfigEntry {
        ShellHookConfigEntry {
            name: name.into(),
            command: "exit 0".into(),
            events: events.iter().map(|e| e.to_string()).collect(),
            timeout: 5,
            priority: 0,
            env: HashMap::new(),
        }
    }

    #[test]
    fn registers_shell_hooks_by_event() {
        let config = HooksConfig {
            shell: vec![
                entry("prefix", &["ChatMessageSending"]),
                entry("echo", &["ChatMessageReceiving", "ChatMessageSending"]),
            ],
            ..HooksConfig::default()
        };
        let registry = build_registry(&config);
        assert_eq!(registry.handler_names(), vec!["echo", "prefix"]);
        assert!(registry.has_handlers(HookEvent::ChatMessageSending));
        assert!(registry.has_handlers(HookEvent::ChatMessageReceiving));
    }

    #[test]
    fn skips_hooks_without_known_events() {
        let config = HooksConfig {
            shell: vec![entry("ghost", &["ChatMessageSent"])],
            ..HooksConfig::default()
        };
        let registry = build_registry(&config);
        assert!(registry.handler_names().is_empty());
    }

    #[test]
    fn applies_dry_run() {
        let config = HooksConfig {
            dry_run: true,
            ..HooksConfig::default()
        };
        assert!(build_registry(&config).dry_run);
    }

    #[test]
    fn hook_config_deserializes() {
        let toml_str = r#"
dry_run = false

[[shell]]
name = "prefix"
command = "./prefix.sh"
events = ["ChatMessageSending"]
timeout = 5

[[shell]]
name = "notify"
command = "./notify.sh"
events = ["ChatMessageReceiving"]
"#;
        let config: HooksConfig = toml_from_str(toml_str);
        assert_eq!(config.shell.len(), 2);
        assert_eq!(config.shell[0].timeout, 5);
        assert_eq!(config.shell[1].timeout, 10);
        assert_eq!(config.circuit_breaker_threshold, 3);
    }

    fn toml_from_str(raw: &str) -> HooksConfig {
        let wrapped = format!("[hooks]\n{}", raw.replace("[[shell]]", "[[hooks.shell]]"));
        plume_config::parse_config(&wrapped, std::path::Path::new("plume.toml"))
            .unwrap()
            .hooks
    }
}
