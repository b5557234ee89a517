//! Semantic validation of a loaded configuration.

use std::collections::HashSet;

use plume_common::hooks::HookEvent;

use crate::schema::PlumeConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "hooks.shell[0].timeout"
    pub path: String,
    pub message: String,
}

/// Result of validating a configuration.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    /// Returns `true` if any diagnostic is an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Count diagnostics by severity.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    fn push(&mut self, severity: Severity, path: impl Into<String>, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Check a configuration for values that parse but cannot work.
pub fn validate_config(config: &PlumeConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    let illegal = &config.chat.illegal_chars;
    if illegal.is_empty() {
        result.push(
            Severity::Warning,
            "chat.illegal_chars",
            "no illegal characters configured; formatting escapes will reach the server",
        );
    }
    for (i, c) in illegal.iter().enumerate() {
        if c.is_whitespace() {
            result.push(
                Severity::Error,
                format!("chat.illegal_chars[{i}]"),
                format!("whitespace {c:?} would reject every multi-word message"),
            );
        }
    }

    let hooks = &config.hooks;
    if hooks.circuit_breaker_threshold == 0 {
        result.push(
            Severity::Error,
            "hooks.circuit_breaker_threshold",
            "threshold must be at least 1",
        );
    }

    let mut names = HashSet::new();
    for (i, hook) in hooks.shell.iter().enumerate() {
        let base = format!("hooks.shell[{i}]");
        if !names.insert(hook.name.as_str()) {
            result.push(
                Severity::Error,
                format!("{base}.name"),
                format!("duplicate hook name '{}'", hook.name),
            );
        }
        if hook.command.trim().is_empty() {
            result.push(Severity::Error, format!("{base}.command"), "command is empty");
        }
        if hook.timeout == 0 {
            result.push(
                Severity::Error,
                format!("{base}.timeout"),
                "timeout must be at least 1 second",
            );
        }
        if hook.events.is_empty() {
            result.push(
                Severity::Warning,
                format!("{base}.events"),
                "hook subscribes to no events and will never run",
            );
        }
        for (j, name) in hook.events.iter().enumerate() {
            if HookEvent::from_name(name).is_none() {
                result.push(
                    Severity::Error,
                    format!("{base}.events[{j}]"),
                    format!("unknown hook event '{name}'"),
                );
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ShellHookConfigEntry;

    fn hook(name: &str, events: &[&str]) -> ShellHookConfigEntry {
        ShellHookConfigEntry {
            name: name.into(),
            command: "true".into(),
            events: events.iter().map(|e| e.to_string()).collect(),
            timeout: 10,
            priority: 0,
            env: Default::default(),
        }
    }

    #[test]
    fn default_config_is_valid() {
        let result = validate_config(&PlumeConfig::default());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn whitespace_illegal_char_is_error() {
        let mut cfg = PlumeConfig::default();
        cfg.chat.illegal_chars.push(' ');
        let result = validate_config(&cfg);
        assert!(result.has_errors());
        assert_eq!(result.diagnostics[0].path, "chat.illegal_chars[1]");
    }

    #[test]
    fn empty_illegal_set_is_warning() {
        let mut cfg = PlumeConfig::default();
        cfg.chat.illegal_chars.clear();
        let result = validate_config(&cfg);
        assert!(!result.has_errors());
        assert_eq!(result.count(Severity::Warning), 1);
    }

    #[test]
    fn shell_hook_problems() {
        let mut cfg = PlumeConfig::default();
        let mut zero = hook("audit", &["ChatMessageSending"]);
        zero.timeout = 0;
        cfg.hooks.shell = vec![
            zero,
            hook("audit", &["ChatMessageSent"]),
            hook("idle", &[]),
        ];

        let result = validate_config(&cfg);
        let paths: Vec<&str> = result.diagnostics.iter().map(|d| d.path.as_str()).collect();
        assert!(paths.contains(&"hooks.shell[0].timeout"));
        assert!(paths.contains(&"hooks.shell[1].name"));
        assert!(paths.contains(&"hooks.shell[1].events[0]"));
        assert!(paths.contains(&"hooks.shell[2].events"));
        assert_eq!(result.count(Severity::Error), 3);
        assert_eq!(result.count(Severity::Warning), 1);
    }
}
