use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{
    Error, Result,
    error::Context,
    env_subst::substitute_env,
    schema::PlumeConfig,
    validate::{Severity, validate_config},
};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["plume.toml", "plume.yaml", "plume.yml", "plume.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> Result<PlumeConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./plume.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/plume/plume.{toml,yaml,yml,json}` (user-global)
///
/// Returns `PlumeConfig::default()` if no file is found, the file cannot be
/// parsed, or validation reports errors.
pub fn discover_and_load() -> PlumeConfig {
    let Some(path) = find_config_file() else {
        debug!("no config file found, using defaults");
        return PlumeConfig::default();
    };

    debug!(path = %path.display(), "loading config");
    let config = match load_config(&path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            return PlumeConfig::default();
        },
    };

    let result = validate_config(&config);
    for d in &result.diagnostics {
        warn!(path = %path.display(), field = %d.path, severity = %d.severity, "{}", d.message);
    }
    if result.has_errors() {
        warn!(
            path = %path.display(),
            errors = result.count(Severity::Error),
            "config is invalid, using defaults"
        );
        return PlumeConfig::default();
    }
    config
}

/// Find the first config file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(PathBuf::from);
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/plume/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "plume").map(|d| d.config_dir().to_path_buf())
}

/// Parse raw config text, choosing the format from the file extension.
pub fn parse_config(raw: &str, path: &Path) -> Result<PlumeConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => Err(Error::UnsupportedFormat {
            extension: ext.to_string(),
        }),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let cfg = parse_config("", Path::new("plume.toml")).unwrap();
        assert_eq!(cfg, PlumeConfig::default());
        assert_eq!(cfg.chat.illegal_chars, vec!['§']);
        assert_eq!(cfg.hooks.circuit_breaker_threshold, 3);
    }

    #[test]
    fn toml_with_chat_and_hooks() {
        let raw = r#"
[chat]
illegal_chars = ["§", "\u0000"]

[hooks]
dry_run = true

[[hooks.shell]]
name = "prefix"
command = "./prefix.sh"
events = ["ChatMessageSending"]
priority = 5
"#;
        let cfg = parse_config(raw, Path::new("plume.toml")).unwrap();
        assert_eq!(cfg.chat.illegal_chars, vec!['§', '\0']);
        assert!(cfg.hooks.dry_run);
        assert_eq!(cfg.hooks.shell.len(), 1);
        assert_eq!(cfg.hooks.shell[0].timeout, 10);
        assert_eq!(cfg.hooks.shell[0].priority, 5);
    }

    #[test]
    fn yaml_and_json_formats() {
        let yaml = "chat:\n  illegal_chars: ['#']\n";
        let cfg = parse_config(yaml, Path::new("plume.yaml")).unwrap();
        assert_eq!(cfg.chat.illegal_chars, vec!['#']);

        let json = r#"{"chat": {"illegal_chars": ["~"]}}"#;
        let cfg = parse_config(json, Path::new("plume.json")).unwrap();
        assert_eq!(cfg.chat.illegal_chars, vec!['~']);
    }

    #[test]
    fn unsupported_extension() {
        let err = parse_config("", Path::new("plume.ini")).unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat { extension } if extension == "ini"));
    }

    #[test]
    fn multi_char_entry_is_a_parse_error() {
        let err = parse_config("[chat]\nillegal_chars = [\"ab\"]", Path::new("plume.toml"));
        assert!(matches!(err, Err(Error::Toml(_))));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plume.toml");
        std::fs::write(&path, "[chat]\nillegal_chars = [\"§\", \"¶\"]\n").unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.chat.illegal_chars, vec!['§', '¶']);
    }

    #[test]
    fn missing_file_mentions_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
