//! Displayable chat content.
//!
//! A [`ChatComponent`] is a flat list of styled [`TextComponent`] runs. Plain
//! strings are converted with [`ChatComponent::of`], which understands the
//! legacy `§` escape codes for colors and formatting.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::FORMATTING_PREFIX;

// ── Display position ─────────────────────────────────────────────────────────

/// Where a received (or injected) chat line is rendered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatTextPosition {
    #[default]
    ChatBox,
    SystemMessage,
    Hotbar,
}

impl ChatTextPosition {
    /// Protocol id of this position.
    #[must_use]
    pub fn id(self) -> u8 {
        match self {
            Self::ChatBox => 0,
            Self::SystemMessage => 1,
            Self::Hotbar => 2,
        }
    }

    #[must_use]
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::ChatBox),
            1 => Some(Self::SystemMessage),
            2 => Some(Self::Hotbar),
            _ => None,
        }
    }
}

// ── Styles ───────────────────────────────────────────────────────────────────

/// The sixteen legacy chat colors, in code order (`§0` .. `§f`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatColor {
    Black,
    DarkBlue,
    DarkGreen,
    DarkAqua,
    DarkRed,
    DarkPurple,
    Gold,
    Gray,
    DarkGray,
    Blue,
    Green,
    Aqua,
    Red,
    LightPurple,
    Yellow,
    White,
}

impl ChatColor {
    const BY_CODE: [ChatColor; 16] = [
        Self::Black,
        Self::DarkBlue,
        Self::DarkGreen,
        Self::DarkAqua,
        Self::DarkRed,
        Self::DarkPurple,
        Self::Gold,
        Self::Gray,
        Self::DarkGray,
        Self::Blue,
        Self::Green,
        Self::Aqua,
        Self::Red,
        Self::LightPurple,
        Self::Yellow,
        Self::White,
    ];

    /// Resolve a legacy color code character (`0-9`, `a-f`, case-insensitive).
    #[must_use]
    pub fn from_code(code: char) -> Option<Self> {
        let index = code.to_digit(16)?;
        Self::BY_CODE.get(index as usize).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatFormatting {
    Obfuscated,
    Bold,
    Strikethrough,
    Underlined,
    Italic,
}

impl ChatFormatting {
    #[must_use]
    pub fn from_code(code: char) -> Option<Self> {
        match code.to_ascii_lowercase() {
            'k' => Some(Self::Obfuscated),
            'l' => Some(Self::Bold),
            'm' => Some(Self::Strikethrough),
            'n' => Some(Self::Underlined),
            'o' => Some(Self::Italic),
            _ => None,
        }
    }
}

const RESET_CODE: char = 'r';

// ── Components ───────────────────────────────────────────────────────────────

/// A single run of text sharing one style.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextComponent {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<ChatColor>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub formatting: BTreeSet<ChatFormatting>,
}

impl TextComponent {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// Displayable chat content made of styled runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatComponent {
    pub parts: Vec<TextComponent>,
}

impl ChatComponent {
    /// A single unstyled run. No escape parsing.
    pub fn text(text: impl Into<String>) -> Self {
        let text = text.into();
        if text.is_empty() {
            return Self::default();
        }
        Self {
            parts: vec![TextComponent::plain(text)],
        }
    }

    /// Parse a string that may contain legacy `§` escapes.
    ///
    /// A color code starts a new run and clears formatting, a formatting code
    /// adds to the current style and `§r` resets both. Unknown codes and a
    /// trailing lone prefix are kept as literal text.
    #[must_use]
    pub fn of(legacy: &str) -> Self {
        let mut parser = LegacyParser::default();
        let mut chars = legacy.chars();

        while let Some(ch) = chars.next() {
            if ch != FORMATTING_PREFIX {
                parser.current.push(ch);
                continue;
            }
            let Some(code) = chars.next() else {
                parser.current.push(ch);
                break;
            };
            if let Some(color) = ChatColor::from_code(code) {
                parser.flush();
                parser.color = Some(color);
                parser.formatting.clear();
            } else if let Some(format) = ChatFormatting::from_code(code) {
                parser.flush();
                parser.formatting.insert(format);
            } else if code.eq_ignore_ascii_case(&RESET_CODE) {
                parser.flush();
                parser.color = None;
                parser.formatting.clear();
            } else {
                parser.current.push(ch);
                parser.current.push(code);
            }
        }
        parser.flush();

        Self {
            parts: parser.parts,
        }
    }

    /// Plain text of all runs, without any styling.
    #[must_use]
    pub fn message(&self) -> String {
        self.parts.iter().map(|p| p.text.as_str()).collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parts.iter().all(|p| p.text.is_empty())
    }
}

#[derive(Default)]
struct LegacyParser {
    parts: Vec<TextComponent>,
    current: String,
    color: Option<ChatColor>,
    formatting: BTreeSet<ChatFormatting>,
}

impl LegacyParser {
    fn flush(&mut self) {
        if self.current.is_empty() {
            return;
        }
        self.parts.push(TextComponent {
            text: std::mem::take(&mut self.current),
            color: self.color,
            formatting: self.formatting.clone(),
        });
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_string_is_single_run() {
        let c = ChatComponent::of("hello world");
        assert_eq!(c.parts, vec![TextComponent::plain("hello world")]);
        assert_eq!(c.message(), "hello world");
    }

    #[test]
    fn empty_string_has_no_parts() {
        assert!(ChatComponent::of("").parts.is_empty());
        assert!(ChatComponent::text("").is_empty());
    }

    #[test]
    fn color_then_format_accumulates() {
        let c = ChatComponent::of("§c§lAlert§r done");
        assert_eq!(c.parts.len(), 2);
        assert_eq!(c.parts[0].text, "Alert");
        assert_eq!(c.parts[0].color, Some(ChatColor::Red));
        assert!(c.parts[0].formatting.contains(&ChatFormatting::Bold));
        assert_eq!(c.parts[1], TextComponent::plain(" done"));
        assert_eq!(c.message(), "Alert done");
    }

    #[test]
    fn color_code_clears_formatting() {
        let c = ChatComponent::of("§lbold§agreen");
        assert_eq!(c.parts[1].text, "green");
        assert_eq!(c.parts[1].color, Some(ChatColor::Green));
        assert!(c.parts[1].formatting.is_empty());
    }

    #[test]
    fn unknown_code_and_trailing_prefix_are_literal() {
        assert_eq!(ChatComponent::of("a§zb").message(), "a§zb");
        assert_eq!(ChatComponent::of("end§").message(), "end§");
    }

    #[test]
    fn uppercase_codes_are_accepted() {
        let c = ChatComponent::of("§Bx");
        assert_eq!(c.parts[0].color, Some(ChatColor::Aqua));
    }

    #[test]
    fn position_defaults_to_chat_box() {
        assert_eq!(ChatTextPosition::default(), ChatTextPosition::ChatBox);
        assert_eq!(ChatTextPosition::from_id(2), Some(ChatTextPosition::Hotbar));
        assert_eq!(ChatTextPosition::from_id(3), None);
    }

    #[test]
    fn component_serializes_without_empty_style() {
        let json = serde_json::to_value(ChatComponent::text("hi")).unwrap();
        assert_eq!(json, serde_json::json!({"parts": [{"text": "hi"}]}));
    }
}
