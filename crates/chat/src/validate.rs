use thiserror::Error;

/// Why an outgoing chat line was refused before reaching any hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("message is empty or whitespace")]
    Blank,
    #[error("message contains illegal character {0:?}")]
    IllegalCharacter(char),
}

/// Check a chat line against the blank rule and the illegal character set.
///
/// The blank check runs first; otherwise the first offending character in
/// `text` is reported.
pub fn validate_chat_message(text: &str, illegal: &[char]) -> Result<(), RejectReason> {
    if text.trim().is_empty() {
        return Err(RejectReason::Blank);
    }
    match text.chars().find(|c| illegal.contains(c)) {
        Some(c) => Err(RejectReason::IllegalCharacter(c)),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: &[char] = &['§'];

    #[test]
    fn blank_lines() {
        for text in ["", " ", "   ", "\t\n", "\u{3000}"] {
            assert_eq!(
                validate_chat_message(text, DEFAULT),
                Err(RejectReason::Blank),
                "{text:?}"
            );
        }
    }

    #[test]
    fn blank_follows_unicode_white_space() {
        // No-break space is Unicode white space.
        assert_eq!(
            validate_chat_message("\u{A0}", DEFAULT),
            Err(RejectReason::Blank)
        );
        // Unit separator is a control character, not white space.
        assert_eq!(validate_chat_message("\u{1F}", DEFAULT), Ok(()));
    }

    #[test]
    fn illegal_anywhere() {
        for text in ["§", "§a hello", "hi§there", "bye§"] {
            assert_eq!(
                validate_chat_message(text, DEFAULT),
                Err(RejectReason::IllegalCharacter('§')),
                "{text:?}"
            );
        }
    }

    #[test]
    fn first_offender_is_reported() {
        assert_eq!(
            validate_chat_message("a#b~c", &['~', '#']),
            Err(RejectReason::IllegalCharacter('#'))
        );
    }

    #[test]
    fn valid_lines() {
        assert_eq!(validate_chat_message("hello", DEFAULT), Ok(()));
        assert_eq!(validate_chat_message("  padded  ", DEFAULT), Ok(()));
        assert_eq!(validate_chat_message("/msg Steve hi", DEFAULT), Ok(()));
        assert_eq!(validate_chat_message("hi§there", &[]), Ok(()));
    }
}
