use tracing::info;

/// Direction of a logged chat line. The dispatcher only records lines
/// leaving the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatDirection {
    Out,
}

impl ChatDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Out => "out",
        }
    }
}

/// Sink for chat lines crossing the client boundary.
pub trait ChatLog: Send + Sync {
    fn record(&self, message: &str, direction: ChatDirection);
}

/// Writes chat lines as `tracing` events on the `plume::chat` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingChatLog;

impl ChatLog for TracingChatLog {
    fn record(&self, message: &str, direction: ChatDirection) {
        info!(target: "plume::chat", direction = direction.as_str(), "{message}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_field_value() {
        assert_eq!(ChatDirection::Out.as_str(), "out");
    }
}
