//! The atomic unit of communication fed into the pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::channel::ChannelKind;

/// One post or message. Immutable once ingested; the fields are only
/// reachable through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextUnit {
    content: String,
    channel: ChannelKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    timestamp: Option<DateTime<Utc>>,
}

impl TextUnit {
    pub fn new(content: impl Into<String>, channel: ChannelKind) -> Self {
        Self {
            content: content.into(),
            channel,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn channel(&self) -> ChannelKind {
        self.channel
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// Whitespace-separated word count.
    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_without_timestamp() {
        let unit: TextUnit =
            serde_json::from_str(r#"{"content":"hello there friend","channel":"whatsapp"}"#)
                .unwrap();
        assert_eq!(unit.channel(), ChannelKind::PrivateDyadic);
        assert_eq!(unit.word_count(), 3);
        assert!(unit.timestamp().is_none());
    }
}
