//! Communication channels a corpus can originate from.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A closed set of channel policies. Each carries its own expected
/// expression bias, looked up in the configured bias table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChannelKind {
    /// Public one-to-many posting (microblogs, public feeds).
    #[serde(alias = "twitter", alias = "public")]
    BroadcastPublic,
    /// Private one-to-one or small-group messaging.
    #[serde(alias = "whatsapp", alias = "private", alias = "chat")]
    PrivateDyadic,
    /// Professional one-to-many posting.
    #[serde(alias = "linkedin", alias = "professional")]
    ProfessionalBroadcast,
}

impl ChannelKind {
    pub const ALL: [ChannelKind; 3] = [
        ChannelKind::BroadcastPublic,
        ChannelKind::PrivateDyadic,
        ChannelKind::ProfessionalBroadcast,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::BroadcastPublic => "broadcast-public",
            Self::PrivateDyadic => "private-dyadic",
            Self::ProfessionalBroadcast => "professional-broadcast",
        }
    }

    /// Whether the channel is one-to-one rather than broadcast.
    pub fn is_private(self) -> bool {
        matches!(self, Self::PrivateDyadic)
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_aliases() {
        let c: ChannelKind = serde_json::from_str("\"twitter\"").unwrap();
        assert_eq!(c, ChannelKind::BroadcastPublic);
        let c: ChannelKind = serde_json::from_str("\"private-dyadic\"").unwrap();
        assert!(c.is_private());
        assert_eq!(
            serde_json::to_string(&ChannelKind::ProfessionalBroadcast).unwrap(),
            "\"professional-broadcast\""
        );
    }
}
