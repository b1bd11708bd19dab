//! Where a new request's conversation continues, and where passive status
//! updates go.

use serde::{Deserialize, Serialize};

use crate::core::config::ConversationRestriction;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelAssignments {
    pub conversation_channel_id: String,
    pub notification_channel_id: String,
}

impl ChannelAssignments {
    #[must_use]
    pub fn is_split(&self) -> bool {
        self.conversation_channel_id != self.notification_channel_id
    }
}

/// Decide the conversation and notification channels for a request raised in
/// `starting_channel_id`.
///
/// Pure: the same inputs always give the same assignment. When no primary
/// channel is configured both outputs fall back to the starting channel, so
/// the conversation channel is always one the request was raised from or the
/// configured primary.
#[must_use]
pub fn identify_channel_assignments(
    starting_channel_id: &str,
    primary_channel_id: Option<&str>,
    restriction: ConversationRestriction,
) -> ChannelAssignments {
    let primary = primary_channel_id
        .filter(|id| !id.is_empty())
        .unwrap_or(starting_channel_id);

    let conversation = match restriction {
        ConversationRestriction::Primary => primary,
        ConversationRestriction::None => starting_channel_id,
    };

    ChannelAssignments {
        conversation_channel_id: conversation.to_string(),
        notification_channel_id: primary.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_restriction_moves_conversation() {
        let a = identify_channel_assignments("C2", Some("C1"), ConversationRestriction::Primary);
        assert_eq!(a.conversation_channel_id, "C1");
        assert_eq!(a.notification_channel_id, "C1");
        assert!(!a.is_split());
    }

    #[test]
    fn unrestricted_keeps_conversation_where_it_started() {
        let a = identify_channel_assignments("C2", Some("C1"), ConversationRestriction::None);
        assert_eq!(a.conversation_channel_id, "C2");
        assert_eq!(a.notification_channel_id, "C1");
        assert!(a.is_split());
    }

    #[test]
    fn missing_primary_falls_back_to_start() {
        for policy in [ConversationRestriction::Primary, ConversationRestriction::None] {
            let a = identify_channel_assignments("C2", None, policy);
            assert_eq!(a.conversation_channel_id, "C2");
            assert_eq!(a.notification_channel_id, "C2");
        }
    }
}
