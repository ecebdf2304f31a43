//! Relationship between the session's user and another user.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(default, deserialize_with = "crate::types::de::or_default")]
    pub outgoing_status: OutgoingStatus,
    #[serde(default, deserialize_with = "crate::types::de::or_default")]
    pub incoming_status: IncomingStatus,
    #[serde(default, deserialize_with = "crate::types::de::or_default")]
    pub target_user_is_private: bool,
}

/// The session user's status toward the target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutgoingStatus {
    Follows,
    #[serde(rename = "requested")]
    RequestedToFollow,
    #[default]
    #[serde(other)]
    None,
}

/// The target's status toward the session user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncomingStatus {
    FollowedBy,
    RequestedBy,
    BlockedByYou,
    #[default]
    #[serde(other)]
    None,
}

/// A change the session user can apply to a relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Follow,
    Unfollow,
    Block,
    Unblock,
    Approve,
    Deny,
}

impl Action {
    pub const ALL: [Action; 6] = [
        Action::Follow,
        Action::Unfollow,
        Action::Block,
        Action::Unblock,
        Action::Approve,
        Action::Deny,
    ];

    /// Wire value sent as the `action` form field.
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Follow => "follow",
            Action::Unfollow => "unfollow",
            Action::Block => "block",
            Action::Unblock => "unblock",
            Action::Approve => "approve",
            Action::Deny => "deny",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
