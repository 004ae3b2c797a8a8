//! Exchange model: one proposed trade of a skill for another.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of an exchange.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExchangeStatus {
    Pending,
    Accepted,
    Completed,
    Cancelled,
}

impl ExchangeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeStatus::Pending => "pending",
            ExchangeStatus::Accepted => "accepted",
            ExchangeStatus::Completed => "completed",
            ExchangeStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the hardened lifecycle allows moving from `self` to `next`.
    ///
    /// pending -> accepted | cancelled, accepted -> completed.
    /// Completed and cancelled exchanges are terminal.
    pub fn can_transition_to(&self, next: ExchangeStatus) -> bool {
        matches!(
            (self, next),
            (ExchangeStatus::Pending, ExchangeStatus::Accepted)
                | (ExchangeStatus::Pending, ExchangeStatus::Cancelled)
                | (ExchangeStatus::Accepted, ExchangeStatus::Completed)
        )
    }
}

impl fmt::Display for ExchangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed or active skill exchange between two users.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Exchange {
    /// Creation timestamp in milliseconds, rendered as a string
    pub id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    /// Skill offered by the proposing user
    pub from_skill_id: String,
    /// Skill requested from the recipient
    pub to_skill_id: String,
    pub status: ExchangeStatus,
    pub offer_title: String,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from_user_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to_user_name: Option<String>,
}

impl Exchange {
    /// Whether `user_id` is one of the two participants.
    pub fn involves(&self, user_id: &str) -> bool {
        self.from_user_id == user_id || self.to_user_id == user_id
    }
}

/// Request body for proposing a new exchange.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposeExchangeRequest {
    pub from_user_id: String,
    pub to_user_id: String,
    pub from_skill_id: String,
    pub to_skill_id: String,
    pub offer_title: String,
    #[serde(default)]
    pub from_user_name: Option<String>,
    #[serde(default)]
    pub to_user_name: Option<String>,
}

impl ProposeExchangeRequest {
    /// Return the first blank required field, if any.
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("fromUserId", &self.from_user_id),
            ("toUserId", &self.to_user_id),
            ("fromSkillId", &self.from_skill_id),
            ("toSkillId", &self.to_skill_id),
            ("offerTitle", &self.offer_title),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
    }
}
