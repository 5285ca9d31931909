/**
 * Room Handler Types
 *
 * Request bodies, query parameters and response payloads for the room
 * endpoints, plus the parsing rules for member lists and history paging.
 */

use serde::{Deserialize, Serialize};

use crate::shared::SharedError;

/// Largest page `GET /rooms/{id}/messages` returns
pub const MAX_PAGE_SIZE: i64 = 100;

#[derive(Deserialize, Serialize, Debug)]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub name: String,
    /// Second member added at creation time
    #[serde(default)]
    pub other_email: Option<String>,
}

impl CreateRoomRequest {
    pub fn validate(&self) -> Result<(), SharedError> {
        if self.name.trim().is_empty() {
            return Err(SharedError::validation("name", "name is required"));
        }
        Ok(())
    }

    /// Invitee email, ignoring blanks
    pub fn invitee(&self) -> Option<&str> {
        self.other_email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

/// Comma-separated user ids or emails
#[derive(Deserialize, Serialize, Debug, Default)]
pub struct AddMembersRequest {
    #[serde(default)]
    pub ids: Option<String>,
    #[serde(default)]
    pub emails: Option<String>,
}

/// Who an add-members request targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberTargets {
    Ids(Vec<i64>),
    Emails(Vec<String>),
    Nobody,
}

impl AddMembersRequest {
    /// Ids win over emails when both are present. Blank entries and ids
    /// that do not parse are skipped.
    pub fn targets(&self) -> MemberTargets {
        if let Some(ids) = non_blank(&self.ids) {
            return MemberTargets::Ids(
                split_list(ids)
                    .filter_map(|id| id.parse::<i64>().ok())
                    .collect(),
            );
        }
        if let Some(emails) = non_blank(&self.emails) {
            return MemberTargets::Emails(split_list(emails).map(str::to_string).collect());
        }
        MemberTargets::Nobody
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn split_list(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').map(str::trim).filter(|entry| !entry.is_empty())
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AddMembersResponse {
    pub added_by: i64,
    pub room_id: i64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

#[derive(Deserialize, Serialize, Debug)]
pub struct SendMessageRequest {
    #[serde(default)]
    pub content: String,
}

/// Raw query of `GET /rooms/{id}/messages`
///
/// Kept as strings so bad values produce the endpoint's own messages.
#[derive(Deserialize, Debug, Default)]
pub struct HistoryQuery {
    pub num: Option<String>,
    pub last_id: Option<String>,
}

/// Validated paging parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryPage {
    pub limit: i64,
    pub before_id: Option<i64>,
}

impl HistoryQuery {
    pub fn page(&self) -> Result<HistoryPage, SharedError> {
        let limit = self
            .num
            .as_deref()
            .and_then(|num| num.trim().parse::<i64>().ok())
            .filter(|num| (1..=MAX_PAGE_SIZE).contains(num))
            .ok_or_else(|| SharedError::validation("num", "num param required (1-100)"))?;

        let before_id = match self.last_id.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(raw) => Some(
                raw.parse::<i64>()
                    .map_err(|_| SharedError::validation("last_id", "Invalid last_id"))?,
            ),
        };

        Ok(HistoryPage { limit, before_id })
    }
}

/// Payload of `GET /rooms/{id}/check`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MembershipCheck {
    pub room_id: i64,
    pub user_id: i64,
}
