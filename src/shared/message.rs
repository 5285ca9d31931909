/**
 * Chat Message Data Structures
 *
 * Persisted chat messages and room records as they travel over the REST
 * API and, for messages, inside the real-time `message` frame.
 */
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A chat message after it has been stored
///
/// The id and `sent_at` are assigned by the persistence layer; the
/// real-time core never invents them.
///
/// # Example
/// ```rust
/// use roomchat::shared::ChatMessage;
/// use chrono::Utc;
///
/// let message = ChatMessage {
///     id: 1,
///     room_id: 5,
///     sender_id: 7,
///     content: "hello".to_string(),
///     sent_at: Utc::now(),
/// };
/// assert_eq!(message.room_id, 5);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct ChatMessage {
    /// Message id assigned by the store
    pub id: i64,
    /// Room the message belongs to
    pub room_id: i64,
    /// Author's user id
    pub sender_id: i64,
    /// Message body
    pub content: String,
    /// Server-side timestamp
    pub sent_at: DateTime<Utc>,
}

/// A chat room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[cfg_attr(feature = "server", derive(sqlx::FromRow))]
pub struct Room {
    pub id: i64,
    pub name: String,
    /// User id of the creator
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_chat_message_json_field_names() {
        let message = ChatMessage {
            id: 42,
            room_id: 5,
            sender_id: 9,
            content: "hi".to_string(),
            sent_at: Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap(),
        };

        let value = serde_json::to_value(&message).unwrap();
        assert_eq!(value["id"], 42);
        assert_eq!(value["room_id"], 5);
        assert_eq!(value["sender_id"], 9);
        assert_eq!(value["content"], "hi");
        assert_eq!(value["sent_at"], "2024-01-02T03:04:05Z");
    }
}
