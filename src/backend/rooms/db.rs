//! Database operations for rooms
//!
//! Rooms, memberships and message history. Every query uses the runtime
//! `sqlx::query` API so the crate builds without a live database.

use sqlx::{PgConnection, PgPool};

use crate::shared::{ChatMessage, Room};

/// Create a room owned by `created_by`
///
/// The room, the creator's membership and, when `other_email` names an
/// existing user, that user's membership are written in one transaction.
/// An unknown `other_email` is ignored.
pub async fn create_room(
    pool: &PgPool,
    name: &str,
    created_by: i64,
    other_email: Option<&str>,
) -> Result<Room, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let room = sqlx::query_as::<_, Room>(
        r#"
        INSERT INTO rooms (name, created_by)
        VALUES ($1, $2)
        RETURNING id, name, created_by, created_at
        "#,
    )
    .bind(name)
    .bind(created_by)
    .fetch_one(&mut *tx)
    .await?;

    insert_member(&mut tx, room.id, created_by).await?;

    if let Some(email) = other_email {
        match user_id_by_email(&mut tx, email).await? {
            Some(other_id) => {
                insert_member(&mut tx, room.id, other_id).await?;
            }
            None => tracing::debug!("[Rooms] Invitee {} not found, skipping", email),
        }
    }

    tx.commit().await?;
    Ok(room)
}

/// Rooms the user belongs to, oldest first
pub async fn list_rooms_for_user(pool: &PgPool, user_id: i64) -> Result<Vec<Room>, sqlx::Error> {
    sqlx::query_as::<_, Room>(
        r#"
        SELECT r.id, r.name, r.created_by, r.created_at
        FROM rooms r
        JOIN room_members m ON r.id = m.room_id
        WHERE m.user_id = $1
        ORDER BY r.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn room_exists(pool: &PgPool, room_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM rooms WHERE id = $1)")
        .bind(room_id)
        .fetch_one(pool)
        .await
}

pub async fn is_member(pool: &PgPool, room_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS (SELECT 1 FROM room_members WHERE room_id = $1 AND user_id = $2)",
    )
    .bind(room_id)
    .bind(user_id)
    .fetch_one(pool)
    .await
}

/// Add users by id; returns one message per id that could not be added
///
/// Existing memberships are left untouched and are not reported.
pub async fn add_members_by_id(
    pool: &PgPool,
    room_id: i64,
    user_ids: &[i64],
) -> Result<Vec<String>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut errors = Vec::new();

    for &user_id in user_ids {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE id = $1)")
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
        if !exists {
            errors.push(format!("id {}: not found", user_id));
            continue;
        }
        insert_member(&mut tx, room_id, user_id).await?;
    }

    tx.commit().await?;
    Ok(errors)
}

/// Add users by email; returns one message per email that could not be added
pub async fn add_members_by_email(
    pool: &PgPool,
    room_id: i64,
    emails: &[String],
) -> Result<Vec<String>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut errors = Vec::new();

    for email in emails {
        match user_id_by_email(&mut tx, email).await? {
            Some(user_id) => {
                insert_member(&mut tx, room_id, user_id).await?;
            }
            None => errors.push(format!("email {}: not found", email)),
        }
    }

    tx.commit().await?;
    Ok(errors)
}

/// Store a message and seed per-member delivery metadata
///
/// Returns the stored row with its assigned id and timestamp.
pub async fn insert_message(
    pool: &PgPool,
    room_id: i64,
    sender_id: i64,
    content: &str,
) -> Result<ChatMessage, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let message = sqlx::query_as::<_, ChatMessage>(
        r#"
        INSERT INTO messages (room_id, sender_id, content)
        VALUES ($1, $2, $3)
        RETURNING id, room_id, sender_id, content, sent_at
        "#,
    )
    .bind(room_id)
    .bind(sender_id)
    .bind(content)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        INSERT INTO message_meta (message_id, user_id, status)
        SELECT $1, rm.user_id, 'sent' FROM room_members rm WHERE rm.room_id = $2
        ON CONFLICT (message_id, user_id) DO NOTHING
        "#,
    )
    .bind(message.id)
    .bind(room_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(message)
}

/// Newest-first page of a room's history
///
/// With `before_id`, only messages with a smaller id are returned, so the
/// last id of one page fetches the next.
pub async fn recent_messages(
    pool: &PgPool,
    room_id: i64,
    before_id: Option<i64>,
    limit: i64,
) -> Result<Vec<ChatMessage>, sqlx::Error> {
    sqlx::query_as::<_, ChatMessage>(
        r#"
        SELECT id, room_id, sender_id, content, sent_at
        FROM messages
        WHERE room_id = $1 AND ($2::BIGINT IS NULL OR id < $2)
        ORDER BY id DESC
        LIMIT $3
        "#,
    )
    .bind(room_id)
    .bind(before_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

async fn user_id_by_email(conn: &mut PgConnection, email: &str) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT id FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(conn)
        .await
}

async fn insert_member(conn: &mut PgConnection, room_id: i64, user_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO room_members (room_id, user_id)
        VALUES ($1, $2)
        ON CONFLICT (room_id, user_id) DO NOTHING
        "#,
    )
    .bind(room_id)
    .bind(user_id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
