//! Message repository.
//!
//! Customers write to the shop; admins reply. The admin inbox is grouped
//! into one conversation per customer.

use sqlx::PgPool;

use larkspur_core::UserId;

use crate::models::{ConversationSummary, Message};
use crate::RepositoryError;

const MESSAGE_COLUMNS: &str = "id, sender_id, receiver_id, content, read, created_at";

/// Repository for message operations.
pub struct MessageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> MessageRepository<'a> {
    /// Create a new message repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Send a message.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails (including
    /// foreign-key failures for unknown users).
    pub async fn create(
        &self,
        sender_id: UserId,
        receiver_id: UserId,
        content: &str,
    ) -> Result<Message, RepositoryError> {
        let message = sqlx::query_as::<_, Message>(&format!(
            r"
            INSERT INTO shop.message (sender_id, receiver_id, content)
            VALUES ($1, $2, $3)
            RETURNING {MESSAGE_COLUMNS}
            "
        ))
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content)
        .fetch_one(self.pool)
        .await?;

        Ok(message)
    }

    /// All messages in a customer's conversation, oldest first.
    ///
    /// A conversation is every message the customer sent or received,
    /// regardless of which admin answered.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn conversation(&self, customer_id: UserId) -> Result<Vec<Message>, RepositoryError> {
        let messages = sqlx::query_as::<_, Message>(&format!(
            r"
            SELECT {MESSAGE_COLUMNS}
            FROM shop.message
            WHERE sender_id = $1 OR receiver_id = $1
            ORDER BY created_at ASC, id ASC
            "
        ))
        .bind(customer_id)
        .fetch_all(self.pool)
        .await?;

        Ok(messages)
    }

    /// Admin inbox: one summary per customer, most recent activity first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn inbox(&self) -> Result<Vec<ConversationSummary>, RepositoryError> {
        let summaries = sqlx::query_as::<_, ConversationSummary>(
            r"
            SELECT u.id AS customer_id,
                   u.name AS customer_name,
                   u.email AS customer_email,
                   MAX(m.created_at) AS last_message_at,
                   COUNT(*) FILTER (
                       WHERE m.sender_id = u.id AND NOT m.read
                   ) AS unread_count
            FROM shop.user u
            JOIN shop.message m ON m.sender_id = u.id OR m.receiver_id = u.id
            WHERE u.role = 'customer'
            GROUP BY u.id, u.name, u.email
            ORDER BY MAX(m.created_at) DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(summaries)
    }

    /// Mark every message a customer sent as read.
    ///
    /// Called when an admin opens the conversation.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_conversation_read(&self, customer_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.message SET read = TRUE WHERE sender_id = $1 AND NOT read",
        )
        .bind(customer_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Mark every message addressed to a user as read.
    ///
    /// Called when the user opens their own thread.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn mark_received_read(&self, user_id: UserId) -> Result<u64, RepositoryError> {
        let result = sqlx::query(
            "UPDATE shop.message SET read = TRUE WHERE receiver_id = $1 AND NOT read",
        )
        .bind(user_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Number of unread messages addressed to a user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn unread_count_for(&self, user_id: UserId) -> Result<i64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM shop.message WHERE receiver_id = $1 AND NOT read",
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(count)
    }
}
