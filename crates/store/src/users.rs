//! User repository.
//!
//! Users are mirrored from the identity provider: the webhook receiver and
//! the login callback both upsert by `external_id`. Nothing here creates
//! credentials; authentication lives entirely with the provider.

use sqlx::PgPool;

use larkspur_core::{UserId, UserRole};

use crate::models::{DashboardCounts, IdentityProfile, User};
use crate::{RepositoryError, map_insert_error};

const USER_COLUMNS: &str = "id, external_id, email, name, role, created_at, updated_at";

/// Repository for user operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by local id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.user WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Insert or refresh the local mirror of a provider profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email collides with a
    /// different external id, `RepositoryError::Database` otherwise.
    pub async fn upsert_from_identity(
        &self,
        profile: &IdentityProfile,
    ) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r"
            INSERT INTO shop.user (external_id, email, name, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (external_id) DO UPDATE
            SET email = EXCLUDED.email,
                name = EXCLUDED.name,
                role = EXCLUDED.role,
                updated_at = now()
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(&profile.external_id)
        .bind(&profile.email)
        .bind(&profile.name)
        .bind(profile.role)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_insert_error(e, "user email"))?;

        Ok(user)
    }

    /// List all users, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.user ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(users)
    }

    /// Change a user's role in the local mirror.
    ///
    /// The caller is responsible for writing the role back to the identity
    /// provider first; the mirror follows the provider.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn set_role(&self, id: UserId, role: UserRole) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE shop.user SET role = $2, updated_at = now() WHERE id = $1")
            .bind(id)
            .bind(role)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// The longest-standing admin, used as the default message recipient.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn first_admin(&self) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.user WHERE role = 'admin' ORDER BY created_at ASC LIMIT 1"
        ))
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    /// Delete a user's local mirror by the provider id.
    ///
    /// Their messages, favorites, and order requests go with them.
    ///
    /// # Returns
    ///
    /// Returns `true` if a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn delete_by_external_id(&self, external_id: &str) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM shop.user WHERE external_id = $1"
        ))
        .bind(external_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(user) = user else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM shop.favorite WHERE user_id = $1")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM shop.message WHERE sender_id = $1 OR receiver_id = $1")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM shop.order_request WHERE user_id = $1")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM shop.user WHERE id = $1")
            .bind(user.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    /// Entity counts for the admin dashboard.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn dashboard_counts(&self) -> Result<DashboardCounts, RepositoryError> {
        let (products, categories, users, pending_orders, unread_messages): (
            i64,
            i64,
            i64,
            i64,
            i64,
        ) = sqlx::query_as(
            r"
            SELECT
                (SELECT COUNT(*) FROM catalog.product),
                (SELECT COUNT(*) FROM catalog.category),
                (SELECT COUNT(*) FROM shop.user),
                (SELECT COUNT(*) FROM shop.order_request WHERE status = 'pending'),
                (SELECT COUNT(*) FROM shop.message m
                 JOIN shop.user u ON u.id = m.receiver_id
                 WHERE u.role = 'admin' AND NOT m.read)
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(DashboardCounts {
            products,
            categories,
            users,
            pending_orders,
            unread_messages,
        })
    }
}
