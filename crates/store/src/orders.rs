//! Order-request repository.
//!
//! Totals are computed here from [`OrderPricing`], never accepted from the
//! caller, and status changes go through the transition table in core.

use sqlx::PgPool;

use larkspur_core::pricing::OrderPricing;
use larkspur_core::{OrderRequestId, OrderStatus, ProductId, UserId};

use crate::models::{OrderRequest, OrderRequestDetail};
use crate::RepositoryError;

const ORDER_COLUMNS: &str = "id, user_id, product_id, quantity, unit_price, delivery_fee, \
     total_price, status, note, created_at, updated_at";

const DETAIL_COLUMNS: &str = "o.id, o.user_id, o.product_id, o.quantity, o.unit_price, \
     o.delivery_fee, o.total_price, o.status, o.note, o.created_at, o.updated_at, \
     p.title AS product_title, p.slug AS product_slug, \
     u.name AS customer_name, u.email AS customer_email";

/// Repository for order-request operations.
pub struct OrderRequestRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRequestRepository<'a> {
    /// Create a new order-request repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a pending order request.
    ///
    /// The stored total is derived from `pricing`; see
    /// [`OrderPricing::total`].
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(
        &self,
        user_id: UserId,
        product_id: ProductId,
        pricing: OrderPricing,
        note: Option<&str>,
    ) -> Result<OrderRequest, RepositoryError> {
        let order = sqlx::query_as::<_, OrderRequest>(&format!(
            r"
            INSERT INTO shop.order_request
                (user_id, product_id, quantity, unit_price, delivery_fee, total_price, note)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(product_id)
        .bind(i32::try_from(pricing.quantity).unwrap_or(i32::MAX))
        .bind(pricing.unit_price)
        .bind(pricing.delivery_fee)
        .bind(pricing.total())
        .bind(note)
        .fetch_one(self.pool)
        .await?;

        Ok(order)
    }

    /// Get an order request by id, joined with display fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_detail(
        &self,
        id: OrderRequestId,
    ) -> Result<Option<OrderRequestDetail>, RepositoryError> {
        let order = sqlx::query_as::<_, OrderRequestDetail>(&format!(
            r"
            SELECT {DETAIL_COLUMNS}
            FROM shop.order_request o
            JOIN catalog.product p ON p.id = o.product_id
            JOIN shop.user u ON u.id = o.user_id
            WHERE o.id = $1
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(order)
    }

    /// A customer's own order requests, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderRequestDetail>, RepositoryError> {
        let orders = sqlx::query_as::<_, OrderRequestDetail>(&format!(
            r"
            SELECT {DETAIL_COLUMNS}
            FROM shop.order_request o
            JOIN catalog.product p ON p.id = o.product_id
            JOIN shop.user u ON u.id = o.user_id
            WHERE o.user_id = $1
            ORDER BY o.created_at DESC, o.id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(orders)
    }

    /// All order requests, optionally restricted to one status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(
        &self,
        status: Option<OrderStatus>,
    ) -> Result<Vec<OrderRequestDetail>, RepositoryError> {
        let orders = match status {
            Some(status) => {
                sqlx::query_as::<_, OrderRequestDetail>(&format!(
                    r"
                    SELECT {DETAIL_COLUMNS}
                    FROM shop.order_request o
                    JOIN catalog.product p ON p.id = o.product_id
                    JOIN shop.user u ON u.id = o.user_id
                    WHERE o.status = $1
                    ORDER BY o.created_at DESC, o.id DESC
                    "
                ))
                .bind(status)
                .fetch_all(self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, OrderRequestDetail>(&format!(
                    r"
                    SELECT {DETAIL_COLUMNS}
                    FROM shop.order_request o
                    JOIN catalog.product p ON p.id = o.product_id
                    JOIN shop.user u ON u.id = o.user_id
                    ORDER BY o.created_at DESC, o.id DESC
                    "
                ))
                .fetch_all(self.pool)
                .await?
            }
        };

        Ok(orders)
    }

    /// Move an order request to a new status.
    ///
    /// The row is locked while the transition table is consulted, so two
    /// admins racing on the same request cannot both win.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the request does not exist and
    /// `RepositoryError::Conflict` if the transition is not allowed.
    pub async fn transition(
        &self,
        id: OrderRequestId,
        next: OrderStatus,
    ) -> Result<OrderRequest, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let current: Option<(OrderStatus,)> =
            sqlx::query_as("SELECT status FROM shop.order_request WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let Some((current,)) = current else {
            return Err(RepositoryError::NotFound);
        };

        if !current.can_transition_to(next) {
            return Err(RepositoryError::Conflict(format!(
                "cannot move order from {current} to {next}"
            )));
        }

        let order = sqlx::query_as::<_, OrderRequest>(&format!(
            r"
            UPDATE shop.order_request
            SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(next)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Cancel a customer's own pending request.
    ///
    /// Unlike [`Self::transition`], this checks ownership.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no pending request with this id
    /// belongs to the user.
    pub async fn cancel_own(
        &self,
        id: OrderRequestId,
        user_id: UserId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE shop.order_request
            SET status = 'cancelled', updated_at = now()
            WHERE id = $1 AND user_id = $2 AND status = 'pending'
            ",
        )
        .bind(id)
        .bind(user_id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
