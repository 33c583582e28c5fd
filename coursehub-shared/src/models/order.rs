/// Issued order model and database operations
///
/// Every gateway order CourseHub creates is recorded with the user, course and
/// amount it was issued for. A client confirmation only proves that the
/// gateway settled `(order_id, payment_id)`; the recorded order is what ties
/// that payment to one user and one course.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE orders (
///     gateway_order_id VARCHAR(255) PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id),
///     course_id UUID NOT NULL REFERENCES courses(id),
///     amount BIGINT NOT NULL CHECK (amount > 0),
///     currency VARCHAR(3) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::payment::gateway::OrderNotes;

/// A gateway order issued for a course purchase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct IssuedOrder {
    pub gateway_order_id: String,
    pub user_id: Uuid,
    pub course_id: Uuid,

    /// Amount in minor units, equal to the course price at issue time
    pub amount: i64,

    pub currency: String,
    pub created_at: DateTime<Utc>,
}

impl IssuedOrder {
    /// The user and course this order pays for
    pub fn notes(&self) -> OrderNotes {
        OrderNotes {
            user_id: self.user_id,
            course_id: self.course_id,
        }
    }
}

/// Input for recording an issued order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
    pub gateway_order_id: String,
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub amount: i64,
    pub currency: String,
}

impl IssuedOrder {
    /// Records an order returned by the gateway
    pub async fn create(pool: &PgPool, data: NewOrder) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, IssuedOrder>(
            r#"
            INSERT INTO orders (gateway_order_id, user_id, course_id, amount, currency)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING gateway_order_id, user_id, course_id, amount, currency, created_at
            "#,
        )
        .bind(data.gateway_order_id)
        .bind(data.user_id)
        .bind(data.course_id)
        .bind(data.amount)
        .bind(data.currency)
        .fetch_one(pool)
        .await
    }

    /// Finds an order by its gateway identifier
    pub async fn find_by_gateway_id(
        pool: &PgPool,
        gateway_order_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, IssuedOrder>(
            r#"
            SELECT gateway_order_id, user_id, course_id, amount, currency, created_at
            FROM orders
            WHERE gateway_order_id = $1
            "#,
        )
        .bind(gateway_order_id)
        .fetch_optional(pool)
        .await
    }
}
