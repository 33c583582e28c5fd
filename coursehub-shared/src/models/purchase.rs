/// Purchase (entitlement) model and database operations
///
/// A purchase grants one user time-bounded access to one course. Rows are
/// append-only: they are never updated, and expiry is computed by comparing
/// `expiry_date` with the current time rather than stored as a flag.
///
/// The `(user_id, course_id, gateway_payment_id)` triple is unique. It is the
/// idempotency key shared by the client confirmation path and the webhook
/// path, so a second writer for the same payment inserts nothing. The payment
/// id is also unique on its own: one gateway payment backs at most one
/// purchase.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE purchases (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id),
///     course_id UUID NOT NULL REFERENCES courses(id),
///     gateway_order_id VARCHAR(255),
///     gateway_payment_id VARCHAR(255) NOT NULL,
///     purchase_date TIMESTAMPTZ NOT NULL,
///     expiry_date TIMESTAMPTZ NOT NULL,
///     payment_status payment_status NOT NULL DEFAULT 'success',
///     source grant_source NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CONSTRAINT purchases_payment_key UNIQUE (user_id, course_id, gateway_payment_id)
/// );
///
/// CREATE UNIQUE INDEX purchases_gateway_payment_id_key ON purchases (gateway_payment_id);
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Settlement status recorded on a purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    Pending,
    Success,
    Failed,
    Refunded,
}

/// Which confirmation path created the purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "grant_source", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum GrantSource {
    /// Client-reported, signature-verified confirmation
    Confirmation,

    /// Gateway-initiated webhook
    Webhook,
}

impl GrantSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            GrantSource::Confirmation => "confirmation",
            GrantSource::Webhook => "webhook",
        }
    }
}

/// An entitlement row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Purchase {
    pub id: Uuid,
    pub user_id: Uuid,
    pub course_id: Uuid,

    /// Gateway order this payment settled, when known
    pub gateway_order_id: Option<String>,

    /// Gateway payment identifier (idempotency key component)
    pub gateway_payment_id: String,

    pub purchase_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub source: GrantSource,
    pub created_at: DateTime<Utc>,
}

impl Purchase {
    /// Whether this purchase still grants access at `now`
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.payment_status == PaymentStatus::Success && self.expiry_date > now
    }
}

/// Input for recording a purchase
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPurchase {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: String,
    pub purchase_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub source: GrantSource,
}

/// A purchase joined with its course title, for purchase history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct PurchaseWithCourse {
    #[sqlx(flatten)]
    pub purchase: Purchase,
    pub course_title: String,
}

impl Purchase {
    /// Inserts a purchase unless one already exists for the same payment
    ///
    /// Returns `None` when a unique key on the payment swallowed the insert,
    /// i.e. another writer got there first. The caller re-reads by payment id
    /// to find out whose purchase it is.
    pub async fn insert_if_absent(
        pool: &PgPool,
        data: NewPurchase,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Purchase>(
            r#"
            INSERT INTO purchases (user_id, course_id, gateway_order_id, gateway_payment_id,
                                   purchase_date, expiry_date, payment_status, source)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT DO NOTHING
            RETURNING id, user_id, course_id, gateway_order_id, gateway_payment_id,
                      purchase_date, expiry_date, payment_status, source, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.course_id)
        .bind(data.gateway_order_id)
        .bind(data.gateway_payment_id)
        .bind(data.purchase_date)
        .bind(data.expiry_date)
        .bind(data.payment_status)
        .bind(data.source)
        .fetch_optional(pool)
        .await
    }

    /// Finds the purchase recorded for a gateway payment, whoever it belongs to
    pub async fn find_by_payment_id(
        pool: &PgPool,
        gateway_payment_id: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Purchase>(
            r#"
            SELECT id, user_id, course_id, gateway_order_id, gateway_payment_id,
                   purchase_date, expiry_date, payment_status, source, created_at
            FROM purchases
            WHERE gateway_payment_id = $1
            "#,
        )
        .bind(gateway_payment_id)
        .fetch_optional(pool)
        .await
    }

    /// Finds the successful purchase with the latest expiry for a user and course
    pub async fn find_latest(
        pool: &PgPool,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Purchase>(
            r#"
            SELECT id, user_id, course_id, gateway_order_id, gateway_payment_id,
                   purchase_date, expiry_date, payment_status, source, created_at
            FROM purchases
            WHERE user_id = $1 AND course_id = $2 AND payment_status = 'success'
            ORDER BY expiry_date DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_optional(pool)
        .await
    }

    /// Lists a user's purchase history with course titles, newest first
    pub async fn list_by_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<PurchaseWithCourse>, sqlx::Error> {
        sqlx::query_as::<_, PurchaseWithCourse>(
            r#"
            SELECT p.id, p.user_id, p.course_id, p.gateway_order_id, p.gateway_payment_id,
                   p.purchase_date, p.expiry_date, p.payment_status, p.source, p.created_at,
                   c.title AS course_title
            FROM purchases p
            JOIN courses c ON c.id = p.course_id
            WHERE p.user_id = $1
            ORDER BY p.purchase_date DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
