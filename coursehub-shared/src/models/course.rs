/// Course model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE courses (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     title VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     price BIGINT NOT NULL CHECK (price > 0),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A purchasable course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    /// Unique course ID
    pub id: Uuid,

    /// Course title
    pub title: String,

    /// Long-form description
    pub description: String,

    /// Price in the currency's minor unit (paise, cents)
    pub price: i64,

    /// When the course was created
    pub created_at: DateTime<Utc>,
}

/// Input for creating a course
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCourse {
    pub title: String,
    pub description: String,
    pub price: i64,
}

impl Course {
    /// Inserts a new course
    pub async fn create(pool: &PgPool, data: CreateCourse) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (title, description, price)
            VALUES ($1, $2, $3)
            RETURNING id, title, description, price, created_at
            "#,
        )
        .bind(data.title)
        .bind(data.description)
        .bind(data.price)
        .fetch_one(pool)
        .await
    }

    /// Finds a course by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, price, created_at
            FROM courses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds the oldest course with an exact title match
    pub async fn find_by_title(pool: &PgPool, title: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, price, created_at
            FROM courses
            WHERE title = $1
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .bind(title)
        .fetch_optional(pool)
        .await
    }

    /// Lists the whole catalog, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Course>(
            r#"
            SELECT id, title, description, price, created_at
            FROM courses
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }
}
