/// Lesson progress model and database operations
///
/// One row per `(user_id, course_id, lesson_id)`. Writes are upserts and the
/// last write wins; no transition history is kept.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE progress (
///     user_id UUID NOT NULL REFERENCES users(id),
///     course_id UUID NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
///     lesson_id UUID NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
///     completed BOOLEAN NOT NULL,
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (user_id, course_id, lesson_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Completion state of one lesson for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub lesson_id: Uuid,
    pub completed: bool,
    pub updated_at: DateTime<Utc>,
}

/// Input for recording progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub lesson_id: Uuid,
    pub completed: bool,
}

impl Progress {
    /// Creates or overwrites the progress row for a lesson
    pub async fn upsert(pool: &PgPool, data: ProgressUpdate) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Progress>(
            r#"
            INSERT INTO progress (user_id, course_id, lesson_id, completed)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, course_id, lesson_id)
            DO UPDATE SET completed = EXCLUDED.completed, updated_at = NOW()
            RETURNING user_id, course_id, lesson_id, completed, updated_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.course_id)
        .bind(data.lesson_id)
        .bind(data.completed)
        .fetch_one(pool)
        .await
    }

    /// Lists a user's progress rows for one course
    pub async fn list_for_course(
        pool: &PgPool,
        user_id: Uuid,
        course_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Progress>(
            r#"
            SELECT user_id, course_id, lesson_id, completed, updated_at
            FROM progress
            WHERE user_id = $1 AND course_id = $2
            "#,
        )
        .bind(user_id)
        .bind(course_id)
        .fetch_all(pool)
        .await
    }
}
