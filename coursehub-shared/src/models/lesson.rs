/// Lesson model and database operations
///
/// A lesson belongs to exactly one course. Its media URLs are confidential:
/// they leave the service only through the access gate in [`crate::access`].
///
/// # Schema
///
/// ```sql
/// CREATE TABLE lessons (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     course_id UUID NOT NULL REFERENCES courses(id) ON DELETE CASCADE,
///     title VARCHAR(255) NOT NULL,
///     video_url VARCHAR(2048) NOT NULL,
///     notes_url VARCHAR(2048),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// A single lesson of a course
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: Uuid,

    /// Owning course
    pub course_id: Uuid,

    pub title: String,

    /// Location of the lesson video
    pub video_url: String,

    /// Optional location of the lesson notes
    pub notes_url: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Input for creating a lesson
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateLesson {
    pub course_id: Uuid,
    pub title: String,
    pub video_url: String,
    pub notes_url: Option<String>,
}

impl Lesson {
    /// Inserts a new lesson
    ///
    /// # Errors
    ///
    /// Fails with a foreign key violation when the course does not exist.
    pub async fn create(pool: &PgPool, data: CreateLesson) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Lesson>(
            r#"
            INSERT INTO lessons (course_id, title, video_url, notes_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, course_id, title, video_url, notes_url, created_at
            "#,
        )
        .bind(data.course_id)
        .bind(data.title)
        .bind(data.video_url)
        .bind(data.notes_url)
        .fetch_one(pool)
        .await
    }

    /// Lists a course's lessons in creation order
    pub async fn list_by_course(pool: &PgPool, course_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Lesson>(
            r#"
            SELECT id, course_id, title, video_url, notes_url, created_at
            FROM lessons
            WHERE course_id = $1
            ORDER BY created_at ASC
            "#,
        )
        .bind(course_id)
        .fetch_all(pool)
        .await
    }

    /// Finds a lesson only if it belongs to the given course
    pub async fn find_in_course(
        pool: &PgPool,
        lesson_id: Uuid,
        course_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Lesson>(
            r#"
            SELECT id, course_id, title, video_url, notes_url, created_at
            FROM lessons
            WHERE id = $1 AND course_id = $2
            "#,
        )
        .bind(lesson_id)
        .bind(course_id)
        .fetch_optional(pool)
        .await
    }
}
