/// Content access gate
///
/// Decides how much of a course a user may see. Without an active purchase
/// lessons serialize as `{id, title}` only: the `videoUrl` and `notesUrl` keys
/// are absent, not null. An expired purchase is treated exactly like no
/// purchase. The check runs on every request; nothing is cached.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::entitlement::EntitlementService;
use crate::error::{CoreError, CoreResult};
use crate::models::{course::Course, lesson::Lesson};
use crate::store::Store;

/// Lesson as shown to a purchaser
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockedLesson {
    pub id: Uuid,
    pub title: String,
    pub video_url: String,
    pub notes_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Lesson as shown to everyone else
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockedLesson {
    pub id: Uuid,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum LessonView {
    Unlocked(UnlockedLesson),
    Locked(LockedLesson),
}

impl LessonView {
    fn of(lesson: Lesson, unlocked: bool) -> Self {
        if unlocked {
            LessonView::Unlocked(UnlockedLesson {
                id: lesson.id,
                title: lesson.title,
                video_url: lesson.video_url,
                notes_url: lesson.notes_url,
                created_at: lesson.created_at,
            })
        } else {
            LessonView::Locked(LockedLesson {
                id: lesson.id,
                title: lesson.title,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: i64,
    pub purchased: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
    pub lessons: Vec<LessonView>,
}

/// Catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CourseSummary {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub price: i64,
}

impl From<Course> for CourseSummary {
    fn from(course: Course) -> Self {
        Self {
            id: course.id,
            title: course.title,
            description: course.description,
            price: course.price,
        }
    }
}

pub struct AccessGate {
    store: Arc<dyn Store>,
    entitlements: Arc<EntitlementService>,
}

impl AccessGate {
    pub fn new(store: Arc<dyn Store>, entitlements: Arc<EntitlementService>) -> Self {
        Self {
            store,
            entitlements,
        }
    }

    /// Course page for `user_id`, with lesson media only if purchased
    pub async fn get_course_view(&self, course_id: Uuid, user_id: Uuid) -> CoreResult<CourseView> {
        let course = self
            .store
            .find_course(course_id)
            .await?
            .ok_or_else(|| CoreError::NotFound("Course not found".to_string()))?;

        self.view(course, user_id, Utc::now()).await
    }

    /// Same gate, addressing the course by exact title (oldest match wins)
    pub async fn get_course_view_by_title(&self, title: &str, user_id: Uuid) -> CoreResult<CourseView> {
        let course = self
            .store
            .find_course_by_title(title)
            .await?
            .ok_or_else(|| CoreError::NotFound("Course not found".to_string()))?;

        self.view(course, user_id, Utc::now()).await
    }

    pub async fn list_courses(&self) -> CoreResult<Vec<CourseSummary>> {
        Ok(self
            .store
            .list_courses()
            .await?
            .into_iter()
            .map(CourseSummary::from)
            .collect())
    }

    async fn view(&self, course: Course, user_id: Uuid, now: DateTime<Utc>) -> CoreResult<CourseView> {
        let status = self
            .entitlements
            .access_status(user_id, course.id, now)
            .await?;
        let purchased = status.is_active();

        let lessons = self
            .store
            .list_lessons(course.id)
            .await?
            .into_iter()
            .map(|lesson| LessonView::of(lesson, purchased))
            .collect();

        Ok(CourseView {
            id: course.id,
            title: course.title,
            description: course.description,
            price: course.price,
            purchased,
            expiry_date: status.active_until(),
            lessons,
        })
    }
}
