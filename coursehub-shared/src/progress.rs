/// Per-lesson progress, gated by entitlement
///
/// Checks run in a fixed order so the caller gets the most specific error:
/// course exists, lesson belongs to that course, an active purchase exists.
/// The lesson check rejects a lesson id from another course even when both ids
/// are valid on their own.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::entitlement::{AccessStatus, EntitlementService};
use crate::error::{CoreError, CoreResult};
use crate::models::progress::{Progress, ProgressUpdate};
use crate::store::Store;

pub const NOT_PURCHASED: &str = "Course not purchased";
pub const ACCESS_EXPIRED: &str = "Course access expired";

/// Completion summary for one course
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub course_id: Uuid,
    pub lessons_completed: usize,
    pub total_lessons: usize,
}

pub struct ProgressTracker {
    store: Arc<dyn Store>,
    entitlements: Arc<EntitlementService>,
}

impl ProgressTracker {
    pub fn new(store: Arc<dyn Store>, entitlements: Arc<EntitlementService>) -> Self {
        Self {
            store,
            entitlements,
        }
    }

    /// Records completion of a lesson, last write wins
    ///
    /// # Errors
    ///
    /// - `NotFound` if the course is missing or the lesson is not in it
    /// - `Forbidden` without a purchase, `Expired` when it has lapsed
    pub async fn record_progress(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        lesson_id: Uuid,
        completed: bool,
    ) -> CoreResult<Progress> {
        if self.store.find_course(course_id).await?.is_none() {
            return Err(CoreError::NotFound("Course not found".to_string()));
        }

        if self
            .store
            .find_lesson_in_course(lesson_id, course_id)
            .await?
            .is_none()
        {
            return Err(CoreError::NotFound(
                "Lesson not found in the specified course".to_string(),
            ));
        }

        match self
            .entitlements
            .access_status(user_id, course_id, Utc::now())
            .await?
        {
            AccessStatus::Active(_) => {}
            AccessStatus::Expired(_) => return Err(CoreError::Expired(ACCESS_EXPIRED.to_string())),
            AccessStatus::NotPurchased => {
                return Err(CoreError::Forbidden(NOT_PURCHASED.to_string()))
            }
        }

        let progress = self
            .store
            .upsert_progress(ProgressUpdate {
                user_id,
                course_id,
                lesson_id,
                completed,
            })
            .await?;

        debug!(%user_id, %course_id, %lesson_id, completed, "Progress recorded");
        Ok(progress)
    }

    /// Counts completed lessons that still belong to the course
    pub async fn course_progress(&self, user_id: Uuid, course_id: Uuid) -> CoreResult<CourseProgress> {
        if self.store.find_course(course_id).await?.is_none() {
            return Err(CoreError::NotFound("Course not found".to_string()));
        }

        let lessons: HashSet<Uuid> = self
            .store
            .list_lessons(course_id)
            .await?
            .into_iter()
            .map(|l| l.id)
            .collect();

        let lessons_completed = self
            .store
            .list_progress(user_id, course_id)
            .await?
            .iter()
            .filter(|p| p.completed && lessons.contains(&p.lesson_id))
            .count();

        Ok(CourseProgress {
            course_id,
            lessons_completed,
            total_lessons: lessons.len(),
        })
    }
}
