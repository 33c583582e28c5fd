/// Lesson progress for the authenticated user
///
/// - `POST /v1/progress {courseId, lessonId, completed}`: record completion;
///   403 without an active purchase
/// - `GET /v1/progress/:course_id`: completed vs total lessons

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{parse_id, ApiJson},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use coursehub_shared::{
    auth::identity::AuthContext, models::progress::Progress, progress::CourseProgress,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    pub course_id: Uuid,
    pub lesson_id: Uuid,
    pub completed: bool,
}

pub async fn record_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<ProgressRequest>,
) -> ApiResult<Json<Progress>> {
    Ok(Json(
        state
            .progress
            .record_progress(auth.user_id, req.course_id, req.lesson_id, req.completed)
            .await?,
    ))
}

pub async fn course_progress(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(course_id): Path<String>,
) -> ApiResult<Json<CourseProgress>> {
    let course_id = parse_id("courseId", &course_id)?;

    Ok(Json(
        state.progress.course_progress(auth.user_id, course_id).await?,
    ))
}
