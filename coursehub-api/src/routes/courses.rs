/// Course catalog and gated course pages
///
/// The catalog is public. A single course page requires a bearer token; its
/// lesson URLs are included only while the caller holds an active purchase.

use crate::{app::AppState, error::ApiResult, extract::parse_id};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use coursehub_shared::{
    access::{CourseSummary, CourseView},
    auth::identity::AuthContext,
};

/// `GET /v1/courses`
pub async fn list_courses(State(state): State<AppState>) -> ApiResult<Json<Vec<CourseSummary>>> {
    Ok(Json(state.access.list_courses().await?))
}

/// `GET /v1/courses/:course_id`
pub async fn get_course(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(course_id): Path<String>,
) -> ApiResult<Json<CourseView>> {
    let course_id = parse_id("courseId", &course_id)?;

    Ok(Json(
        state.access.get_course_view(course_id, auth.user_id).await?,
    ))
}

/// `GET /v1/courses/by-title/:title`
pub async fn get_course_by_title(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(title): Path<String>,
) -> ApiResult<Json<CourseView>> {
    Ok(Json(
        state
            .access
            .get_course_view_by_title(&title, auth.user_id)
            .await?,
    ))
}
