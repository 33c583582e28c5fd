/// Catalog authoring and lesson media uploads
///
/// All routes require a bearer token whose email is listed in `ADMIN_EMAILS`.
///
/// - `POST /v1/admin/courses` - Create a course
/// - `POST /v1/admin/courses/:course_id/lessons` - Add a lesson
/// - `POST /v1/admin/uploads` - Presigned upload URL for lesson media
/// - `POST /v1/admin/uploads/verify` - Confirm an upload's checksum

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{parse_id, ApiJson},
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use coursehub_shared::{
    auth::identity::AuthContext,
    error::FieldError,
    models::{
        course::{Course, CreateCourse},
        lesson::{CreateLesson, Lesson},
    },
    uploads::UploadRequest,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    #[serde(default)]
    pub description: String,

    /// Minor currency units
    #[validate(range(min = 1, message = "Price must be positive"))]
    pub price: i64,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLessonRequest {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(url(message = "Video URL must be a valid URL"))]
    pub video_url: String,

    #[validate(url(message = "Notes URL must be a valid URL"))]
    pub notes_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadUrlResponse {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyUploadRequest {
    pub key: String,
    pub checksum: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyUploadResponse {
    pub verified: bool,
}

pub async fn create_course(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateCourseRequest>,
) -> ApiResult<(StatusCode, Json<Course>)> {
    req.validate()?;

    let course = state
        .store
        .create_course(CreateCourse {
            title: req.title.trim().to_string(),
            description: req.description,
            price: req.price,
        })
        .await?;

    info!(course_id = %course.id, admin = %auth.user_id, "Course created");
    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn create_lesson(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(course_id): Path<String>,
    ApiJson(req): ApiJson<CreateLessonRequest>,
) -> ApiResult<(StatusCode, Json<Lesson>)> {
    let course_id = parse_id("courseId", &course_id)?;
    req.validate()?;

    if state.store.find_course(course_id).await?.is_none() {
        return Err(ApiError::NotFound("Course not found".to_string()));
    }

    let lesson = state
        .store
        .create_lesson(CreateLesson {
            course_id,
            title: req.title.trim().to_string(),
            video_url: req.video_url,
            notes_url: req.notes_url,
        })
        .await?;

    info!(lesson_id = %lesson.id, %course_id, admin = %auth.user_id, "Lesson created");
    Ok((StatusCode::CREATED, Json(lesson)))
}

pub async fn create_upload_url(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<UploadRequest>,
) -> ApiResult<Json<UploadUrlResponse>> {
    let url = state.uploads.presign_upload(&req).await?;

    Ok(Json(UploadUrlResponse { url }))
}

pub async fn verify_upload(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<VerifyUploadRequest>,
) -> ApiResult<Json<VerifyUploadResponse>> {
    let mut errors = Vec::new();
    if req.key.trim().is_empty() {
        errors.push(FieldError::missing("key"));
    }
    if req.checksum.trim().is_empty() {
        errors.push(FieldError::missing("checksum"));
    }
    if !errors.is_empty() {
        return Err(ApiError::ValidationError(errors));
    }

    let verified = state.uploads.verify_checksum(&req.key, &req.checksum).await?;
    info!(key = %req.key, verified, "Upload checksum checked");

    Ok(Json(VerifyUploadResponse { verified }))
}
