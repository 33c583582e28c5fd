/// Integration tests for catalog administration and media uploads

mod common;

use axum::http::StatusCode;
use common::{TestContext, ADMIN_EMAIL};
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_admin_routes_require_admin_email() {
    let ctx = TestContext::new();
    let (_, token) = ctx.create_user("learner@example.com").await;
    let course = json!({ "title": "Rust", "description": "Systems", "price": 4999 });

    let (status, _) = ctx.post("/v1/admin/courses", None, course.clone()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = ctx.post("/v1/admin/courses", Some(&token), course).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_admin_builds_catalog() {
    let ctx = TestContext::new();
    let (_, token) = ctx.create_user(ADMIN_EMAIL).await;

    let (status, course) = ctx
        .post(
            "/v1/admin/courses",
            Some(&token),
            json!({ "title": "Async Rust", "description": "Futures and executors", "price": 5999 }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", course);
    let course_id = course["id"].as_str().unwrap().to_string();

    let (status, lesson) = ctx
        .post(
            &format!("/v1/admin/courses/{}/lessons", course_id),
            Some(&token),
            json!({
                "title": "Pinning",
                "videoUrl": "https://cdn.coursehub.test/pinning.mp4",
                "notesUrl": "https://cdn.coursehub.test/pinning.pdf"
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", lesson);
    assert_eq!(lesson["courseId"], course_id.as_str());

    let (status, catalog) = ctx.get("/v1/courses", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(catalog[0]["title"], "Async Rust");
    assert_eq!(catalog[0]["price"], 5999);
}

#[tokio::test]
async fn test_course_and_lesson_validation() {
    let ctx = TestContext::new();
    let (_, token) = ctx.create_user(ADMIN_EMAIL).await;

    let (status, body) = ctx
        .post(
            "/v1/admin/courses",
            Some(&token),
            json!({ "title": "", "description": "", "price": 0 }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"].as_array().unwrap().len(), 2);

    let (status, _) = ctx
        .post(
            &format!("/v1/admin/courses/{}/lessons", Uuid::new_v4()),
            Some(&token),
            json!({ "title": "Orphan", "videoUrl": "https://cdn.coursehub.test/o.mp4" }),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let course = ctx.create_course("Real", 100).await;
    let (status, _) = ctx
        .post(
            &format!("/v1/admin/courses/{}/lessons", course.id),
            Some(&token),
            json!({ "title": "Bad link", "videoUrl": "not a url" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_upload_url_and_checksum_verification() {
    let ctx = TestContext::new();
    let (_, token) = ctx.create_user(ADMIN_EMAIL).await;

    let (status, body) = ctx
        .post(
            "/v1/admin/uploads",
            Some(&token),
            json!({ "key": "lessons/intro.mp4", "contentType": "video/mp4", "checksum": "abc123" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["url"].as_str().unwrap().contains("lessons/intro.mp4"));

    let verify = json!({ "key": "lessons/intro.mp4", "checksum": "abc123" });

    let (status, body) = ctx
        .post("/v1/admin/uploads/verify", Some(&token), verify.clone())
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["verified"], false);

    ctx.uploads.put_object("lessons/intro.mp4", "abc123");

    let (_, body) = ctx
        .post("/v1/admin/uploads/verify", Some(&token), verify)
        .await;
    assert_eq!(body["verified"], true);

    let (_, body) = ctx
        .post(
            "/v1/admin/uploads/verify",
            Some(&token),
            json!({ "key": "lessons/intro.mp4", "checksum": "tampered" }),
        )
        .await;
    assert_eq!(body["verified"], false);
}

#[tokio::test]
async fn test_upload_key_must_be_relative() {
    let ctx = TestContext::new();
    let (_, token) = ctx.create_user(ADMIN_EMAIL).await;

    let (status, body) = ctx
        .post(
            "/v1/admin/uploads",
            Some(&token),
            json!({ "key": "../secrets", "contentType": "video/mp4", "checksum": "abc" }),
        )
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["details"][0]["field"], "key");
}
