//! Common test utilities for integration tests
//!
//! Every test drives the real router in-process over:
//! - `MemoryStore` instead of Postgres
//! - `FakeGateway` instead of Razorpay
//! - `FakeUploadSigner` instead of S3
//!
//! plus helpers for users, courses, tokens and signed payloads.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use coursehub_api::app::{build_router, AppState};
use coursehub_api::config::Config;
use coursehub_shared::auth::jwt::{create_token, Claims, TokenType};
use coursehub_shared::error::{CoreError, CoreResult};
use coursehub_shared::models::{
    course::{Course, CreateCourse},
    lesson::{CreateLesson, Lesson},
    purchase::{GrantSource, NewPurchase, PaymentStatus, Purchase},
    user::{CreateUser, User},
};
use coursehub_shared::payment::gateway::{CreateOrder, GatewayOrder, PaymentGateway};
use coursehub_shared::payment::signature::{payment_message, sign};
use coursehub_shared::store::{memory::MemoryStore, Store};
use coursehub_shared::uploads::{UploadRequest, UploadSigner};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const KEY_SECRET: &str = "rzp_test_key_secret";
pub const WEBHOOK_SECRET: &str = "rzp_test_webhook_secret";
pub const ADMIN_EMAIL: &str = "admin@coursehub.test";

/// In-process payment gateway
#[derive(Default)]
pub struct FakeGateway {
    orders: Mutex<HashMap<String, GatewayOrder>>,
    sequence: AtomicUsize,
    unavailable: AtomicBool,
}

impl FakeGateway {
    /// Simulates the customer completing payment
    pub fn mark_paid(&self, order_id: &str) {
        if let Some(order) = self.orders.lock().unwrap().get_mut(order_id) {
            order.status = "paid".to_string();
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn order_count(&self) -> usize {
        self.orders.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(&self, request: CreateOrder) -> CoreResult<GatewayOrder> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(CoreError::Gateway("connection refused".to_string()));
        }

        let n = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let order = GatewayOrder {
            id: format!("order_test{}", n),
            amount: request.amount,
            currency: request.currency,
            receipt: Some(request.receipt),
            status: "created".to_string(),
            notes: Some(request.notes),
        };
        self.orders
            .lock()
            .unwrap()
            .insert(order.id.clone(), order.clone());
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &str) -> CoreResult<GatewayOrder> {
        self.orders
            .lock()
            .unwrap()
            .get(order_id)
            .cloned()
            .ok_or_else(|| CoreError::Gateway(format!("order {} not found", order_id)))
    }
}

/// In-process object storage keyed by object key, holding checksum metadata
#[derive(Default)]
pub struct FakeUploadSigner {
    objects: Mutex<HashMap<String, String>>,
}

impl FakeUploadSigner {
    /// Simulates the client finishing a direct upload
    pub fn put_object(&self, key: &str, checksum: &str) {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), checksum.to_string());
    }
}

#[async_trait]
impl UploadSigner for FakeUploadSigner {
    async fn presign_upload(&self, request: &UploadRequest) -> CoreResult<String> {
        request.validate()?;
        Ok(format!(
            "https://coursehub-media.s3.test/{}?X-Amz-Expires=60",
            request.key
        ))
    }

    async fn verify_checksum(&self, key: &str, expected: &str) -> CoreResult<bool> {
        Ok(self.objects.lock().unwrap().get(key).map(String::as_str) == Some(expected))
    }
}

/// Environment for [`Config::from_lookup`], with overrides applied
pub fn test_config(overrides: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = [
        ("DATABASE_URL", "postgresql://unused/coursehub_test"),
        ("JWT_SECRET", JWT_SECRET),
        ("RAZORPAY_KEY_ID", "rzp_test_key"),
        ("RAZORPAY_KEY_SECRET", KEY_SECRET),
        ("RAZORPAY_WEBHOOK_SECRET", WEBHOOK_SECRET),
        ("AWS_BUCKET_NAME", "coursehub-media"),
        ("AWS_BUCKET_REGION", "ap-south-1"),
        ("AWS_ACCESS_KEY", "AKIDEXAMPLE"),
        ("AWS_SECRET_ACCESS_KEY", "aws-secret"),
        ("ADMIN_EMAILS", ADMIN_EMAIL),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }

    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

/// Test context containing the router and handles to its adapters
pub struct TestContext {
    pub app: axum::Router,
    pub store: Arc<MemoryStore>,
    pub gateway: Arc<FakeGateway>,
    pub uploads: Arc<FakeUploadSigner>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_env(&[])
    }

    pub fn with_env(overrides: &[(&str, &str)]) -> Self {
        let store = Arc::new(MemoryStore::new());
        let gateway = Arc::new(FakeGateway::default());
        let uploads = Arc::new(FakeUploadSigner::default());

        let state = AppState::new(
            test_config(overrides),
            store.clone(),
            gateway.clone(),
            uploads.clone(),
        );

        Self {
            app: build_router(state),
            store,
            gateway,
            uploads,
        }
    }

    /// Creates a user directly in the store and returns an access token for it
    pub async fn create_user(&self, email: &str) -> (User, String) {
        let user = self
            .store
            .create_user(CreateUser {
                email: email.to_string(),
                password_hash: "unused".to_string(),
                name: "Test User".to_string(),
            })
            .await
            .unwrap();

        let claims = Claims::new(user.id, user.email.clone(), TokenType::Access);
        let token = create_token(&claims, JWT_SECRET).unwrap();
        (user, token)
    }

    pub async fn create_course(&self, title: &str, price: i64) -> Course {
        self.store
            .create_course(CreateCourse {
                title: title.to_string(),
                description: format!("All about {}", title),
                price,
            })
            .await
            .unwrap()
    }

    pub async fn create_lesson(&self, course_id: Uuid, title: &str) -> Lesson {
        self.store
            .create_lesson(CreateLesson {
                course_id,
                title: title.to_string(),
                video_url: format!("https://cdn.coursehub.test/{}.mp4", Uuid::new_v4()),
                notes_url: Some("https://cdn.coursehub.test/notes.pdf".to_string()),
            })
            .await
            .unwrap()
    }

    /// Issues an order through the API and returns the gateway order id
    pub async fn issue_order(&self, user_id: Uuid, course: &Course) -> String {
        let (status, order) = self
            .post(
                "/v1/orders",
                None,
                json!({ "amountMinorUnits": course.price, "userId": user_id, "courseId": course.id }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", order);
        order["gatewayOrderId"].as_str().unwrap().to_string()
    }

    /// Inserts a purchase whose access window ended `days_ago` days ago
    pub async fn create_expired_purchase(&self, user_id: Uuid, course_id: Uuid, days_ago: i64) -> Purchase {
        let now = Utc::now();
        self.store
            .insert_purchase(NewPurchase {
                user_id,
                course_id,
                gateway_order_id: Some("order_old".to_string()),
                gateway_payment_id: format!("pay_old_{}", Uuid::new_v4().simple()),
                purchase_date: now - Duration::days(365 + days_ago),
                expiry_date: now - Duration::days(days_ago),
                payment_status: PaymentStatus::Success,
                source: GrantSource::Webhook,
            })
            .await
            .unwrap()
            .unwrap()
    }

    /// Sends a request and returns the status with the JSON body (`Null` if empty)
    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body).into_owned()))
        };
        (status, json)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.send(request("GET", uri, token, Body::empty(), None)).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.send(request(
            "POST",
            uri,
            token,
            Body::from(body.to_string()),
            Some("application/json"),
        ))
        .await
    }

    /// Posts raw webhook bytes with the given signature header
    pub async fn post_webhook(&self, raw: &[u8], header: &str, signature: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/v1/webhooks/payment")
            .header("content-type", "application/json")
            .header(header, signature)
            .body(Body::from(raw.to_vec()))
            .unwrap();
        self.send(request).await
    }
}

pub fn request(
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Body,
    content_type: Option<&str>,
) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    if let Some(content_type) = content_type {
        builder = builder.header("content-type", content_type);
    }
    builder.body(body).unwrap()
}

/// Confirmation body signed with the test key secret
pub fn signed_confirmation(order_id: &str, payment_id: &str, user_id: Uuid, course_id: Uuid) -> Value {
    json!({
        "gatewayOrderId": order_id,
        "gatewayPaymentId": payment_id,
        "gatewaySignature": sign(KEY_SECRET, payment_message(order_id, payment_id).as_bytes()),
        "courseId": course_id,
        "userId": user_id,
    })
}

/// `order.paid` webhook payload as the gateway would send it
pub fn order_paid_payload(payment_id: &str, order_id: &str, user_id: Uuid, course_id: Uuid) -> Vec<u8> {
    serde_json::to_vec(&json!({
        "entity": "event",
        "account_id": "acc_test",
        "event": "order.paid",
        "contains": ["payment", "order"],
        "payload": {
            "payment": { "entity": {
                "id": payment_id,
                "entity": "payment",
                "amount": 4999,
                "currency": "INR",
                "status": "captured",
                "order_id": order_id,
                "notes": { "userId": user_id, "courseId": course_id }
            }},
            "order": { "entity": {
                "id": order_id,
                "entity": "order",
                "status": "paid",
                "notes": { "userId": user_id, "courseId": course_id }
            }}
        },
        "created_at": 1700000000
    }))
    .unwrap()
}

pub fn webhook_signature(raw: &[u8]) -> String {
    sign(WEBHOOK_SECRET, raw)
}
