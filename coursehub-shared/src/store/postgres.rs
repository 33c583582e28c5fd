/// Postgres adapter for the [`Store`] port
///
/// Delegates to the model SQL in [`crate::models`] and bounds every call with
/// a deadline so that a stalled database surfaces as
/// [`StoreError::Timeout`] instead of hanging the request.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::Store;
use crate::db::pool::health_check;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    course::{Course, CreateCourse},
    lesson::{CreateLesson, Lesson},
    order::{IssuedOrder, NewOrder},
    progress::{Progress, ProgressUpdate},
    purchase::{NewPurchase, Purchase, PurchaseWithCourse},
    user::{CreateUser, User},
};

/// `Store` implementation backed by a `PgPool`
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    statement_timeout: Duration,
}

impl PgStore {
    /// Creates a store with the given per-call deadline
    pub fn new(pool: PgPool, statement_timeout: Duration) -> Self {
        Self {
            pool,
            statement_timeout,
        }
    }

    /// Underlying pool (for migrations and diagnostics)
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn bounded<T, F>(&self, operation: &'static str, fut: F) -> StoreResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        match tokio::time::timeout(self.statement_timeout, fut).await {
            Ok(result) => result.map_err(StoreError::from),
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = self.statement_timeout.as_millis() as u64,
                    "Store operation timed out"
                );
                Err(StoreError::Timeout)
            }
        }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        self.bounded("create_user", User::create(&self.pool, data)).await
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        self.bounded("find_user", User::find_by_id(&self.pool, id)).await
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.bounded("find_user_by_email", User::find_by_email(&self.pool, email))
            .await
    }

    async fn create_course(&self, data: CreateCourse) -> StoreResult<Course> {
        self.bounded("create_course", Course::create(&self.pool, data)).await
    }

    async fn find_course(&self, id: Uuid) -> StoreResult<Option<Course>> {
        self.bounded("find_course", Course::find_by_id(&self.pool, id)).await
    }

    async fn find_course_by_title(&self, title: &str) -> StoreResult<Option<Course>> {
        self.bounded("find_course_by_title", Course::find_by_title(&self.pool, title))
            .await
    }

    async fn list_courses(&self) -> StoreResult<Vec<Course>> {
        self.bounded("list_courses", Course::list(&self.pool)).await
    }

    async fn create_lesson(&self, data: CreateLesson) -> StoreResult<Lesson> {
        self.bounded("create_lesson", Lesson::create(&self.pool, data)).await
    }

    async fn list_lessons(&self, course_id: Uuid) -> StoreResult<Vec<Lesson>> {
        self.bounded("list_lessons", Lesson::list_by_course(&self.pool, course_id))
            .await
    }

    async fn find_lesson_in_course(
        &self,
        lesson_id: Uuid,
        course_id: Uuid,
    ) -> StoreResult<Option<Lesson>> {
        self.bounded(
            "find_lesson_in_course",
            Lesson::find_in_course(&self.pool, lesson_id, course_id),
        )
        .await
    }

    async fn insert_order(&self, data: NewOrder) -> StoreResult<IssuedOrder> {
        self.bounded("insert_order", IssuedOrder::create(&self.pool, data))
            .await
    }

    async fn find_order(&self, gateway_order_id: &str) -> StoreResult<Option<IssuedOrder>> {
        self.bounded(
            "find_order",
            IssuedOrder::find_by_gateway_id(&self.pool, gateway_order_id),
        )
        .await
    }

    async fn insert_purchase(&self, data: NewPurchase) -> StoreResult<Option<Purchase>> {
        self.bounded("insert_purchase", Purchase::insert_if_absent(&self.pool, data))
            .await
    }

    async fn find_purchase_by_payment(
        &self,
        gateway_payment_id: &str,
    ) -> StoreResult<Option<Purchase>> {
        self.bounded(
            "find_purchase_by_payment",
            Purchase::find_by_payment_id(&self.pool, gateway_payment_id),
        )
        .await
    }

    async fn find_latest_purchase(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> StoreResult<Option<Purchase>> {
        self.bounded(
            "find_latest_purchase",
            Purchase::find_latest(&self.pool, user_id, course_id),
        )
        .await
    }

    async fn list_purchases(&self, user_id: Uuid) -> StoreResult<Vec<PurchaseWithCourse>> {
        self.bounded("list_purchases", Purchase::list_by_user(&self.pool, user_id))
            .await
    }

    async fn upsert_progress(&self, data: ProgressUpdate) -> StoreResult<Progress> {
        self.bounded("upsert_progress", Progress::upsert(&self.pool, data)).await
    }

    async fn list_progress(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<Vec<Progress>> {
        self.bounded(
            "list_progress",
            Progress::list_for_course(&self.pool, user_id, course_id),
        )
        .await
    }

    async fn ping(&self) -> StoreResult<()> {
        self.bounded("ping", health_check(&self.pool)).await
    }
}
