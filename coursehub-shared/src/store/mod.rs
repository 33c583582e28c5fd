/// Persistence port
///
/// Services depend on the [`Store`] trait, never on a concrete database. Two
/// adapters are provided:
///
/// - [`postgres::PgStore`]: production adapter over `sqlx`, every call bounded
///   by a statement deadline
/// - [`memory::MemoryStore`]: in-process adapter for tests and local runs
///
/// Both enforce the same uniqueness rules (user email, order id, purchase
/// payment id and payment key, progress key) so the services behave
/// identically on either.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::models::{
    course::{Course, CreateCourse},
    lesson::{CreateLesson, Lesson},
    order::{IssuedOrder, NewOrder},
    progress::{Progress, ProgressUpdate},
    purchase::{NewPurchase, Purchase, PurchaseWithCourse},
    user::{CreateUser, User},
};

pub mod memory;
pub mod postgres;

#[async_trait]
pub trait Store: Send + Sync {
    // --- Users ---
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    // --- Catalog ---
    async fn create_course(&self, data: CreateCourse) -> StoreResult<Course>;

    async fn find_course(&self, id: Uuid) -> StoreResult<Option<Course>>;

    async fn find_course_by_title(&self, title: &str) -> StoreResult<Option<Course>>;

    async fn list_courses(&self) -> StoreResult<Vec<Course>>;

    async fn create_lesson(&self, data: CreateLesson) -> StoreResult<Lesson>;

    async fn list_lessons(&self, course_id: Uuid) -> StoreResult<Vec<Lesson>>;

    /// Returns the lesson only when it belongs to `course_id`
    async fn find_lesson_in_course(
        &self,
        lesson_id: Uuid,
        course_id: Uuid,
    ) -> StoreResult<Option<Lesson>>;

    // --- Orders ---
    async fn insert_order(&self, data: NewOrder) -> StoreResult<IssuedOrder>;

    async fn find_order(&self, gateway_order_id: &str) -> StoreResult<Option<IssuedOrder>>;

    // --- Entitlements ---
    /// Inserts unless the payment id is already recorded; `None` means a conflict
    async fn insert_purchase(&self, data: NewPurchase) -> StoreResult<Option<Purchase>>;

    /// The purchase backed by `gateway_payment_id`, for any user or course
    async fn find_purchase_by_payment(
        &self,
        gateway_payment_id: &str,
    ) -> StoreResult<Option<Purchase>>;

    /// The successful purchase with the latest expiry, if any
    async fn find_latest_purchase(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> StoreResult<Option<Purchase>>;

    async fn list_purchases(&self, user_id: Uuid) -> StoreResult<Vec<PurchaseWithCourse>>;

    // --- Progress ---
    async fn upsert_progress(&self, data: ProgressUpdate) -> StoreResult<Progress>;

    async fn list_progress(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<Vec<Progress>>;

    /// Liveness probe used by the health endpoint
    async fn ping(&self) -> StoreResult<()>;
}
