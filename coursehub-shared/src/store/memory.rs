/// In-memory adapter for the [`Store`] port
///
/// Holds everything behind one `RwLock`, which makes each trait call atomic
/// the same way a single SQL statement is. Uniqueness rules mirror the Postgres
/// schema: case-insensitive user email, order id, purchase payment id, progress
/// key.
///
/// # Example
///
/// ```
/// use coursehub_shared::store::{memory::MemoryStore, Store};
/// use coursehub_shared::models::course::CreateCourse;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryStore::new();
/// let course = store.create_course(CreateCourse {
///     title: "Rust for Payments".to_string(),
///     description: "Idempotency in practice".to_string(),
///     price: 4999,
/// }).await?;
/// assert_eq!(store.find_course(course.id).await?, Some(course));
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::Store;
use crate::error::{StoreError, StoreResult};
use crate::models::{
    course::{Course, CreateCourse},
    lesson::{CreateLesson, Lesson},
    order::{IssuedOrder, NewOrder},
    progress::{Progress, ProgressUpdate},
    purchase::{NewPurchase, PaymentStatus, Purchase, PurchaseWithCourse},
    user::{CreateUser, User},
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    courses: HashMap<Uuid, Course>,
    lessons: HashMap<Uuid, Lesson>,
    orders: HashMap<String, IssuedOrder>,
    purchases: Vec<Purchase>,
    progress: HashMap<(Uuid, Uuid, Uuid), Progress>,
}

/// `Store` implementation over process memory
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of purchase rows, regardless of owner
    pub async fn purchase_count(&self) -> usize {
        self.tables.read().await.purchases.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;
        let taken = tables
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&data.email));
        if taken {
            return Err(StoreError::Conflict("users_email_key".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            email: data.email,
            password_hash: data.password_hash,
            name: data.name,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .tables
            .read()
            .await
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn create_course(&self, data: CreateCourse) -> StoreResult<Course> {
        let course = Course {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            price: data.price,
            created_at: Utc::now(),
        };
        self.tables
            .write()
            .await
            .courses
            .insert(course.id, course.clone());
        Ok(course)
    }

    async fn find_course(&self, id: Uuid) -> StoreResult<Option<Course>> {
        Ok(self.tables.read().await.courses.get(&id).cloned())
    }

    async fn find_course_by_title(&self, title: &str) -> StoreResult<Option<Course>> {
        Ok(self
            .tables
            .read()
            .await
            .courses
            .values()
            .filter(|c| c.title == title)
            .min_by_key(|c| c.created_at)
            .cloned())
    }

    async fn list_courses(&self) -> StoreResult<Vec<Course>> {
        let mut courses: Vec<Course> = self.tables.read().await.courses.values().cloned().collect();
        courses.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(courses)
    }

    async fn create_lesson(&self, data: CreateLesson) -> StoreResult<Lesson> {
        let mut tables = self.tables.write().await;
        if !tables.courses.contains_key(&data.course_id) {
            return Err(StoreError::Conflict("lessons_course_id_fkey".to_string()));
        }

        let lesson = Lesson {
            id: Uuid::new_v4(),
            course_id: data.course_id,
            title: data.title,
            video_url: data.video_url,
            notes_url: data.notes_url,
            created_at: Utc::now(),
        };
        tables.lessons.insert(lesson.id, lesson.clone());
        Ok(lesson)
    }

    async fn list_lessons(&self, course_id: Uuid) -> StoreResult<Vec<Lesson>> {
        let mut lessons: Vec<Lesson> = self
            .tables
            .read()
            .await
            .lessons
            .values()
            .filter(|l| l.course_id == course_id)
            .cloned()
            .collect();
        lessons.sort_by_key(|l| l.created_at);
        Ok(lessons)
    }

    async fn find_lesson_in_course(
        &self,
        lesson_id: Uuid,
        course_id: Uuid,
    ) -> StoreResult<Option<Lesson>> {
        Ok(self
            .tables
            .read()
            .await
            .lessons
            .get(&lesson_id)
            .filter(|l| l.course_id == course_id)
            .cloned())
    }

    async fn insert_order(&self, data: NewOrder) -> StoreResult<IssuedOrder> {
        let mut tables = self.tables.write().await;
        if tables.orders.contains_key(&data.gateway_order_id) {
            return Err(StoreError::Conflict("orders_pkey".to_string()));
        }
        if !tables.users.contains_key(&data.user_id) {
            return Err(StoreError::Conflict("orders_user_id_fkey".to_string()));
        }
        if !tables.courses.contains_key(&data.course_id) {
            return Err(StoreError::Conflict("orders_course_id_fkey".to_string()));
        }

        let order = IssuedOrder {
            gateway_order_id: data.gateway_order_id,
            user_id: data.user_id,
            course_id: data.course_id,
            amount: data.amount,
            currency: data.currency,
            created_at: Utc::now(),
        };
        tables
            .orders
            .insert(order.gateway_order_id.clone(), order.clone());
        Ok(order)
    }

    async fn find_order(&self, gateway_order_id: &str) -> StoreResult<Option<IssuedOrder>> {
        Ok(self.tables.read().await.orders.get(gateway_order_id).cloned())
    }

    async fn insert_purchase(&self, data: NewPurchase) -> StoreResult<Option<Purchase>> {
        let mut tables = self.tables.write().await;
        let duplicate = tables
            .purchases
            .iter()
            .any(|p| p.gateway_payment_id == data.gateway_payment_id);
        if duplicate {
            return Ok(None);
        }

        let purchase = Purchase {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            course_id: data.course_id,
            gateway_order_id: data.gateway_order_id,
            gateway_payment_id: data.gateway_payment_id,
            purchase_date: data.purchase_date,
            expiry_date: data.expiry_date,
            payment_status: data.payment_status,
            source: data.source,
            created_at: Utc::now(),
        };
        tables.purchases.push(purchase.clone());
        Ok(Some(purchase))
    }

    async fn find_purchase_by_payment(
        &self,
        gateway_payment_id: &str,
    ) -> StoreResult<Option<Purchase>> {
        Ok(self
            .tables
            .read()
            .await
            .purchases
            .iter()
            .find(|p| p.gateway_payment_id == gateway_payment_id)
            .cloned())
    }

    async fn find_latest_purchase(
        &self,
        user_id: Uuid,
        course_id: Uuid,
    ) -> StoreResult<Option<Purchase>> {
        Ok(self
            .tables
            .read()
            .await
            .purchases
            .iter()
            .filter(|p| {
                p.user_id == user_id
                    && p.course_id == course_id
                    && p.payment_status == PaymentStatus::Success
            })
            .max_by_key(|p| p.expiry_date)
            .cloned())
    }

    async fn list_purchases(&self, user_id: Uuid) -> StoreResult<Vec<PurchaseWithCourse>> {
        let tables = self.tables.read().await;
        let mut rows: Vec<PurchaseWithCourse> = tables
            .purchases
            .iter()
            .filter(|p| p.user_id == user_id)
            .filter_map(|p| {
                tables.courses.get(&p.course_id).map(|c| PurchaseWithCourse {
                    purchase: p.clone(),
                    course_title: c.title.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| b.purchase.purchase_date.cmp(&a.purchase.purchase_date));
        Ok(rows)
    }

    async fn upsert_progress(&self, data: ProgressUpdate) -> StoreResult<Progress> {
        let record = Progress {
            user_id: data.user_id,
            course_id: data.course_id,
            lesson_id: data.lesson_id,
            completed: data.completed,
            updated_at: Utc::now(),
        };
        self.tables.write().await.progress.insert(
            (data.user_id, data.course_id, data.lesson_id),
            record.clone(),
        );
        Ok(record)
    }

    async fn list_progress(&self, user_id: Uuid, course_id: Uuid) -> StoreResult<Vec<Progress>> {
        Ok(self
            .tables
            .read()
            .await
            .progress
            .values()
            .filter(|p| p.user_id == user_id && p.course_id == course_id)
            .cloned()
            .collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::purchase::GrantSource;
    use chrono::Duration;

    fn new_purchase(user_id: Uuid, course_id: Uuid, payment_id: &str) -> NewPurchase {
        let now = Utc::now();
        NewPurchase {
            user_id,
            course_id,
            gateway_order_id: None,
            gateway_payment_id: payment_id.to_string(),
            purchase_date: now,
            expiry_date: now + Duration::days(30),
            payment_status: PaymentStatus::Success,
            source: GrantSource::Webhook,
        }
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = MemoryStore::new();
        let data = CreateUser {
            email: "a@example.com".to_string(),
            password_hash: "h".to_string(),
            name: "A".to_string(),
        };
        store.create_user(data.clone()).await.unwrap();

        let again = CreateUser {
            email: "A@EXAMPLE.com".to_string(),
            ..data
        };
        let err = store.create_user(again).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_purchase_payment_key_is_unique() {
        let store = MemoryStore::new();
        let (user, course) = (Uuid::new_v4(), Uuid::new_v4());

        assert!(store
            .insert_purchase(new_purchase(user, course, "pay_1"))
            .await
            .unwrap()
            .is_some());
        assert!(store
            .insert_purchase(new_purchase(user, course, "pay_1"))
            .await
            .unwrap()
            .is_none());
        assert!(store
            .insert_purchase(new_purchase(user, course, "pay_2"))
            .await
            .unwrap()
            .is_some());
        assert_eq!(store.purchase_count().await, 2);
    }

    #[tokio::test]
    async fn test_payment_id_backs_one_purchase() {
        let store = MemoryStore::new();
        let (user, course) = (Uuid::new_v4(), Uuid::new_v4());

        store
            .insert_purchase(new_purchase(user, course, "pay_1"))
            .await
            .unwrap();
        let other_user = store
            .insert_purchase(new_purchase(Uuid::new_v4(), course, "pay_1"))
            .await
            .unwrap();
        let other_course = store
            .insert_purchase(new_purchase(user, Uuid::new_v4(), "pay_1"))
            .await
            .unwrap();

        assert!(other_user.is_none());
        assert!(other_course.is_none());
        let owner = store.find_purchase_by_payment("pay_1").await.unwrap().unwrap();
        assert_eq!((owner.user_id, owner.course_id), (user, course));
    }

    #[tokio::test]
    async fn test_order_requires_user_and_course() {
        let store = MemoryStore::new();
        let user = store
            .create_user(CreateUser {
                email: "buyer@example.com".to_string(),
                password_hash: "h".to_string(),
                name: "Buyer".to_string(),
            })
            .await
            .unwrap();
        let course = store
            .create_course(CreateCourse {
                title: "Orders".to_string(),
                description: "Issued orders".to_string(),
                price: 100,
            })
            .await
            .unwrap();
        let order = |user_id, course_id| NewOrder {
            gateway_order_id: "order_1".to_string(),
            user_id,
            course_id,
            amount: 100,
            currency: "INR".to_string(),
        };

        let err = store.insert_order(order(Uuid::new_v4(), course.id)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        store.insert_order(order(user.id, course.id)).await.unwrap();
        let err = store.insert_order(order(user.id, course.id)).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let found = store.find_order("order_1").await.unwrap().unwrap();
        assert_eq!((found.user_id, found.course_id), (user.id, course.id));
        assert!(store.find_order("order_2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_latest_purchase_has_latest_expiry() {
        let store = MemoryStore::new();
        let (user, course) = (Uuid::new_v4(), Uuid::new_v4());

        let mut short = new_purchase(user, course, "pay_short");
        short.expiry_date = Utc::now() + Duration::days(1);
        store.insert_purchase(new_purchase(user, course, "pay_long")).await.unwrap();
        store.insert_purchase(short).await.unwrap();

        let latest = store.find_latest_purchase(user, course).await.unwrap().unwrap();
        assert_eq!(latest.gateway_payment_id, "pay_long");
    }

    #[tokio::test]
    async fn test_lesson_requires_course() {
        let store = MemoryStore::new();
        let err = store
            .create_lesson(CreateLesson {
                course_id: Uuid::new_v4(),
                title: "Intro".to_string(),
                video_url: "https://cdn.example.com/v.mp4".to_string(),
                notes_url: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_progress_upsert_overwrites() {
        let store = MemoryStore::new();
        let key = ProgressUpdate {
            user_id: Uuid::new_v4(),
            course_id: Uuid::new_v4(),
            lesson_id: Uuid::new_v4(),
            completed: true,
        };
        store.upsert_progress(key.clone()).await.unwrap();
        store
            .upsert_progress(ProgressUpdate {
                completed: false,
                ..key.clone()
            })
            .await
            .unwrap();

        let rows = store.list_progress(key.user_id, key.course_id).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert!(!rows[0].completed);
    }
}
