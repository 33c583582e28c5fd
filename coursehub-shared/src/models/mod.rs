/// Database models for CourseHub
///
/// Each model carries its own SQL as inherent `async fn`s taking a `&PgPool`.
/// Services never call these directly; they go through the
/// [`crate::store::Store`] port, whose Postgres adapter delegates here.
///
/// # Models
///
/// - `user`: learner accounts
/// - `course`: catalog entries
/// - `lesson`: lessons owned by a course
/// - `order`: gateway orders issued for a purchase
/// - `purchase`: time-bounded entitlements
/// - `progress`: per-lesson completion

pub mod course;
pub mod lesson;
pub mod order;
pub mod progress;
pub mod purchase;
pub mod user;
