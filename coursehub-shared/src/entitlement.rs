/// Entitlement grants and lookups
///
/// A grant records that a user may access a course until an expiry date.
/// Grants are idempotent per `(user, course, gateway payment id)`: the client
/// confirmation path and the webhook path may both fire for one payment, in
/// either order or at the same time, and exactly one purchase row results.
///
/// Idempotency is enforced by the store's unique payment key. The service
/// first looks for an existing row; if two writers still race past that check,
/// the loser's insert is swallowed by the constraint and it re-reads the
/// winner's row.
///
/// A payment id is bound to the first `(user, course)` it was granted for. A
/// later grant naming the same payment for anyone or anything else is refused.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, StoreError};
use crate::models::purchase::{GrantSource, NewPurchase, PaymentStatus, Purchase};
use crate::store::Store;

/// Default access window for a purchase
pub const DEFAULT_ACCESS_DAYS: i64 = 365;

/// How long a purchase grants access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntitlementPolicy {
    access_duration: Duration,
}

impl EntitlementPolicy {
    pub fn from_days(days: i64) -> Self {
        Self {
            access_duration: Duration::days(days),
        }
    }

    pub fn access_duration(&self) -> Duration {
        self.access_duration
    }

    pub fn expiry_from(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        start + self.access_duration
    }
}

impl Default for EntitlementPolicy {
    fn default() -> Self {
        Self::from_days(DEFAULT_ACCESS_DAYS)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrantRequest {
    pub user_id: Uuid,
    pub course_id: Uuid,
    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: String,
    pub source: GrantSource,
}

/// Result of a grant; `created` is false when the payment was already recorded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grant {
    pub purchase: Purchase,
    pub created: bool,
}

/// A user's standing for one course
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessStatus {
    Active(Purchase),
    Expired(Purchase),
    NotPurchased,
}

impl AccessStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, AccessStatus::Active(_))
    }

    /// Expiry of the active purchase, if any
    pub fn active_until(&self) -> Option<DateTime<Utc>> {
        match self {
            AccessStatus::Active(p) => Some(p.expiry_date),
            _ => None,
        }
    }
}

/// Row of a user's purchase history
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseSummary {
    pub id: Uuid,
    pub course_id: Uuid,
    pub course_title: String,
    pub purchase_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub active: bool,
}

pub struct EntitlementService {
    store: Arc<dyn Store>,
    policy: EntitlementPolicy,
}

impl EntitlementService {
    pub fn new(store: Arc<dyn Store>, policy: EntitlementPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> EntitlementPolicy {
        self.policy
    }

    /// Grants access for a verified payment
    ///
    /// # Errors
    ///
    /// - `Validation` if the payment id is empty
    /// - `NotFound` if the course or the user does not exist
    /// - `Verification` if the payment already backs a purchase for another
    ///   user or course
    pub async fn grant(&self, request: GrantRequest) -> CoreResult<Grant> {
        if request.gateway_payment_id.trim().is_empty() {
            return Err(CoreError::invalid("gatewayPaymentId", "is required"));
        }

        if self.store.find_course(request.course_id).await?.is_none() {
            return Err(CoreError::NotFound("Course not found".to_string()));
        }
        if self.store.find_user(request.user_id).await?.is_none() {
            return Err(CoreError::NotFound("User not found".to_string()));
        }

        if let Some(existing) = self.existing(&request).await? {
            debug!(
                purchase_id = %existing.id,
                source = request.source.as_str(),
                "Payment already granted"
            );
            return Ok(Grant {
                purchase: existing,
                created: false,
            });
        }

        let now = Utc::now();
        let inserted = self
            .store
            .insert_purchase(NewPurchase {
                user_id: request.user_id,
                course_id: request.course_id,
                gateway_order_id: request.gateway_order_id.clone(),
                gateway_payment_id: request.gateway_payment_id.clone(),
                purchase_date: now,
                expiry_date: self.policy.expiry_from(now),
                payment_status: PaymentStatus::Success,
                source: request.source,
            })
            .await?;

        match inserted {
            Some(purchase) => {
                info!(
                    purchase_id = %purchase.id,
                    user_id = %purchase.user_id,
                    course_id = %purchase.course_id,
                    source = request.source.as_str(),
                    expiry_date = %purchase.expiry_date,
                    "Entitlement granted"
                );
                Ok(Grant {
                    purchase,
                    created: true,
                })
            }
            None => {
                // Lost the race to a concurrent writer for the same payment
                let winner = self.existing(&request).await?.ok_or_else(|| {
                    CoreError::Store(StoreError::Backend(
                        "purchase missing after payment key conflict".to_string(),
                    ))
                })?;
                debug!(purchase_id = %winner.id, "Concurrent grant resolved to existing purchase");
                Ok(Grant {
                    purchase: winner,
                    created: false,
                })
            }
        }
    }

    /// The purchase already recorded for this payment, if it is the same grant
    async fn existing(&self, request: &GrantRequest) -> CoreResult<Option<Purchase>> {
        let Some(purchase) = self
            .store
            .find_purchase_by_payment(&request.gateway_payment_id)
            .await?
        else {
            return Ok(None);
        };

        if purchase.user_id != request.user_id || purchase.course_id != request.course_id {
            warn!(
                purchase_id = %purchase.id,
                source = request.source.as_str(),
                "Grant rejected: payment already backs another purchase"
            );
            return Err(CoreError::Verification(
                "Payment already applied to another purchase".to_string(),
            ));
        }

        Ok(Some(purchase))
    }

    /// Classifies the user's latest-expiring purchase against `now`
    pub async fn access_status(
        &self,
        user_id: Uuid,
        course_id: Uuid,
        now: DateTime<Utc>,
    ) -> CoreResult<AccessStatus> {
        Ok(
            match self.store.find_latest_purchase(user_id, course_id).await? {
                Some(p) if p.is_active_at(now) => AccessStatus::Active(p),
                Some(p) => AccessStatus::Expired(p),
                None => AccessStatus::NotPurchased,
            },
        )
    }

    /// Purchase history, newest first
    pub async fn list_purchases(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> CoreResult<Vec<PurchaseSummary>> {
        let rows = self.store.list_purchases(user_id).await?;

        Ok(rows
            .into_iter()
            .map(|row| PurchaseSummary {
                id: row.purchase.id,
                course_id: row.purchase.course_id,
                course_title: row.course_title,
                purchase_date: row.purchase.purchase_date,
                expiry_date: row.purchase.expiry_date,
                payment_status: row.purchase.payment_status,
                active: row.purchase.is_active_at(now),
            })
            .collect())
    }
}
