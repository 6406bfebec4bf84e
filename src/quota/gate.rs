use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

use crate::auth::AuthUser;

use super::plan::{PlanLimits, PlanTier};
use super::store::{QuotaStore, QuotaStoreError};

#[derive(Debug, Error)]
pub enum QuotaError {
    #[error("Monthly quota exceeded: {used} of {limit} used, {requested} requested")]
    Exceeded { used: u32, limit: u32, requested: u32 },

    #[error("Quota reservation count must be at least 1")]
    InvalidCount,

    /// The business check could not be confirmed; callers must not proceed
    #[error(transparent)]
    Store(#[from] QuotaStoreError),
}

impl QuotaError {
    pub fn remaining(&self) -> Option<u32> {
        match self {
            QuotaError::Exceeded { used, limit, .. } => Some(limit.saturating_sub(*used)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct QuotaUsage {
    pub used: u32,
    pub limit: u32,
    pub remaining: u32,
    pub plan: PlanTier,
    pub month_key: String,
    pub unlimited: bool,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub used: u32,
    pub remaining: u32,
}

/// Answers "may this user consume N more generation units this month?"
pub struct QuotaGate {
    store: Arc<dyn QuotaStore>,
    limits: PlanLimits,
}

impl QuotaGate {
    pub fn new(store: Arc<dyn QuotaStore>, limits: PlanLimits) -> Self {
        Self { store, limits }
    }

    pub fn limits(&self) -> PlanLimits {
        self.limits
    }

    pub fn month_key(now: DateTime<Utc>) -> String {
        now.format("%Y-%m").to_string()
    }

    pub async fn current_usage(&self, user: &AuthUser) -> Result<QuotaUsage, QuotaError> {
        self.current_usage_at(user, Utc::now()).await
    }

    pub async fn current_usage_at(
        &self,
        user: &AuthUser,
        now: DateTime<Utc>,
    ) -> Result<QuotaUsage, QuotaError> {
        let month_key = Self::month_key(now);
        let used = self.store.used(&user.user_id, &month_key).await?;
        let limit = self.limits.cap_for(user.plan);

        Ok(QuotaUsage {
            used,
            limit,
            remaining: limit.saturating_sub(used),
            plan: user.plan,
            month_key,
            unlimited: user.plan.is_unlimited(),
        })
    }

    /// Non-consuming check used when a whole batch is accepted or rejected up front
    pub async fn check(&self, user: &AuthUser, count: u32) -> Result<QuotaUsage, QuotaError> {
        let usage = self.current_usage(user).await?;
        if count > usage.remaining {
            return Err(QuotaError::Exceeded {
                used: usage.used,
                limit: usage.limit,
                requested: count,
            });
        }
        Ok(usage)
    }

    pub async fn reserve(&self, user: &AuthUser, count: u32) -> Result<Reservation, QuotaError> {
        self.reserve_at(user, count, Utc::now()).await
    }

    pub async fn reserve_at(
        &self,
        user: &AuthUser,
        count: u32,
        now: DateTime<Utc>,
    ) -> Result<Reservation, QuotaError> {
        if count == 0 {
            return Err(QuotaError::InvalidCount);
        }

        let month_key = Self::month_key(now);
        let cap = self.limits.cap_for(user.plan);

        match self
            .store
            .try_increment(&user.user_id, &month_key, user.plan, count, cap)
            .await?
        {
            Some(used) => {
                debug!("Reserved {} unit(s) for {} in {}: {}/{}", count, user.user_id, month_key, used, cap);
                Ok(Reservation { used, remaining: cap.saturating_sub(used) })
            }
            None => {
                // Report the balance as of the refusal
                let used = self.store.used(&user.user_id, &month_key).await?;
                warn!("Quota exceeded for {} in {}: {}/{} used, {} requested", user.user_id, month_key, used, cap, count);
                Err(QuotaError::Exceeded { used, limit: cap, requested: count })
            }
        }
    }
}
