use async_trait::async_trait;
use sqlx::PgPool;

use crate::quota::{PlanTier, QuotaStore, QuotaStoreError};

/// Quota counters in `quota_usage`, one row per user per month
#[derive(Clone)]
pub struct PgQuotaStore {
    pool: PgPool,
}

impl PgQuotaStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_db(n: u32) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

#[async_trait]
impl QuotaStore for PgQuotaStore {
    async fn used(&self, user_id: &str, month_key: &str) -> Result<u32, QuotaStoreError> {
        let used: Option<i32> = sqlx::query_scalar(
            "SELECT used_count FROM quota_usage WHERE user_id = $1 AND month_key = $2",
        )
        .bind(user_id)
        .bind(month_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(used.unwrap_or(0).max(0) as u32)
    }

    async fn try_increment(
        &self,
        user_id: &str,
        month_key: &str,
        plan: PlanTier,
        count: u32,
        cap: u32,
    ) -> Result<Option<u32>, QuotaStoreError> {
        // The insert branch has no WHERE clause, so refuse oversize requests here
        if count > cap {
            return Ok(None);
        }

        // Single conditional upsert: the row lock taken by ON CONFLICT serializes
        // concurrent reservations, and the WHERE clause refuses any that would pass the cap
        let used: Option<i32> = sqlx::query_scalar(
            r#"
            INSERT INTO quota_usage (user_id, month_key, used_count, plan_tier, updated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (user_id, month_key) DO UPDATE
                SET used_count = quota_usage.used_count + EXCLUDED.used_count,
                    plan_tier  = EXCLUDED.plan_tier,
                    updated_at = now()
                WHERE quota_usage.used_count + EXCLUDED.used_count <= $5
            RETURNING used_count
            "#,
        )
        .bind(user_id)
        .bind(month_key)
        .bind(to_db(count))
        .bind(plan.as_str())
        .bind(to_db(cap))
        .fetch_optional(&self.pool)
        .await?;

        Ok(used.map(|n| n.max(0) as u32))
    }
}
