mod common;

use std::sync::Arc;

use anyhow::Result;
use futures::future::join_all;

use listing_bulk_api::quota::{MemoryQuotaStore, PlanLimits, PlanTier, QuotaError, QuotaGate};

fn gate(limits: PlanLimits) -> Arc<QuotaGate> {
    Arc::new(QuotaGate::new(Arc::new(MemoryQuotaStore::new()), limits))
}

#[tokio::test]
async fn concurrent_reserves_never_pass_the_free_cap() -> Result<()> {
    let gate = gate(PlanLimits::default());
    let user = common::user("user_concurrent", PlanTier::Free);

    let attempts = (0..25).map(|_| {
        let gate = gate.clone();
        let user = user.clone();
        tokio::spawn(async move { gate.reserve(&user, 1).await })
    });
    let results = join_all(attempts).await;

    let mut granted = 0;
    for result in results {
        match result? {
            Ok(_) => granted += 1,
            Err(QuotaError::Exceeded { limit, .. }) => assert_eq!(limit, 10),
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    let usage = gate.current_usage(&user).await?;
    assert_eq!(granted, 10);
    assert_eq!(usage.used, granted);
    assert_eq!(usage.remaining, 0);
    Ok(())
}

#[tokio::test]
async fn oversize_reservation_is_refused_without_consuming() -> Result<()> {
    let gate = gate(PlanLimits::default());
    let user = common::user("user_oversize", PlanTier::Free);

    gate.reserve(&user, 8).await?;
    let err = gate.reserve(&user, 3).await.unwrap_err();
    assert!(matches!(err, QuotaError::Exceeded { used: 8, limit: 10, requested: 3 }));

    // The refused request left the counter alone
    let reservation = gate.reserve(&user, 2).await?;
    assert_eq!(reservation.used, 10);
    assert_eq!(reservation.remaining, 0);
    Ok(())
}

#[tokio::test]
async fn paid_plans_use_the_soft_cap_and_report_unlimited() -> Result<()> {
    let gate = gate(PlanLimits { free_monthly: 10, paid_soft_cap: 20 });
    let user = common::user("user_pro", PlanTier::Pro);

    gate.reserve(&user, 15).await?;
    let usage = gate.current_usage(&user).await?;
    assert!(usage.unlimited);
    assert_eq!(usage.limit, 20);
    assert_eq!(usage.remaining, 5);
    assert!(gate.reserve(&user, 6).await.is_err());
    Ok(())
}

#[tokio::test]
async fn check_does_not_consume() -> Result<()> {
    let gate = gate(PlanLimits::default());
    let user = common::user("user_check", PlanTier::Free);

    gate.check(&user, 10).await?;
    gate.check(&user, 10).await?;
    assert!(matches!(
        gate.check(&user, 11).await,
        Err(QuotaError::Exceeded { requested: 11, .. })
    ));
    assert_eq!(gate.current_usage(&user).await?.used, 0);
    Ok(())
}

#[tokio::test]
async fn users_do_not_share_counters() -> Result<()> {
    let gate = gate(PlanLimits { free_monthly: 1, paid_soft_cap: 1000 });
    let alice = common::user("alice", PlanTier::Free);
    let bob = common::user("bob", PlanTier::Free);

    gate.reserve(&alice, 1).await?;
    assert!(gate.reserve(&alice, 1).await.is_err());
    assert!(gate.reserve(&bob, 1).await.is_ok());
    Ok(())
}
