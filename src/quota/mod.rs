pub mod gate;
pub mod plan;
pub mod store;

pub use gate::{QuotaError, QuotaGate, QuotaUsage, Reservation};
pub use plan::{PlanLimits, PlanTier};
pub use store::{MemoryQuotaStore, QuotaStore, QuotaStoreError};
