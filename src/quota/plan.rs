use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::config::QuotaConfig;

/// Subscription tier as asserted by the identity provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Pro,
    Business,
    Agency,
}

impl PlanTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Pro => "pro",
            PlanTier::Business => "business",
            PlanTier::Agency => "agency",
        }
    }

    /// Paid tiers are advertised as unlimited
    pub fn is_unlimited(&self) -> bool {
        !matches!(self, PlanTier::Free)
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "free" => Ok(PlanTier::Free),
            "pro" => Ok(PlanTier::Pro),
            "business" => Ok(PlanTier::Business),
            "agency" => Ok(PlanTier::Agency),
            other => Err(format!("unknown plan tier '{}'", other)),
        }
    }
}

/// Monthly caps per tier
#[derive(Debug, Clone, Copy)]
pub struct PlanLimits {
    pub free_monthly: u32,
    pub paid_soft_cap: u32,
}

impl PlanLimits {
    pub fn cap_for(&self, plan: PlanTier) -> u32 {
        if plan.is_unlimited() {
            self.paid_soft_cap
        } else {
            self.free_monthly
        }
    }
}

impl Default for PlanLimits {
    fn default() -> Self {
        Self {
            free_monthly: 10,
            paid_soft_cap: 1000,
        }
    }
}

impl From<&QuotaConfig> for PlanLimits {
    fn from(config: &QuotaConfig) -> Self {
        Self {
            free_monthly: config.free_monthly_limit,
            paid_soft_cap: config.paid_monthly_soft_cap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tiers_case_insensitively() {
        assert_eq!("Agency".parse::<PlanTier>().unwrap(), PlanTier::Agency);
        assert_eq!(" pro ".parse::<PlanTier>().unwrap(), PlanTier::Pro);
        assert!("enterprise".parse::<PlanTier>().is_err());
    }

    #[test]
    fn paid_tiers_use_soft_cap() {
        let limits = PlanLimits { free_monthly: 5, paid_soft_cap: 1000 };
        assert_eq!(limits.cap_for(PlanTier::Free), 5);
        assert_eq!(limits.cap_for(PlanTier::Business), 1000);
    }
}
