//! Static plan catalog.
//!
//! The catalog is the source of truth for limits at assignment time only:
//! plan limits are denormalized into the subscription row when a plan is
//! assigned, and entitlement checks always compare against the stored row.

use serde::Serialize;

pub const COMPANY_FREE: &str = "COMPANY_FREE";
pub const COMPANY_STARTER: &str = "COMPANY_STARTER";
pub const COMPANY_PRO: &str = "COMPANY_PRO";

/// A subscription tier with its numeric limits and display features.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub id: &'static str,
    pub name: &'static str,
    pub max_jobs: i32,
    pub max_applications_per_job: i32,
    pub max_ai_analyses: i32,
    pub price_cents: i32,
    pub features: &'static [&'static str],
}

pub const PLAN_CATALOG: &[Plan] = &[
    Plan {
        id: COMPANY_FREE,
        name: "Free",
        max_jobs: 5,
        max_applications_per_job: 50,
        max_ai_analyses: 10,
        price_cents: 0,
        features: &["5 active job offers", "50 applications per offer", "10 AI analyses / month"],
    },
    Plan {
        id: COMPANY_STARTER,
        name: "Starter",
        max_jobs: 15,
        max_applications_per_job: 200,
        max_ai_analyses: 50,
        price_cents: 4_900,
        features: &[
            "15 active job offers",
            "200 applications per offer",
            "50 AI analyses / month",
            "Email support",
        ],
    },
    Plan {
        id: COMPANY_PRO,
        name: "Pro",
        max_jobs: 50,
        max_applications_per_job: 1_000,
        max_ai_analyses: 250,
        price_cents: 14_900,
        features: &[
            "50 active job offers",
            "1000 applications per offer",
            "250 AI analyses / month",
            "Priority support",
        ],
    },
];

/// Looks up a plan by identifier (e.g. `COMPANY_FREE`).
pub fn plan_by_id(id: &str) -> Option<&'static Plan> {
    PLAN_CATALOG.iter().find(|p| p.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_plan_allows_five_jobs() {
        let plan = plan_by_id(COMPANY_FREE).unwrap();
        assert_eq!(plan.max_jobs, 5);
        assert_eq!(plan.price_cents, 0);
    }

    #[test]
    fn unknown_plan_is_none() {
        assert!(plan_by_id("COMPANY_PLATINUM").is_none());
    }

    #[test]
    fn catalog_ids_are_unique() {
        let mut ids: Vec<_> = PLAN_CATALOG.iter().map(|p| p.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), PLAN_CATALOG.len());
    }
}
