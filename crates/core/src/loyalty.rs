use std::{
    collections::BTreeMap,
    sync::{Mutex, MutexGuard, PoisonError},
};

use serde::{Deserialize, Serialize};
use serde_json::Number;
use thiserror::Error;

use crate::types::{Tier, Zone};

fn default_region() -> String {
    Zone::Standard.as_str().to_string()
}

/// Cumulative loyalty balance for one customer.
///
/// `tier` is never set directly: every write goes through [`LoyaltyAccount::credit`],
/// which recomputes it from the new balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoyaltyAccount {
    points: u64,
    tier: Tier,
    region: String,
}

impl LoyaltyAccount {
    pub fn new(points: u64, region: impl Into<String>) -> Self {
        Self {
            points,
            tier: Tier::for_points(points),
            region: region.into(),
        }
    }

    pub fn points(&self) -> u64 {
        self.points
    }

    pub fn tier(&self) -> Tier {
        self.tier
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Adds points, records the latest region and recomputes the tier.
    pub fn credit(&mut self, earned: u64, region: &str) {
        self.points = self.points.saturating_add(earned);
        self.region = region.to_string();
        self.tier = Tier::for_points(self.points);
    }
}

/// Snapshot of an account before and after an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountChange {
    pub before: LoyaltyAccount,
    pub after: LoyaltyAccount,
}

/// In-memory customer id → account map.
#[derive(Debug, Default)]
pub struct LoyaltyLedger {
    accounts: Mutex<BTreeMap<String, LoyaltyAccount>>,
}

impl LoyaltyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger pre-populated with the demo customers.
    pub fn seeded() -> Self {
        let accounts = [
            ("customer1", LoyaltyAccount::new(1250, "West Coast")),
            ("customer2", LoyaltyAccount::new(750, "East Coast")),
            ("customer3", LoyaltyAccount::new(2500, "Central")),
        ]
        .into_iter()
        .map(|(id, account)| (id.to_string(), account))
        .collect();

        Self {
            accounts: Mutex::new(accounts),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, LoyaltyAccount>> {
        self.accounts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, customer_id: &str) -> Result<LoyaltyAccount, LoyaltyError> {
        self.lock()
            .get(customer_id)
            .cloned()
            .ok_or_else(|| LoyaltyError::CustomerNotFound(customer_id.to_string()))
    }

    /// All accounts ordered by customer id.
    pub fn list(&self) -> Vec<(String, LoyaltyAccount)> {
        self.lock()
            .iter()
            .map(|(id, account)| (id.clone(), account.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Applies `update` to the customer's account, creating an empty Bronze
    /// account in `region` first when none exists.
    pub fn upsert<F>(&self, customer_id: &str, region: &str, update: F) -> AccountChange
    where
        F: FnOnce(&mut LoyaltyAccount),
    {
        let mut accounts = self.lock();
        let account = accounts
            .entry(customer_id.to_string())
            .or_insert_with(|| LoyaltyAccount::new(0, region));
        let before = account.clone();
        update(account);
        AccountChange {
            before,
            after: account.clone(),
        }
    }
}

/// A purchase that earns loyalty points.
///
/// `purchase_amount` keeps the number as sent so the award echoes it unchanged.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PurchaseInput {
    pub customer_id: String,
    pub purchase_amount: Number,
    #[serde(default)]
    pub bonus_points: u64,
    #[serde(default = "default_region")]
    pub customer_region: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PointsBreakdown {
    pub base_points: u64,
    pub regional_bonus: u64,
    pub bonus_points: u64,
    pub total_earned: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountSummary {
    pub old_points: u64,
    pub new_points: u64,
    pub current_tier: Tier,
    pub region: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointsAward {
    pub customer_id: String,
    pub purchase_amount: Number,
    pub points_breakdown: PointsBreakdown,
    pub account_summary: AccountSummary,
    pub regional_multiplier: f64,
    pub message: String,
}

#[derive(Debug, Error, PartialEq)]
pub enum LoyaltyError {
    #[error("customer_id must not be empty")]
    MissingCustomer,
    #[error("purchase_amount must be a non-negative number (got {0})")]
    InvalidPurchaseAmount(Number),
    #[error("customer {0} not found")]
    CustomerNotFound(String),
}

/// Points earned before touching any account.
pub fn points_for(purchase_amount: f64, bonus_points: u64, region: Zone) -> PointsBreakdown {
    let base_points = purchase_amount.floor() as u64;
    let regional_bonus = base_points.saturating_mul(region.loyalty_bonus_percent()) / 100;
    let total_earned = base_points
        .saturating_add(regional_bonus)
        .saturating_add(bonus_points);

    PointsBreakdown {
        base_points,
        regional_bonus,
        bonus_points,
        total_earned,
    }
}

/// Credits a purchase to the customer's account, creating it on first use.
pub fn award_points(
    ledger: &LoyaltyLedger,
    input: PurchaseInput,
) -> Result<PointsAward, LoyaltyError> {
    if input.customer_id.trim().is_empty() {
        return Err(LoyaltyError::MissingCustomer);
    }
    let amount = input
        .purchase_amount
        .as_f64()
        .filter(|amount| amount.is_finite() && *amount >= 0.0)
        .ok_or_else(|| LoyaltyError::InvalidPurchaseAmount(input.purchase_amount.clone()))?;

    let zone = Zone::parse(&input.customer_region);
    let breakdown = points_for(amount, input.bonus_points, zone);

    let change = ledger.upsert(&input.customer_id, &input.customer_region, |account| {
        account.credit(breakdown.total_earned, &input.customer_region)
    });

    let summary = AccountSummary {
        old_points: change.before.points(),
        new_points: change.after.points(),
        current_tier: change.after.tier(),
        region: change.after.region().to_string(),
    };
    let message = format!(
        "Added {} points to {}. Account updated from {} to {} points ({} tier)",
        breakdown.total_earned,
        input.customer_id,
        summary.old_points,
        summary.new_points,
        summary.current_tier,
    );

    Ok(PointsAward {
        customer_id: input.customer_id,
        purchase_amount: input.purchase_amount,
        points_breakdown: breakdown,
        account_summary: summary,
        regional_multiplier: zone.loyalty_multiplier(),
        message,
    })
}
