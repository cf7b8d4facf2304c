//! Domain types shared across the auction, budget, billing, and
//! attribution crates. All monetary amounts are integer cents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How a campaign is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingModel {
    Cpm,
    Cpc,
}

/// Campaign lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    Draft,
    Active,
    Paused,
    Completed,
    Cancelled,
}

/// Why a campaign was automatically paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PauseReason {
    DailyBudgetExhausted,
    TotalBudgetExhausted,
}

/// Targeting filter attached to a campaign. Every dimension is
/// optional; an empty vector counts as not targeted on that dimension.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Targeting {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub cities: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    /// 0 = Monday .. 6 = Sunday.
    #[serde(default)]
    pub days_of_week: Vec<u8>,
    /// 0..=23.
    #[serde(default)]
    pub hours_of_day: Vec<u8>,
}

/// An advertiser's ad unit. Owned by one establishment.
///
/// `spent_cents` and `daily_spent_cents` only grow within a billing
/// day; the budget daily pass resets `daily_spent_cents` to zero
/// exactly once per day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    pub establishment_id: Uuid,
    pub name: String,
    pub billing_model: BillingModel,
    pub status: CampaignStatus,
    pub pause_reason: Option<PauseReason>,
    /// Lifetime budget. `None` = unlimited.
    pub budget_cents: Option<i64>,
    /// Per-calendar-day budget. `None` = unlimited.
    pub daily_budget_cents: Option<i64>,
    pub spent_cents: i64,
    pub daily_spent_cents: i64,
    /// Price per 1000 impressions.
    pub cpm_cents: i64,
    /// Auction multiplier, 0.5..=2.0. Recomputed by the quality pass.
    pub quality_score: f64,
    /// Trailing click-through rate, 0..=1, rounded to 4 decimals.
    pub ctr: f64,
    /// Cached conversion count; the quality pass reconciles it from
    /// the event store, so a missed increment is not a correctness bug.
    pub conversions: u64,
    pub targeting: Option<Targeting>,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// Whether `now` falls inside the campaign's scheduled window.
    pub fn window_active(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && self.ends_at.map_or(true, |end| now <= end)
    }

    /// Whether lifetime spend is still under the total budget.
    pub fn has_total_headroom(&self) -> bool {
        self.budget_cents.map_or(true, |b| self.spent_cents < b)
    }
}

/// One ad render event, written by ad delivery and consumed by the
/// impression biller. Once `billed` flips to true it never flips back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Impression {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub billed: bool,
}

/// One user click event. `is_valid` is decided upstream by fraud
/// filtering; this core only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Click {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub user_id: Uuid,
    pub is_valid: bool,
    pub created_at: DateTime<Utc>,
}

/// The action class a conversion credits to a click.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionType {
    Reservation,
    PackPurchase,
    PageView,
    Contact,
}

/// A later user action attributed back to a click. Written exactly
/// once per qualifying action; never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversion {
    pub id: Uuid,
    pub click_id: Uuid,
    pub campaign_id: Uuid,
    pub user_id: Uuid,
    pub conversion_type: ConversionType,
    pub conversion_value_cents: Option<i64>,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    pub attribution_window_hours: i64,
    pub click_to_conversion_seconds: i64,
    pub created_at: DateTime<Utc>,
}

/// Classification of a wallet ledger entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryType {
    Credit,
    AdSpend,
    Adjustment,
}

/// Append-only debit/credit record on an establishment's ad wallet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub establishment_id: Uuid,
    /// Positive for credits, negative for debits.
    pub amount_cents: i64,
    pub entry_type: LedgerEntryType,
    pub reference_id: Option<Uuid>,
    pub description: String,
    pub created_at: DateTime<Utc>,
}
