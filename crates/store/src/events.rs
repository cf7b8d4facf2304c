//! Event store — impressions, clicks, and conversions keyed by
//! campaign. The passes only ever read counts/rows filtered by
//! campaign and time range, write conversion rows, and flip billed
//! flags; nothing here is ever deleted.

use adserve_core::types::{Click, Conversion, Impression};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

/// Thread-safe in-memory event store.
pub struct EventStore {
    /// campaign_id -> impressions
    impressions: DashMap<Uuid, Vec<Impression>>,
    /// campaign_id -> clicks
    clicks: DashMap<Uuid, Vec<Click>>,
    /// campaign_id -> conversions
    conversions: DashMap<Uuid, Vec<Conversion>>,
}

impl EventStore {
    pub fn new() -> Self {
        Self {
            impressions: DashMap::new(),
            clicks: DashMap::new(),
            conversions: DashMap::new(),
        }
    }

    // ─── Writes ────────────────────────────────────────────────────────

    pub fn record_impression(&self, campaign_id: Uuid, created_at: DateTime<Utc>) -> Impression {
        let imp = Impression {
            id: Uuid::new_v4(),
            campaign_id,
            created_at,
            billed: false,
        };
        self.impressions
            .entry(campaign_id)
            .or_default()
            .push(imp.clone());
        imp
    }

    /// Bulk insert for delivery batches and seeding.
    pub fn record_impressions(&self, campaign_id: Uuid, count: u64, created_at: DateTime<Utc>) {
        let mut bucket = self.impressions.entry(campaign_id).or_default();
        for _ in 0..count {
            bucket.push(Impression {
                id: Uuid::new_v4(),
                campaign_id,
                created_at,
                billed: false,
            });
        }
    }

    pub fn record_click(
        &self,
        campaign_id: Uuid,
        user_id: Uuid,
        is_valid: bool,
        created_at: DateTime<Utc>,
    ) -> Click {
        let click = Click {
            id: Uuid::new_v4(),
            campaign_id,
            user_id,
            is_valid,
            created_at,
        };
        self.clicks
            .entry(campaign_id)
            .or_default()
            .push(click.clone());
        click
    }

    pub fn record_conversion(&self, conversion: Conversion) {
        self.conversions
            .entry(conversion.campaign_id)
            .or_default()
            .push(conversion);
    }

    // ─── Campaign-scoped counts ────────────────────────────────────────

    pub fn count_impressions(&self, campaign_id: Uuid, since: DateTime<Utc>) -> u64 {
        self.impressions
            .get(&campaign_id)
            .map(|v| v.iter().filter(|i| i.created_at >= since).count() as u64)
            .unwrap_or(0)
    }

    pub fn count_valid_clicks(&self, campaign_id: Uuid, since: DateTime<Utc>) -> u64 {
        self.clicks
            .get(&campaign_id)
            .map(|v| {
                v.iter()
                    .filter(|c| c.is_valid && c.created_at >= since)
                    .count() as u64
            })
            .unwrap_or(0)
    }

    pub fn count_conversions(&self, campaign_id: Uuid, since: DateTime<Utc>) -> u64 {
        self.conversions
            .get(&campaign_id)
            .map(|v| v.iter().filter(|c| c.created_at >= since).count() as u64)
            .unwrap_or(0)
    }

    pub fn conversions_for(&self, campaign_id: Uuid) -> Vec<Conversion> {
        self.conversions
            .get(&campaign_id)
            .map(|v| v.clone())
            .unwrap_or_default()
    }

    // ─── Attribution lookups ───────────────────────────────────────────

    /// Most recent valid click by `user_id` strictly after `cutoff`.
    /// Identical timestamps tie-break arbitrarily; the attribution
    /// contract accepts that nondeterminism.
    pub fn latest_valid_click(&self, user_id: Uuid, cutoff: DateTime<Utc>) -> Option<Click> {
        let mut best: Option<Click> = None;
        for entry in self.clicks.iter() {
            for click in entry.value() {
                if click.user_id != user_id || !click.is_valid || click.created_at <= cutoff {
                    continue;
                }
                if best.as_ref().map_or(true, |b| click.created_at > b.created_at) {
                    best = Some(click.clone());
                }
            }
        }
        best
    }

    // ─── Billing ───────────────────────────────────────────────────────

    /// Unbilled impressions in `(from, to]` for a campaign.
    pub fn count_unbilled_impressions(
        &self,
        campaign_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> u64 {
        self.impressions
            .get(&campaign_id)
            .map(|v| {
                v.iter()
                    .filter(|i| !i.billed && i.created_at > from && i.created_at <= to)
                    .count() as u64
            })
            .unwrap_or(0)
    }

    /// Flip the billed flag on exactly the impressions matching the
    /// same predicate as [`count_unbilled_impressions`]. Impressions
    /// that arrive after `to` stay unbilled for the next pass. Returns
    /// the number marked.
    pub fn mark_billed(&self, campaign_id: Uuid, from: DateTime<Utc>, to: DateTime<Utc>) -> u64 {
        match self.impressions.get_mut(&campaign_id) {
            Some(mut v) => {
                let mut marked = 0u64;
                for imp in v.iter_mut() {
                    if !imp.billed && imp.created_at > from && imp.created_at <= to {
                        imp.billed = true;
                        marked += 1;
                    }
                }
                marked
            }
            None => 0,
        }
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}
