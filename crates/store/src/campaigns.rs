//! Campaign store — status-scoped reads and conditioned updates.

use adserve_core::types::{Campaign, CampaignStatus, PauseReason};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

/// Thread-safe in-memory campaign store.
pub struct CampaignStore {
    campaigns: DashMap<Uuid, Campaign>,
}

impl CampaignStore {
    pub fn new() -> Self {
        Self {
            campaigns: DashMap::new(),
        }
    }

    pub fn insert(&self, campaign: Campaign) {
        self.campaigns.insert(campaign.id, campaign);
    }

    pub fn get(&self, id: Uuid) -> Option<Campaign> {
        self.campaigns.get(&id).map(|r| r.value().clone())
    }

    /// Snapshot of all campaigns currently in one of `statuses`.
    pub fn list_by_status(&self, statuses: &[CampaignStatus]) -> Vec<Campaign> {
        let mut out: Vec<Campaign> = self
            .campaigns
            .iter()
            .filter(|r| statuses.contains(&r.value().status))
            .map(|r| r.value().clone())
            .collect();
        out.sort_by_key(|c| c.created_at);
        out
    }

    /// Earliest `created_at` across an establishment's campaigns.
    /// Used as the advertiser-age anchor by the quality pass.
    pub fn first_campaign_created_at(&self, establishment_id: Uuid) -> Option<DateTime<Utc>> {
        self.campaigns
            .iter()
            .filter(|r| r.value().establishment_id == establishment_id)
            .map(|r| r.value().created_at)
            .min()
    }

    /// Persist recomputed quality score and CTR.
    pub fn update_scores(&self, id: Uuid, quality_score: f64, ctr: f64) -> bool {
        match self.campaigns.get_mut(&id) {
            Some(mut c) => {
                c.quality_score = quality_score;
                c.ctr = ctr;
                c.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Conditional status transition, guarded on the current status.
    /// Returns `false` without modifying anything when the campaign is
    /// missing or no longer in `from` — rerunning a pass against an
    /// already-transitioned campaign is a no-op.
    pub fn transition(
        &self,
        id: Uuid,
        from: CampaignStatus,
        to: CampaignStatus,
        pause_reason: Option<PauseReason>,
    ) -> bool {
        match self.campaigns.get_mut(&id) {
            Some(mut c) if c.status == from => {
                debug!(campaign_id = %id, ?from, ?to, "campaign status transition");
                c.status = to;
                c.pause_reason = pause_reason;
                c.updated_at = Utc::now();
                true
            }
            _ => false,
        }
    }

    /// Zero the daily spend counter. Part of the daily budget pass.
    pub fn reset_daily_spent(&self, id: Uuid) -> bool {
        match self.campaigns.get_mut(&id) {
            Some(mut c) => {
                c.daily_spent_cents = 0;
                c.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Add billed cost to both spend counters.
    pub fn add_spend(&self, id: Uuid, cents: i64) -> bool {
        match self.campaigns.get_mut(&id) {
            Some(mut c) => {
                c.spent_cents += cents;
                c.daily_spent_cents += cents;
                c.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    /// Bump the cached conversion counter. Best-effort: the quality
    /// pass reconciles the real count from the event store.
    pub fn increment_conversions(&self, id: Uuid) -> bool {
        match self.campaigns.get_mut(&id) {
            Some(mut c) => {
                c.conversions += 1;
                c.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.campaigns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.campaigns.is_empty()
    }
}

impl Default for CampaignStore {
    fn default() -> Self {
        Self::new()
    }
}
