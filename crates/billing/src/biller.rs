//! Hourly CPM biller.
//!
//! Billing order is load-bearing: the wallet debit must succeed
//! before any impression is marked billed. A failed debit leaves the
//! whole window unbilled, so the next hourly pass retries it
//! (at-least-once billing safety, never bill-then-fail-to-charge).

use adserve_core::types::{BillingModel, Campaign, CampaignStatus, LedgerEntryType};
use adserve_store::{CampaignStore, EventStore, WalletLedger};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Outcome of one billing pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BillingSummary {
    pub billed_campaigns: u64,
    pub total_billed_cents: i64,
    pub errors: Vec<String>,
}

/// Converts unbilled CPM impressions into ledger debits.
pub struct ImpressionBiller {
    campaigns: Arc<CampaignStore>,
    events: Arc<EventStore>,
    wallet: Arc<WalletLedger>,
    window_hours: i64,
}

impl ImpressionBiller {
    pub fn new(
        campaigns: Arc<CampaignStore>,
        events: Arc<EventStore>,
        wallet: Arc<WalletLedger>,
        window_hours: i64,
    ) -> Self {
        Self {
            campaigns,
            events,
            wallet,
            window_hours,
        }
    }

    /// Bill every active CPM campaign for impressions in the window
    /// ending at `now`. Per-campaign failures are logged and counted;
    /// the pass always visits every campaign.
    pub fn run_hourly_pass(&self, now: DateTime<Utc>) -> BillingSummary {
        let from = now - Duration::hours(self.window_hours);
        let batch = self.campaigns.list_by_status(&[CampaignStatus::Active]);

        let mut summary = BillingSummary::default();

        for campaign in &batch {
            if campaign.billing_model != BillingModel::Cpm {
                continue;
            }
            match self.bill_campaign(campaign, from, now) {
                Ok(0) => {}
                Ok(cost) => {
                    summary.billed_campaigns += 1;
                    summary.total_billed_cents += cost;
                }
                Err(e) => {
                    warn!(campaign_id = %campaign.id, error = %e, "billing failed, window stays unbilled");
                    summary.errors.push(format!("campaign {}: {e}", campaign.id));
                }
            }
        }

        info!(
            billed_campaigns = summary.billed_campaigns,
            total_billed_cents = summary.total_billed_cents,
            errors = summary.errors.len(),
            "hourly billing pass finished"
        );
        summary
    }

    /// Bill one campaign's window. Returns the billed cost in cents,
    /// 0 when there was nothing billable.
    fn bill_campaign(
        &self,
        campaign: &Campaign,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> adserve_core::AdserveResult<i64> {
        let unbilled = self.events.count_unbilled_impressions(campaign.id, from, to);
        if unbilled == 0 {
            return Ok(0);
        }

        let cost_cents = cpm_cost_cents(campaign.cpm_cents, unbilled);
        // Rounding a tiny CPM/volume down to zero is a normal skip.
        if cost_cents <= 0 {
            return Ok(0);
        }

        // Debit first. Only after the money moved do we mark the same
        // window billed; impressions arriving after `to` stay unbilled
        // for the next pass.
        self.wallet.debit(
            campaign.establishment_id,
            cost_cents,
            LedgerEntryType::AdSpend,
            Some(campaign.id),
            &format!("CPM billing: {unbilled} impressions for '{}'", campaign.name),
        )?;

        let marked = self.events.mark_billed(campaign.id, from, to);
        if marked != unbilled {
            // Same predicate and bounds, so this only happens if the
            // store dropped rows mid-pass. It is logged, not fatal;
            // the wallet holds the charge for what was counted.
            warn!(
                campaign_id = %campaign.id,
                counted = unbilled,
                marked,
                "billed impression count drifted between count and mark"
            );
        }

        self.campaigns.add_spend(campaign.id, cost_cents);

        info!(
            campaign_id = %campaign.id,
            impressions = unbilled,
            cost_cents,
            "campaign billed"
        );
        Ok(cost_cents)
    }
}

/// `round(cpm_cents × impressions / 1000)` in integer arithmetic,
/// half-up.
fn cpm_cost_cents(cpm_cents: i64, impressions: u64) -> i64 {
    (cpm_cents * impressions as i64 + 500) / 1000
}
