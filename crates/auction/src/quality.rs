//! Quality score — a 0.5–2.0 multiplier combining trailing CTR,
//! conversion rate, targeting completeness, and advertiser age, plus
//! the scheduled pass that recomputes it for every live campaign.

use crate::targeting;
use adserve_core::types::{Campaign, CampaignStatus};
use adserve_core::{AdserveError, AdserveResult};
use adserve_store::{CampaignStore, EventStore};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// CTR above this benchmark earns full credit on the CTR component.
const CTR_BENCHMARK: f64 = 0.05;
/// Conversion rate benchmark ceiling.
const CONVERSION_BENCHMARK: f64 = 0.05;
/// Advertiser age at which the age component maxes out.
const AGE_CEILING_DAYS: f64 = 90.0;

const CTR_WEIGHT: f64 = 0.4;
const CONVERSION_WEIGHT: f64 = 0.3;
const TARGETING_WEIGHT: f64 = 0.2;
const AGE_WEIGHT: f64 = 0.1;

/// Combine the four performance components into a score in
/// `[0.5, 2.0]`, rounded to 2 decimals. The raw weighted sum spans
/// 0..=1 and is stretched so the worst campaign multiplies bids by
/// 0.5 and the best by 2.0.
pub fn compute_quality_score(
    ctr: f64,
    conversion_rate: f64,
    targeting_score: f64,
    advertiser_age_days: f64,
) -> f64 {
    let ctr_component = (ctr / CTR_BENCHMARK).clamp(0.0, 1.0) * CTR_WEIGHT;
    let conversion_component =
        (conversion_rate / CONVERSION_BENCHMARK).clamp(0.0, 1.0) * CONVERSION_WEIGHT;
    let targeting_component = targeting_score * TARGETING_WEIGHT;
    let age_component = (advertiser_age_days / AGE_CEILING_DAYS).clamp(0.0, 1.0) * AGE_WEIGHT;

    let raw = ctr_component + conversion_component + targeting_component + age_component;
    round2(0.5 + raw * 1.5)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

/// Outcome of one recalculation pass. A non-zero error count means a
/// degraded but usable run; callers alert on it rather than retry.
#[derive(Debug, Clone, Serialize)]
pub struct QualityRecalcSummary {
    pub updated: u64,
    pub errors: Vec<String>,
}

/// Scheduled pass recomputing quality score and CTR for every
/// campaign in draft, active, or paused status.
pub struct QualityRecalcPass {
    campaigns: Arc<CampaignStore>,
    events: Arc<EventStore>,
    window_days: i64,
}

impl QualityRecalcPass {
    pub fn new(campaigns: Arc<CampaignStore>, events: Arc<EventStore>, window_days: i64) -> Self {
        Self {
            campaigns,
            events,
            window_days,
        }
    }

    /// Run one pass as of `now`. A failure on one campaign is logged
    /// and counted; the rest of the batch always completes.
    pub fn run(&self, now: DateTime<Utc>) -> QualityRecalcSummary {
        let batch = self.campaigns.list_by_status(&[
            CampaignStatus::Active,
            CampaignStatus::Paused,
            CampaignStatus::Draft,
        ]);

        let mut summary = QualityRecalcSummary {
            updated: 0,
            errors: Vec::new(),
        };

        for campaign in &batch {
            match self.recalc_campaign(campaign, now) {
                Ok(()) => summary.updated += 1,
                Err(e) => {
                    warn!(campaign_id = %campaign.id, error = %e, "quality recalc failed for campaign");
                    summary.errors.push(format!("campaign {}: {e}", campaign.id));
                }
            }
        }

        info!(
            updated = summary.updated,
            errors = summary.errors.len(),
            "quality recalc pass finished"
        );
        summary
    }

    fn recalc_campaign(&self, campaign: &Campaign, now: DateTime<Utc>) -> AdserveResult<()> {
        let since = now - Duration::days(self.window_days);

        let impressions = self.events.count_impressions(campaign.id, since);
        let clicks = self.events.count_valid_clicks(campaign.id, since);
        let conversions = self.events.count_conversions(campaign.id, since);

        let ctr = if impressions > 0 {
            clicks as f64 / impressions as f64
        } else {
            0.0
        };
        let conversion_rate = if clicks > 0 {
            conversions as f64 / clicks as f64
        } else {
            0.0
        };

        let targeting_score = targeting::completeness_score(campaign.targeting.as_ref());

        // Advertiser age anchors on the establishment's first-ever
        // campaign; a lone campaign anchors on itself.
        let first = self
            .campaigns
            .first_campaign_created_at(campaign.establishment_id)
            .unwrap_or(campaign.created_at);
        let age_days = (now - first).num_days().max(0) as f64;

        let score = compute_quality_score(ctr, conversion_rate, targeting_score, age_days);

        if !self.campaigns.update_scores(campaign.id, score, round4(ctr)) {
            return Err(AdserveError::CampaignStore(format!(
                "campaign {} vanished during recalc",
                campaign.id
            )));
        }
        Ok(())
    }
}
