//! Last-click conversion attributor.

use adserve_core::types::{Conversion, ConversionType};
use adserve_store::{CampaignStore, EventStore};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// A conversion-worthy action reported by the ordering platform.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversionRequest {
    pub user_id: Uuid,
    pub conversion_type: ConversionType,
    pub conversion_value_cents: Option<i64>,
    pub entity_type: Option<String>,
    pub entity_id: Option<Uuid>,
    /// Establishment the action happened at; the click's campaign must
    /// belong to the same one.
    pub establishment_id: Uuid,
}

/// Whether the action was credited, and to which campaign.
#[derive(Debug, Clone, Serialize)]
pub struct AttributionOutcome {
    pub attributed: bool,
    pub campaign_id: Option<Uuid>,
}

impl AttributionOutcome {
    fn miss() -> Self {
        Self {
            attributed: false,
            campaign_id: None,
        }
    }
}

/// Attributes late-stage user actions back to ad clicks.
pub struct ConversionAttributor {
    campaigns: Arc<CampaignStore>,
    events: Arc<EventStore>,
    window_hours: i64,
}

impl ConversionAttributor {
    pub fn new(campaigns: Arc<CampaignStore>, events: Arc<EventStore>, window_hours: i64) -> Self {
        Self {
            campaigns,
            events,
            window_hours,
        }
    }

    /// Attribute one action as of `now`. Never fails: every miss
    /// condition (no qualifying click, cross-tenant mismatch, unknown
    /// campaign) resolves to `attributed: false` with nothing written.
    ///
    /// Repeated calls for the same logical action are not deduplicated;
    /// the caller owns retry semantics.
    pub fn record_conversion(
        &self,
        req: &ConversionRequest,
        now: DateTime<Utc>,
    ) -> AttributionOutcome {
        // Clicks at exactly window age are already expired.
        let cutoff = now - Duration::hours(self.window_hours);

        let Some(click) = self.events.latest_valid_click(req.user_id, cutoff) else {
            return AttributionOutcome::miss();
        };

        // Cross-tenant guard: a click on establishment A's campaign
        // must not be credited for an action at establishment B.
        let Some(campaign) = self.campaigns.get(click.campaign_id) else {
            warn!(
                click_id = %click.id,
                campaign_id = %click.campaign_id,
                "click references unknown campaign, not attributing"
            );
            return AttributionOutcome::miss();
        };
        if campaign.establishment_id != req.establishment_id {
            return AttributionOutcome::miss();
        }

        let conversion = Conversion {
            id: Uuid::new_v4(),
            click_id: click.id,
            campaign_id: campaign.id,
            user_id: req.user_id,
            conversion_type: req.conversion_type,
            conversion_value_cents: req.conversion_value_cents,
            entity_type: req.entity_type.clone(),
            entity_id: req.entity_id,
            attribution_window_hours: self.window_hours,
            click_to_conversion_seconds: (now - click.created_at).num_seconds(),
            created_at: now,
        };
        self.events.record_conversion(conversion);

        // The conversion row is the source of truth; the campaign
        // counter is a cached value the quality pass reconciles, so a
        // missed increment only gets logged.
        if !self.campaigns.increment_conversions(campaign.id) {
            warn!(
                campaign_id = %campaign.id,
                "failed to bump cached conversion counter"
            );
        }

        info!(
            campaign_id = %campaign.id,
            user_id = %req.user_id,
            conversion_type = ?req.conversion_type,
            "conversion attributed"
        );
        AttributionOutcome {
            attributed: true,
            campaign_id: Some(campaign.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adserve_core::types::{BillingModel, Campaign, CampaignStatus};

    fn setup() -> (Arc<CampaignStore>, Arc<EventStore>, ConversionAttributor, Campaign) {
        let campaigns = Arc::new(CampaignStore::new());
        let events = Arc::new(EventStore::new());
        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            establishment_id: Uuid::new_v4(),
            name: "Weekend tasting menu".into(),
            billing_model: BillingModel::Cpm,
            status: CampaignStatus::Active,
            pause_reason: None,
            budget_cents: None,
            daily_budget_cents: None,
            spent_cents: 0,
            daily_spent_cents: 0,
            cpm_cents: 1_000,
            quality_score: 1.0,
            ctr: 0.0,
            conversions: 0,
            targeting: None,
            starts_at: now - Duration::days(5),
            ends_at: None,
            created_at: now - Duration::days(5),
            updated_at: now,
        };
        campaigns.insert(campaign.clone());
        let attributor = ConversionAttributor::new(campaigns.clone(), events.clone(), 24);
        (campaigns, events, attributor, campaign)
    }

    fn request(campaign: &Campaign, user: Uuid) -> ConversionRequest {
        ConversionRequest {
            user_id: user,
            conversion_type: ConversionType::Reservation,
            conversion_value_cents: Some(15_000),
            entity_type: Some("reservation".into()),
            entity_id: Some(Uuid::new_v4()),
            establishment_id: campaign.establishment_id,
        }
    }

    // 1. Window boundary ----------------------------------------------------

    #[test]
    fn test_click_inside_window_attributes() {
        let (campaigns, events, attributor, campaign) = setup();
        let user = Uuid::new_v4();
        let now = Utc::now();

        events.record_click(
            campaign.id,
            user,
            true,
            now - Duration::hours(23) - Duration::minutes(59),
        );

        let outcome = attributor.record_conversion(&request(&campaign, user), now);
        assert!(outcome.attributed);
        assert_eq!(outcome.campaign_id, Some(campaign.id));

        // Latency recorded at insert time, counter bumped.
        assert_eq!(events.count_conversions(campaign.id, now - Duration::days(1)), 1);
        assert_eq!(campaigns.get(campaign.id).unwrap().conversions, 1);
    }

    #[test]
    fn test_click_past_window_does_not_attribute() {
        let (_, events, attributor, campaign) = setup();
        let user = Uuid::new_v4();
        let now = Utc::now();

        events.record_click(
            campaign.id,
            user,
            true,
            now - Duration::hours(24) - Duration::minutes(1),
        );

        let outcome = attributor.record_conversion(&request(&campaign, user), now);
        assert!(!outcome.attributed);
        assert!(outcome.campaign_id.is_none());
        assert_eq!(events.count_conversions(campaign.id, now - Duration::days(2)), 0);
    }

    // 2. Cross-tenant guard -------------------------------------------------

    #[test]
    fn test_cross_tenant_click_does_not_attribute() {
        let (_, events, attributor, campaign) = setup();
        let user = Uuid::new_v4();
        let now = Utc::now();

        events.record_click(campaign.id, user, true, now - Duration::hours(1));

        let mut req = request(&campaign, user);
        req.establishment_id = Uuid::new_v4();

        let outcome = attributor.record_conversion(&req, now);
        assert!(!outcome.attributed);
        assert_eq!(events.count_conversions(campaign.id, now - Duration::days(1)), 0);
    }

    // 3. Click selection ----------------------------------------------------

    #[test]
    fn test_most_recent_valid_click_wins() {
        let (campaigns, events, attributor, campaign) = setup();
        let user = Uuid::new_v4();
        let now = Utc::now();

        // Second campaign for the same establishment with a later click.
        let mut later = campaign.clone();
        later.id = Uuid::new_v4();
        campaigns.insert(later.clone());

        events.record_click(campaign.id, user, true, now - Duration::hours(5));
        events.record_click(later.id, user, true, now - Duration::hours(1));
        // Most recent of all, but invalid.
        events.record_click(campaign.id, user, false, now - Duration::minutes(10));

        let outcome = attributor.record_conversion(&request(&campaign, user), now);
        assert!(outcome.attributed);
        assert_eq!(outcome.campaign_id, Some(later.id));
    }

    #[test]
    fn test_no_click_means_no_row_written() {
        let (_, events, attributor, campaign) = setup();
        let now = Utc::now();

        let outcome = attributor.record_conversion(&request(&campaign, Uuid::new_v4()), now);
        assert!(!outcome.attributed);
        assert_eq!(events.count_conversions(campaign.id, now - Duration::days(1)), 0);
    }

    #[test]
    fn test_latency_computed_from_click_time() {
        let (_, events, attributor, campaign) = setup();
        let user = Uuid::new_v4();
        let now = Utc::now();

        events.record_click(campaign.id, user, true, now - Duration::hours(2));
        attributor.record_conversion(&request(&campaign, user), now);

        let rows = events.conversions_for(campaign.id);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].click_to_conversion_seconds, 2 * 3600);
        assert_eq!(rows[0].attribution_window_hours, 24);
        assert_eq!(rows[0].conversion_type, ConversionType::Reservation);
    }
}
