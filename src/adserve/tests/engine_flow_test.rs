//! Integration test for the full billing/budget/attribution cycle:
//! impressions are billed, the daily budget trips a pause, the daily
//! pass recovers it, and a click converts into an attributed
//! conversion that the quality pass picks up.

#[cfg(test)]
mod tests {
    use adserve_attribution::{ConversionAttributor, ConversionRequest};
    use adserve_auction::QualityRecalcPass;
    use adserve_billing::ImpressionBiller;
    use adserve_budget::BudgetLifecycle;
    use adserve_core::types::*;
    use adserve_store::{CampaignStore, EventStore, WalletLedger};
    use chrono::{Duration, Utc};
    use std::sync::Arc;
    use uuid::Uuid;

    fn sample_campaign(now: chrono::DateTime<chrono::Utc>) -> Campaign {
        Campaign {
            id: Uuid::new_v4(),
            establishment_id: Uuid::new_v4(),
            name: "Rooftop iftar menu".into(),
            billing_model: BillingModel::Cpm,
            status: CampaignStatus::Active,
            pause_reason: None,
            budget_cents: Some(100_000),
            daily_budget_cents: Some(2_000),
            spent_cents: 0,
            daily_spent_cents: 0,
            cpm_cents: 1_000,
            quality_score: 1.0,
            ctr: 0.0,
            conversions: 0,
            targeting: Some(Targeting {
                keywords: vec!["iftar".into()],
                cities: vec!["Casablanca".into()],
                categories: vec!["moroccan".into()],
                days_of_week: vec![0, 1, 2, 3, 4, 5, 6],
                hours_of_day: vec![18, 19, 20],
            }),
            starts_at: now - Duration::days(7),
            ends_at: Some(now + Duration::days(14)),
            created_at: now - Duration::days(7),
            updated_at: now,
        }
    }

    #[test]
    fn test_billing_budget_attribution_cycle() {
        let campaigns = Arc::new(CampaignStore::new());
        let events = Arc::new(EventStore::new());
        let wallet = Arc::new(WalletLedger::new());
        let now = Utc::now();

        let campaign = sample_campaign(now);
        let est = campaign.establishment_id;
        let cid = campaign.id;
        campaigns.insert(campaign);
        wallet.credit(est, 50_000, "campaign funding");

        let biller = ImpressionBiller::new(campaigns.clone(), events.clone(), wallet.clone(), 1);
        let lifecycle = BudgetLifecycle::new(campaigns.clone());
        let attributor = ConversionAttributor::new(campaigns.clone(), events.clone(), 24);
        let quality = QualityRecalcPass::new(campaigns.clone(), events.clone(), 30);

        // Hour of delivery: 2_500 impressions at cpm 1_000 -> 2_500 cents.
        events.record_impressions(cid, 2_500, now - Duration::minutes(20));
        let billing = biller.run_hourly_pass(now);
        assert_eq!(billing.billed_campaigns, 1);
        assert_eq!(billing.total_billed_cents, 2_500);
        assert_eq!(wallet.balance(est), Some(47_500));

        // 2_500 spent today versus a 2_000 daily budget: the next
        // exhaustion sweep pauses the campaign.
        let exhaustion = lifecycle.run_exhaustion_pass();
        assert_eq!(exhaustion.paused_daily_budget, 1);
        let paused = campaigns.get(cid).unwrap();
        assert_eq!(paused.status, CampaignStatus::Paused);
        assert_eq!(paused.pause_reason, Some(PauseReason::DailyBudgetExhausted));

        // Paused campaigns are invisible to billing.
        events.record_impressions(cid, 500, now - Duration::minutes(5));
        let while_paused = biller.run_hourly_pass(now);
        assert_eq!(while_paused.billed_campaigns, 0);

        // Midnight: counters reset, total budget has headroom, back to
        // active.
        let daily = lifecycle.run_daily_pass(now);
        assert_eq!(daily.reset, 1);
        assert_eq!(daily.reactivated, 1);
        let active = campaigns.get(cid).unwrap();
        assert_eq!(active.status, CampaignStatus::Active);
        assert_eq!(active.daily_spent_cents, 0);
        assert_eq!(active.spent_cents, 2_500);

        // A diner clicks, then books a table two hours later.
        let diner = Uuid::new_v4();
        events.record_click(cid, diner, true, now - Duration::hours(2));
        let outcome = attributor.record_conversion(
            &ConversionRequest {
                user_id: diner,
                conversion_type: ConversionType::Reservation,
                conversion_value_cents: Some(30_000),
                entity_type: Some("reservation".into()),
                entity_id: Some(Uuid::new_v4()),
                establishment_id: est,
            },
            now,
        );
        assert!(outcome.attributed);
        assert_eq!(outcome.campaign_id, Some(cid));

        // The quality pass folds the delivery history back into the
        // campaign's score and CTR.
        let recalc = quality.run(now);
        assert_eq!(recalc.updated, 1);
        assert!(recalc.errors.is_empty());
        let scored = campaigns.get(cid).unwrap();
        assert!(scored.quality_score >= 0.5 && scored.quality_score <= 2.0);
        assert!(scored.ctr > 0.0);
    }
}
