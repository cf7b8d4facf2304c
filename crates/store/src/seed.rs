//! Demo data seeding for local development: two establishments with
//! funded wallets, a handful of campaigns, and a spread of delivery
//! events over the trailing month.

use crate::{CampaignStore, EventStore, WalletLedger};
use adserve_core::types::{BillingModel, Campaign, CampaignStatus, Targeting};
use chrono::{Duration, Utc};
use rand::Rng;
use tracing::info;
use uuid::Uuid;

/// Populate the three stores with demo data. Intended for `--seed-demo`
/// runs only; production starts empty.
pub fn seed_demo_data(campaigns: &CampaignStore, events: &EventStore, wallet: &WalletLedger) {
    let mut rng = rand::thread_rng();
    let now = Utc::now();

    let est_bistro = Uuid::new_v4();
    let est_sushi = Uuid::new_v4();
    wallet.credit(est_bistro, 500_000, "demo wallet top-up");
    wallet.credit(est_sushi, 200_000, "demo wallet top-up");

    let lunch = Campaign {
        id: Uuid::new_v4(),
        establishment_id: est_bistro,
        name: "Bistro lunch promo".into(),
        billing_model: BillingModel::Cpm,
        status: CampaignStatus::Active,
        pause_reason: None,
        budget_cents: Some(200_000),
        daily_budget_cents: Some(10_000),
        spent_cents: 0,
        daily_spent_cents: 0,
        cpm_cents: 1_000,
        quality_score: 1.0,
        ctr: 0.0,
        conversions: 0,
        targeting: Some(Targeting {
            keywords: vec!["lunch".into(), "bistro".into()],
            cities: vec!["Casablanca".into()],
            categories: vec!["french".into()],
            days_of_week: vec![0, 1, 2, 3, 4],
            hours_of_day: vec![11, 12, 13, 14],
        }),
        starts_at: now - Duration::days(20),
        ends_at: Some(now + Duration::days(40)),
        created_at: now - Duration::days(20),
        updated_at: now,
    };

    let dinner = Campaign {
        id: Uuid::new_v4(),
        establishment_id: est_sushi,
        name: "Sushi dinner push".into(),
        billing_model: BillingModel::Cpm,
        status: CampaignStatus::Active,
        pause_reason: None,
        budget_cents: None,
        daily_budget_cents: Some(5_000),
        spent_cents: 0,
        daily_spent_cents: 0,
        cpm_cents: 1_500,
        quality_score: 1.0,
        ctr: 0.0,
        conversions: 0,
        targeting: Some(Targeting {
            keywords: vec!["sushi".into()],
            cities: vec!["Rabat".into()],
            ..Targeting::default()
        }),
        starts_at: now - Duration::days(10),
        ends_at: None,
        created_at: now - Duration::days(10),
        updated_at: now,
    };

    let untargeted = Campaign {
        id: Uuid::new_v4(),
        establishment_id: est_sushi,
        name: "Untargeted draft".into(),
        billing_model: BillingModel::Cpm,
        status: CampaignStatus::Draft,
        pause_reason: None,
        budget_cents: Some(50_000),
        daily_budget_cents: None,
        spent_cents: 0,
        daily_spent_cents: 0,
        cpm_cents: 800,
        quality_score: 1.0,
        ctr: 0.0,
        conversions: 0,
        targeting: None,
        starts_at: now,
        ends_at: None,
        created_at: now - Duration::days(2),
        updated_at: now,
    };

    // Delivery history over the trailing month for the two live
    // campaigns, with a plausible click rate.
    for campaign in [&lunch, &dinner] {
        for day in 0..28i64 {
            let at = now - Duration::days(day) - Duration::minutes(rng.gen_range(0..600));
            let impressions = rng.gen_range(200..800);
            events.record_impressions(campaign.id, impressions, at);
            for _ in 0..(impressions / rng.gen_range(40..90)) {
                events.record_click(campaign.id, Uuid::new_v4(), rng.gen_bool(0.9), at);
            }
        }
    }

    campaigns.insert(lunch);
    campaigns.insert(dinner);
    campaigns.insert(untargeted);

    info!(
        campaigns = campaigns.len(),
        "seeded demo establishments, wallets, campaigns, and events"
    );
}
