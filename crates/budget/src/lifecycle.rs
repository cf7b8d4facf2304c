//! Campaign budget state machine, run as scheduled passes.
//!
//! States: `Draft → Active ⇄ Paused → Completed`, with `Cancelled`
//! reachable externally. Every transition is a conditional update
//! guarded on the current status, so re-running a pass against an
//! already-transitioned campaign updates nothing.

use adserve_core::types::{CampaignStatus, PauseReason};
use adserve_store::CampaignStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Per-step counts for one pass. Steps that did not run in the pass
/// report zero. A non-empty error list means a degraded run, not a
/// failed one.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BudgetPassSummary {
    pub reset: u64,
    pub reactivated: u64,
    pub paused_total_budget: u64,
    pub paused_daily_budget: u64,
    pub completed: u64,
    pub errors: Vec<String>,
}

/// Scheduled budget passes over the campaign store.
pub struct BudgetLifecycle {
    campaigns: Arc<CampaignStore>,
}

impl BudgetLifecycle {
    pub fn new(campaigns: Arc<CampaignStore>) -> Self {
        Self { campaigns }
    }

    /// Daily pass, intended for local midnight. Step order matters:
    /// reset zeroes the counters reactivation reads, and both must
    /// settle before the exhaustion/completion checks run.
    pub fn run_daily_pass(&self, now: DateTime<Utc>) -> BudgetPassSummary {
        let mut summary = BudgetPassSummary::default();
        self.step_daily_reset(&mut summary);
        self.step_reactivate(now, &mut summary);
        self.step_pause_total_exhausted(&mut summary);
        self.step_complete_ended(now, &mut summary);

        info!(
            reset = summary.reset,
            reactivated = summary.reactivated,
            paused_total = summary.paused_total_budget,
            completed = summary.completed,
            errors = summary.errors.len(),
            "daily budget pass finished"
        );
        summary
    }

    /// Frequent pass (~every 15 minutes) catching exhausted budgets
    /// between daily runs. Purely spend-driven, so it takes no clock.
    pub fn run_exhaustion_pass(&self) -> BudgetPassSummary {
        let mut summary = BudgetPassSummary::default();
        self.step_pause_total_exhausted(&mut summary);
        self.step_pause_daily_exhausted(&mut summary);

        info!(
            paused_total = summary.paused_total_budget,
            paused_daily = summary.paused_daily_budget,
            errors = summary.errors.len(),
            "budget exhaustion pass finished"
        );
        summary
    }

    // ─── Steps ─────────────────────────────────────────────────────────

    /// Step 1: zero `daily_spent_cents` on every active or paused
    /// campaign.
    fn step_daily_reset(&self, summary: &mut BudgetPassSummary) {
        let batch = self
            .campaigns
            .list_by_status(&[CampaignStatus::Active, CampaignStatus::Paused]);
        for campaign in batch {
            if self.campaigns.reset_daily_spent(campaign.id) {
                summary.reset += 1;
            } else {
                warn!(campaign_id = %campaign.id, "daily reset missed campaign");
                summary
                    .errors
                    .push(format!("daily reset: campaign {} not found", campaign.id));
            }
        }
    }

    /// Step 2: bring daily-exhausted campaigns back once their daily
    /// counter is reset, as long as the total budget still has
    /// headroom and the schedule window is open.
    fn step_reactivate(&self, now: DateTime<Utc>, summary: &mut BudgetPassSummary) {
        let batch = self.campaigns.list_by_status(&[CampaignStatus::Paused]);
        for campaign in batch {
            if campaign.pause_reason != Some(PauseReason::DailyBudgetExhausted) {
                continue;
            }
            if !campaign.has_total_headroom() || !campaign.window_active(now) {
                continue;
            }
            if self.campaigns.transition(
                campaign.id,
                CampaignStatus::Paused,
                CampaignStatus::Active,
                None,
            ) {
                summary.reactivated += 1;
            }
        }
    }

    /// Step 3: pause active campaigns whose lifetime spend has reached
    /// the total budget.
    fn step_pause_total_exhausted(&self, summary: &mut BudgetPassSummary) {
        let batch = self.campaigns.list_by_status(&[CampaignStatus::Active]);
        for campaign in batch {
            let Some(budget) = campaign.budget_cents else {
                continue;
            };
            if campaign.spent_cents < budget {
                continue;
            }
            if self.campaigns.transition(
                campaign.id,
                CampaignStatus::Active,
                CampaignStatus::Paused,
                Some(PauseReason::TotalBudgetExhausted),
            ) {
                summary.paused_total_budget += 1;
            }
        }
    }

    /// Step 4: pause active campaigns whose spend today has reached
    /// the daily budget.
    fn step_pause_daily_exhausted(&self, summary: &mut BudgetPassSummary) {
        let batch = self.campaigns.list_by_status(&[CampaignStatus::Active]);
        for campaign in batch {
            let Some(daily_budget) = campaign.daily_budget_cents else {
                continue;
            };
            if campaign.daily_spent_cents < daily_budget {
                continue;
            }
            if self.campaigns.transition(
                campaign.id,
                CampaignStatus::Active,
                CampaignStatus::Paused,
                Some(PauseReason::DailyBudgetExhausted),
            ) {
                summary.paused_daily_budget += 1;
            }
        }
    }

    /// Step 5: complete active campaigns whose end date has passed.
    /// Terminal; completed campaigns leave the budget loop for good.
    fn step_complete_ended(&self, now: DateTime<Utc>, summary: &mut BudgetPassSummary) {
        let batch = self.campaigns.list_by_status(&[CampaignStatus::Active]);
        for campaign in batch {
            let Some(ends_at) = campaign.ends_at else {
                continue;
            };
            if ends_at >= now {
                continue;
            }
            if self.campaigns.transition(
                campaign.id,
                CampaignStatus::Active,
                CampaignStatus::Completed,
                None,
            ) {
                summary.completed += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adserve_core::types::{BillingModel, Campaign};
    use chrono::Duration;
    use uuid::Uuid;

    fn campaign() -> Campaign {
        let now = Utc::now();
        Campaign {
            id: Uuid::new_v4(),
            establishment_id: Uuid::new_v4(),
            name: "Couscous friday".into(),
            billing_model: BillingModel::Cpm,
            status: CampaignStatus::Active,
            pause_reason: None,
            budget_cents: Some(100_000),
            daily_budget_cents: Some(5_000),
            spent_cents: 0,
            daily_spent_cents: 0,
            cpm_cents: 1_000,
            quality_score: 1.0,
            ctr: 0.0,
            conversions: 0,
            targeting: None,
            starts_at: now - Duration::days(10),
            ends_at: Some(now + Duration::days(30)),
            created_at: now - Duration::days(10),
            updated_at: now,
        }
    }

    // 1. Daily exhaustion and recovery --------------------------------------

    #[test]
    fn test_daily_exhaustion_pauses_then_daily_pass_reactivates() {
        let store = Arc::new(CampaignStore::new());
        let lifecycle = BudgetLifecycle::new(store.clone());
        let now = Utc::now();

        let mut c = campaign();
        c.daily_spent_cents = 5_200; // over the 5_000 daily budget
        c.spent_cents = 20_000;
        let id = c.id;
        store.insert(c);

        let summary = lifecycle.run_exhaustion_pass();
        assert_eq!(summary.paused_daily_budget, 1);

        let paused = store.get(id).unwrap();
        assert_eq!(paused.status, CampaignStatus::Paused);
        assert_eq!(paused.pause_reason, Some(PauseReason::DailyBudgetExhausted));

        // Next daily pass resets the counter and reactivates.
        let summary = lifecycle.run_daily_pass(now);
        assert_eq!(summary.reset, 1);
        assert_eq!(summary.reactivated, 1);

        let active = store.get(id).unwrap();
        assert_eq!(active.status, CampaignStatus::Active);
        assert_eq!(active.pause_reason, None);
        assert_eq!(active.daily_spent_cents, 0);
    }

    #[test]
    fn test_totally_exhausted_campaign_stays_paused_after_reset() {
        let store = Arc::new(CampaignStore::new());
        let lifecycle = BudgetLifecycle::new(store.clone());
        let now = Utc::now();

        let mut c = campaign();
        c.status = CampaignStatus::Paused;
        c.pause_reason = Some(PauseReason::DailyBudgetExhausted);
        c.spent_cents = 100_000; // no total headroom left
        c.daily_spent_cents = 5_200;
        let id = c.id;
        store.insert(c);

        let summary = lifecycle.run_daily_pass(now);
        assert_eq!(summary.reset, 1);
        assert_eq!(summary.reactivated, 0);
        assert_eq!(store.get(id).unwrap().status, CampaignStatus::Paused);
    }

    // 2. Total exhaustion ----------------------------------------------------

    #[test]
    fn test_total_exhaustion_pause_is_idempotent() {
        let store = Arc::new(CampaignStore::new());
        let lifecycle = BudgetLifecycle::new(store.clone());

        let mut c = campaign();
        c.spent_cents = 100_000;
        let id = c.id;
        store.insert(c);

        let first = lifecycle.run_exhaustion_pass();
        assert_eq!(first.paused_total_budget, 1);
        assert_eq!(
            store.get(id).unwrap().pause_reason,
            Some(PauseReason::TotalBudgetExhausted)
        );

        // Unchanged spend: second run transitions nothing.
        let second = lifecycle.run_exhaustion_pass();
        assert_eq!(second.paused_total_budget, 0);
        assert_eq!(second.paused_daily_budget, 0);
        assert_eq!(store.get(id).unwrap().status, CampaignStatus::Paused);
    }

    #[test]
    fn test_unlimited_budget_never_pauses_on_total() {
        let store = Arc::new(CampaignStore::new());
        let lifecycle = BudgetLifecycle::new(store.clone());

        let mut c = campaign();
        c.budget_cents = None;
        c.spent_cents = 10_000_000;
        c.daily_spent_cents = 0;
        let id = c.id;
        store.insert(c);

        let summary = lifecycle.run_exhaustion_pass();
        assert_eq!(summary.paused_total_budget, 0);
        assert_eq!(store.get(id).unwrap().status, CampaignStatus::Active);
    }

    // 3. Completion ----------------------------------------------------------

    #[test]
    fn test_ended_campaign_completes_terminally() {
        let store = Arc::new(CampaignStore::new());
        let lifecycle = BudgetLifecycle::new(store.clone());
        let now = Utc::now();

        let mut c = campaign();
        c.ends_at = Some(now - Duration::hours(1));
        let id = c.id;
        store.insert(c);

        let summary = lifecycle.run_daily_pass(now);
        assert_eq!(summary.completed, 1);
        assert_eq!(store.get(id).unwrap().status, CampaignStatus::Completed);

        // Completed campaigns are out of every later pass.
        let again = lifecycle.run_daily_pass(now);
        assert_eq!(again.reset, 0);
        assert_eq!(again.completed, 0);
    }

    #[test]
    fn test_reactivation_respects_schedule_window() {
        let store = Arc::new(CampaignStore::new());
        let lifecycle = BudgetLifecycle::new(store.clone());
        let now = Utc::now();

        let mut c = campaign();
        c.status = CampaignStatus::Paused;
        c.pause_reason = Some(PauseReason::DailyBudgetExhausted);
        c.ends_at = Some(now - Duration::hours(2)); // window already closed
        let id = c.id;
        store.insert(c);

        let summary = lifecycle.run_daily_pass(now);
        assert_eq!(summary.reactivated, 0);
        assert_eq!(store.get(id).unwrap().status, CampaignStatus::Paused);
    }

    #[test]
    fn test_draft_campaigns_untouched_by_budget_passes() {
        let store = Arc::new(CampaignStore::new());
        let lifecycle = BudgetLifecycle::new(store.clone());

        let mut c = campaign();
        c.status = CampaignStatus::Draft;
        c.daily_spent_cents = 9_999;
        let id = c.id;
        store.insert(c);

        lifecycle.run_daily_pass(Utc::now());
        lifecycle.run_exhaustion_pass();

        let stored = store.get(id).unwrap();
        assert_eq!(stored.status, CampaignStatus::Draft);
        assert_eq!(stored.daily_spent_cents, 9_999);
    }
}
