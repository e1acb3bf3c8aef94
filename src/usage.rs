//! AI usage tracking
//!
//! Lyric search, translation and verse explanations call out to hosted
//! models. Every call is recorded per UTC day and per provider, and the
//! totals are compared against configurable limits before the next call.
//!
//! Layout in the document store:
//! - `usage_daily/<YYYY-MM-DD>`: [`DailyUsage`]
//! - `usage_config/limits`: [`UsageLimits`]
//!
//! [`MonthlyUsage`] is summed from the month's daily documents on read, so
//! recording a call or resetting a day touches exactly one document.

use anyhow::{Context, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::store::{get_doc, put_doc, SharedStore};

const DAILY_COLLECTION: &str = "usage_daily";
const CONFIG_COLLECTION: &str = "usage_config";
const LIMITS_DOC: &str = "limits";

const UNKNOWN_PROVIDER: &str = "unknown";

/// Configured ceilings. A limit of zero disables that check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UsageLimits {
    pub daily_request_limit: u64,
    pub hourly_request_limit: u64,
    pub daily_token_limit: u64,
    /// USD
    pub monthly_cost_limit: f64,
    /// Fraction of a limit at which the "near" flags switch on
    pub near_limit_ratio: f64,
}

impl Default for UsageLimits {
    fn default() -> Self {
        Self {
            daily_request_limit: 1000,
            hourly_request_limit: 60,
            daily_token_limit: 100_000,
            monthly_cost_limit: 50.0,
            near_limit_ratio: 0.8,
        }
    }
}

impl UsageLimits {
    pub fn validate(&self) -> Result<(), LimitError> {
        if !self.near_limit_ratio.is_finite()
            || self.near_limit_ratio <= 0.0
            || self.near_limit_ratio > 1.0
        {
            return Err(LimitError::InvalidLimits(format!(
                "near_limit_ratio must be in (0, 1], got {}",
                self.near_limit_ratio
            )));
        }
        if !self.monthly_cost_limit.is_finite() || self.monthly_cost_limit < 0.0 {
            return Err(LimitError::InvalidLimits(format!(
                "monthly_cost_limit must be a non-negative amount, got {}",
                self.monthly_cost_limit
            )));
        }
        Ok(())
    }

    fn is_near(&self, value: f64, limit: f64) -> bool {
        limit > 0.0 && value >= self.near_limit_ratio * limit
    }
}

/// Counters for one provider on one day
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderUsage {
    pub requests: u64,
    pub tokens: u64,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyUsage {
    pub date: NaiveDate,
    pub requests: u64,
    pub tokens: u64,
    pub cost: f64,
    #[serde(default)]
    pub providers: BTreeMap<String, ProviderUsage>,
    /// Requests per UTC hour of day (0-23)
    #[serde(default)]
    pub hourly_requests: BTreeMap<u32, u64>,
}

impl DailyUsage {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            requests: 0,
            tokens: 0,
            cost: 0.0,
            providers: BTreeMap::new(),
            hourly_requests: BTreeMap::new(),
        }
    }

    pub fn requests_in_hour(&self, hour: u32) -> u64 {
        self.hourly_requests.get(&hour).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.requests == 0 && self.tokens == 0
    }

    /// One-line summary for status output
    pub fn display(&self) -> String {
        let mut line = format!(
            "{}: {} requests · {} tokens · ${:.2}",
            self.date,
            self.requests,
            format_tokens(self.tokens),
            self.cost
        );
        if !self.providers.is_empty() {
            let breakdown: Vec<String> = self
                .providers
                .iter()
                .map(|(name, usage)| format!("{} {}", name, usage.requests))
                .collect();
            line.push_str(&format!(" ({})", breakdown.join(", ")));
        }
        line
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyUsage {
    /// `YYYY-MM`
    pub month: String,
    pub requests: u64,
    pub tokens: u64,
    pub cost: f64,
}

impl MonthlyUsage {
    pub fn empty(month: String) -> Self {
        Self {
            month,
            requests: 0,
            tokens: 0,
            cost: 0.0,
        }
    }
}

/// Result of comparing current usage against [`UsageLimits`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LimitFlags {
    pub near_daily_request_limit: bool,
    pub near_daily_token_limit: bool,
    pub daily_requests_exceeded: bool,
    pub daily_tokens_exceeded: bool,
    pub hourly_requests_exceeded: bool,
    pub near_monthly_cost_limit: bool,
    pub monthly_cost_exceeded: bool,
}

impl LimitFlags {
    /// Flag map keyed the way the settings screen reads them
    pub fn as_map(&self) -> BTreeMap<&'static str, bool> {
        BTreeMap::from([
            ("nearDailyRequestLimit", self.near_daily_request_limit),
            ("nearDailyTokenLimit", self.near_daily_token_limit),
            ("dailyRequestsExceeded", self.daily_requests_exceeded),
            ("dailyTokensExceeded", self.daily_tokens_exceeded),
            ("hourlyRequestsExceeded", self.hourly_requests_exceeded),
            ("nearMonthlyCostLimit", self.near_monthly_cost_limit),
            ("monthlyCostExceeded", self.monthly_cost_exceeded),
        ])
    }

    pub fn any_exceeded(&self) -> bool {
        self.daily_requests_exceeded
            || self.daily_tokens_exceeded
            || self.hourly_requests_exceeded
            || self.monthly_cost_exceeded
    }

    pub fn any_near(&self) -> bool {
        self.near_daily_request_limit || self.near_daily_token_limit || self.near_monthly_cost_limit
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LimitError {
    #[error("Daily request limit reached ({used} / {limit})")]
    DailyRequests { used: u64, limit: u64 },

    #[error("Hourly request limit reached ({used} / {limit})")]
    HourlyRequests { used: u64, limit: u64 },

    #[error("Daily token limit reached ({used} / {limit})")]
    DailyTokens { used: u64, limit: u64 },

    #[error("Monthly budget reached (${spent:.2} / ${limit:.2})")]
    MonthlyCost { spent: f64, limit: f64 },

    #[error("Invalid usage limits: {0}")]
    InvalidLimits(String),
}

/// Compare usage totals against limits. Pure; `hour` selects the hourly bucket.
pub fn evaluate_limits(
    limits: &UsageLimits,
    daily: &DailyUsage,
    monthly: &MonthlyUsage,
    hour: u32,
) -> LimitFlags {
    let exceeded = |value: u64, limit: u64| limit > 0 && value >= limit;

    LimitFlags {
        near_daily_request_limit: limits
            .is_near(daily.requests as f64, limits.daily_request_limit as f64),
        near_daily_token_limit: limits.is_near(daily.tokens as f64, limits.daily_token_limit as f64),
        daily_requests_exceeded: exceeded(daily.requests, limits.daily_request_limit),
        daily_tokens_exceeded: exceeded(daily.tokens, limits.daily_token_limit),
        hourly_requests_exceeded: exceeded(daily.requests_in_hour(hour), limits.hourly_request_limit),
        near_monthly_cost_limit: limits.is_near(monthly.cost, limits.monthly_cost_limit),
        monthly_cost_exceeded: limits.monthly_cost_limit > 0.0
            && monthly.cost >= limits.monthly_cost_limit,
    }
}

fn day_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

fn format_tokens(tokens: u64) -> String {
    if tokens >= 1000 {
        format!("{:.1}K", tokens as f64 / 1000.0)
    } else {
        tokens.to_string()
    }
}

/// Records API calls and answers limit queries
#[derive(Clone)]
pub struct UsageTracker {
    store: SharedStore,
}

impl UsageTracker {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn record_call(&self, provider: &str, tokens: u64, cost: f64) -> Result<DailyUsage> {
        self.record_call_at(Utc::now(), provider, tokens, cost)
    }

    /// Add one call to the day, hour and provider counters.
    pub fn record_call_at(
        &self,
        now: DateTime<Utc>,
        provider: &str,
        tokens: u64,
        cost: f64,
    ) -> Result<DailyUsage> {
        let provider = match provider.trim() {
            "" => UNKNOWN_PROVIDER,
            p => p,
        };
        // Counters only ever grow within a day
        let cost = if cost.is_finite() && cost > 0.0 { cost } else { 0.0 };
        let date = now.date_naive();

        let mut daily = self
            .load_daily(date)
            .context("Failed to read today's usage")?;
        daily.requests = daily.requests.saturating_add(1);
        daily.tokens = daily.tokens.saturating_add(tokens);
        daily.cost += cost;
        let entry = daily.providers.entry(provider.to_string()).or_default();
        entry.requests = entry.requests.saturating_add(1);
        entry.tokens = entry.tokens.saturating_add(tokens);
        entry.cost += cost;
        *daily.hourly_requests.entry(now.hour()).or_insert(0) += 1;
        put_doc(self.store.as_ref(), DAILY_COLLECTION, &day_key(date), &daily)
            .context("Failed to save today's usage")?;

        tracing::debug!(provider, tokens, cost, requests_today = daily.requests, "recorded API call");
        Ok(daily)
    }

    pub fn today_usage(&self) -> DailyUsage {
        self.today_usage_at(Utc::now())
    }

    /// Today's totals, or an empty record if the store can't be read.
    pub fn today_usage_at(&self, now: DateTime<Utc>) -> DailyUsage {
        self.usage_on(now.date_naive())
    }

    pub fn usage_on(&self, date: NaiveDate) -> DailyUsage {
        self.load_daily(date).unwrap_or_else(|err| {
            tracing::warn!(%date, error = %err, "failed to load daily usage, reporting zero");
            DailyUsage::empty(date)
        })
    }

    pub fn month_usage_at(&self, now: DateTime<Utc>) -> MonthlyUsage {
        let date = now.date_naive();
        self.load_monthly(date).unwrap_or_else(|err| {
            tracing::warn!(month = %month_key(date), error = %err, "failed to load monthly usage, reporting zero");
            MonthlyUsage::empty(month_key(date))
        })
    }

    pub fn usage_history(&self, days: u32) -> Vec<DailyUsage> {
        self.usage_history_at(Utc::now(), days)
    }

    /// The last `days` days, newest first. Days without calls are included
    /// as empty records.
    pub fn usage_history_at(&self, now: DateTime<Utc>, days: u32) -> Vec<DailyUsage> {
        let today = now.date_naive();
        (0..i64::from(days))
            .map(|offset| self.usage_on(today - Duration::days(offset)))
            .collect()
    }

    pub fn limits(&self) -> UsageLimits {
        match get_doc::<UsageLimits>(self.store.as_ref(), CONFIG_COLLECTION, LIMITS_DOC) {
            Ok(Some(limits)) => limits,
            Ok(None) => UsageLimits::default(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to load usage limits, using defaults");
                UsageLimits::default()
            }
        }
    }

    /// Admin operation. Historical records are left as they are.
    pub fn update_limits(&self, limits: &UsageLimits) -> Result<()> {
        limits.validate()?;
        put_doc(self.store.as_ref(), CONFIG_COLLECTION, LIMITS_DOC, limits)
            .context("Failed to save usage limits")?;
        tracing::info!(
            daily_requests = limits.daily_request_limit,
            hourly_requests = limits.hourly_request_limit,
            daily_tokens = limits.daily_token_limit,
            monthly_cost = limits.monthly_cost_limit,
            "usage limits updated"
        );
        Ok(())
    }

    pub fn check_usage_limits(&self) -> LimitFlags {
        self.check_usage_limits_at(Utc::now())
    }

    pub fn check_usage_limits_at(&self, now: DateTime<Utc>) -> LimitFlags {
        evaluate_limits(
            &self.limits(),
            &self.today_usage_at(now),
            &self.month_usage_at(now),
            now.hour(),
        )
    }

    pub fn allow_request(&self) -> Result<(), LimitError> {
        self.allow_request_at(Utc::now())
    }

    /// Gate checked before a new API call.
    pub fn allow_request_at(&self, now: DateTime<Utc>) -> Result<(), LimitError> {
        let limits = self.limits();
        let daily = self.today_usage_at(now);
        let monthly = self.month_usage_at(now);
        let flags = evaluate_limits(&limits, &daily, &monthly, now.hour());

        if flags.daily_requests_exceeded {
            return Err(LimitError::DailyRequests {
                used: daily.requests,
                limit: limits.daily_request_limit,
            });
        }
        if flags.hourly_requests_exceeded {
            return Err(LimitError::HourlyRequests {
                used: daily.requests_in_hour(now.hour()),
                limit: limits.hourly_request_limit,
            });
        }
        if flags.daily_tokens_exceeded {
            return Err(LimitError::DailyTokens {
                used: daily.tokens,
                limit: limits.daily_token_limit,
            });
        }
        if flags.monthly_cost_exceeded {
            return Err(LimitError::MonthlyCost {
                spent: monthly.cost,
                limit: limits.monthly_cost_limit,
            });
        }
        Ok(())
    }

    /// Explicit reset of one day's counters. The month total drops with it.
    /// Safe to retry: resetting an already cleared day does nothing.
    pub fn reset_day(&self, date: NaiveDate) -> Result<()> {
        self.store
            .delete(DAILY_COLLECTION, &day_key(date))
            .context("Failed to delete daily usage")?;
        tracing::info!(%date, "daily usage reset");
        Ok(())
    }

    fn load_daily(&self, date: NaiveDate) -> Result<DailyUsage> {
        Ok(get_doc(self.store.as_ref(), DAILY_COLLECTION, &day_key(date))?
            .unwrap_or_else(|| DailyUsage::empty(date)))
    }

    fn load_monthly(&self, date: NaiveDate) -> Result<MonthlyUsage> {
        let month = month_key(date);
        let prefix = format!("{}-", month);
        let mut monthly = MonthlyUsage::empty(month);
        for id in self.store.list(DAILY_COLLECTION)? {
            if !id.starts_with(&prefix) {
                continue;
            }
            if let Some(day) = get_doc::<DailyUsage>(self.store.as_ref(), DAILY_COLLECTION, &id)? {
                monthly.requests = monthly.requests.saturating_add(day.requests);
                monthly.tokens = monthly.tokens.saturating_add(day.tokens);
                monthly.cost += day.cost;
            }
        }
        Ok(monthly)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use chrono::TimeZone;
    use std::sync::Arc;

    fn tracker() -> (Arc<MemoryStore>, UsageTracker) {
        let store = Arc::new(MemoryStore::new());
        let tracker = UsageTracker::new(store.clone());
        (store, tracker)
    }

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, hour, 15, 0).unwrap()
    }

    fn small_limits() -> UsageLimits {
        UsageLimits {
            daily_request_limit: 100,
            hourly_request_limit: 0,
            ..UsageLimits::default()
        }
    }

    #[test]
    fn test_defaults_match_documented_limits() {
        let limits = UsageLimits::default();
        assert_eq!(limits.daily_request_limit, 1000);
        assert_eq!(limits.hourly_request_limit, 60);
        assert_eq!(limits.daily_token_limit, 100_000);
        assert_eq!(limits.monthly_cost_limit, 50.0);
        assert_eq!(limits.near_limit_ratio, 0.8);
    }

    #[test]
    fn test_record_call_accumulates_per_provider() {
        let (_, tracker) = tracker();
        tracker.record_call_at(at(5, 9), "openai", 1200, 0.02).unwrap();
        tracker.record_call_at(at(5, 9), "gemini", 300, 0.01).unwrap();
        tracker.record_call_at(at(5, 10), "openai", 500, 0.01).unwrap();

        let today = tracker.today_usage_at(at(5, 11));
        assert_eq!(today.requests, 3);
        assert_eq!(today.tokens, 2000);
        assert!((today.cost - 0.04).abs() < 1e-9);
        assert_eq!(today.providers["openai"].requests, 2);
        assert_eq!(today.providers["openai"].tokens, 1700);
        assert_eq!(today.providers["gemini"].requests, 1);
        assert_eq!(today.requests_in_hour(9), 2);
        assert_eq!(today.requests_in_hour(10), 1);

        // Next day starts from zero
        assert!(tracker.today_usage_at(at(6, 0)).is_empty());
        assert_eq!(tracker.month_usage_at(at(6, 0)).requests, 3);
    }

    #[test]
    fn test_negative_cost_and_blank_provider_are_normalized() {
        let (_, tracker) = tracker();
        let daily = tracker.record_call_at(at(1, 1), "  ", 10, -3.0).unwrap();
        assert_eq!(daily.cost, 0.0);
        assert!(daily.providers.contains_key("unknown"));
    }

    #[test]
    fn test_near_limit_at_81_of_100() {
        let (_, tracker) = tracker();
        tracker.update_limits(&small_limits()).unwrap();
        for _ in 0..81 {
            tracker.record_call_at(at(7, 12), "openai", 10, 0.0).unwrap();
        }

        let flags = tracker.check_usage_limits_at(at(7, 12)).as_map();
        assert!(flags["nearDailyRequestLimit"]);
        assert!(!flags["dailyRequestsExceeded"]);
        assert!(tracker.allow_request_at(at(7, 12)).is_ok());
    }

    #[test]
    fn test_exceeded_at_100_of_100() {
        let (_, tracker) = tracker();
        tracker.update_limits(&small_limits()).unwrap();
        for _ in 0..100 {
            tracker.record_call_at(at(7, 12), "openai", 10, 0.0).unwrap();
        }

        let flags = tracker.check_usage_limits_at(at(7, 12));
        assert!(flags.daily_requests_exceeded);
        assert!(flags.near_daily_request_limit);
        assert!(!flags.daily_tokens_exceeded);
        assert_eq!(
            tracker.allow_request_at(at(7, 12)),
            Err(LimitError::DailyRequests {
                used: 100,
                limit: 100
            })
        );
    }

    #[test]
    fn test_under_threshold_sets_nothing() {
        let flags = evaluate_limits(
            &small_limits(),
            &DailyUsage {
                requests: 79,
                ..DailyUsage::empty(at(1, 0).date_naive())
            },
            &MonthlyUsage::empty("2026-10".to_string()),
            0,
        );
        assert_eq!(flags, LimitFlags::default());
    }

    #[test]
    fn test_near_ratio_is_configurable() {
        let limits = UsageLimits {
            near_limit_ratio: 0.5,
            ..small_limits()
        };
        let daily = DailyUsage {
            requests: 50,
            ..DailyUsage::empty(at(1, 0).date_naive())
        };
        let flags = evaluate_limits(&limits, &daily, &MonthlyUsage::empty("2026-10".into()), 0);
        assert!(flags.near_daily_request_limit);
    }

    #[test]
    fn test_hourly_limit() {
        let (_, tracker) = tracker();
        tracker
            .update_limits(&UsageLimits {
                hourly_request_limit: 3,
                ..UsageLimits::default()
            })
            .unwrap();
        for _ in 0..3 {
            tracker.record_call_at(at(8, 14), "openai", 1, 0.0).unwrap();
        }
        assert!(matches!(
            tracker.allow_request_at(at(8, 14)),
            Err(LimitError::HourlyRequests { used: 3, limit: 3 })
        ));
        // A new hour opens a new bucket
        assert!(tracker.allow_request_at(at(8, 15)).is_ok());
    }

    #[test]
    fn test_monthly_cost_limit_spans_days() {
        let (_, tracker) = tracker();
        tracker
            .update_limits(&UsageLimits {
                monthly_cost_limit: 1.0,
                ..UsageLimits::default()
            })
            .unwrap();
        tracker.record_call_at(at(2, 8), "openai", 100, 0.5).unwrap();
        assert!(!tracker.check_usage_limits_at(at(3, 8)).near_monthly_cost_limit);
        tracker.record_call_at(at(3, 8), "openai", 100, 0.35).unwrap();
        assert!(tracker.check_usage_limits_at(at(3, 8)).near_monthly_cost_limit);
        tracker.record_call_at(at(4, 8), "openai", 100, 0.2).unwrap();
        let flags = tracker.check_usage_limits_at(at(4, 8));
        assert!(flags.monthly_cost_exceeded);
        assert!(flags.any_exceeded());
    }

    #[test]
    fn test_zero_limit_disables_check() {
        let limits = UsageLimits {
            daily_token_limit: 0,
            ..UsageLimits::default()
        };
        let daily = DailyUsage {
            tokens: 5_000_000,
            ..DailyUsage::empty(at(1, 0).date_naive())
        };
        let flags = evaluate_limits(&limits, &daily, &MonthlyUsage::empty("2026-10".into()), 0);
        assert!(!flags.daily_tokens_exceeded);
        assert!(!flags.near_daily_token_limit);
    }

    #[test]
    fn test_updating_limits_keeps_history() {
        let (_, tracker) = tracker();
        for _ in 0..5 {
            tracker.record_call_at(at(9, 9), "openai", 10, 0.0).unwrap();
        }
        tracker
            .update_limits(&UsageLimits {
                daily_request_limit: 5,
                ..UsageLimits::default()
            })
            .unwrap();
        assert_eq!(tracker.usage_on(at(9, 0).date_naive()).requests, 5);
        assert!(tracker.check_usage_limits_at(at(9, 9)).daily_requests_exceeded);
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let (_, tracker) = tracker();
        let bad = UsageLimits {
            near_limit_ratio: 1.5,
            ..UsageLimits::default()
        };
        assert!(tracker.update_limits(&bad).is_err());
        assert_eq!(tracker.limits(), UsageLimits::default());
    }

    #[test]
    fn test_reset_day_clears_day_and_month_share() {
        let (_, tracker) = tracker();
        tracker.record_call_at(at(10, 9), "openai", 100, 0.1).unwrap();
        tracker.record_call_at(at(11, 9), "openai", 50, 0.2).unwrap();

        tracker.reset_day(at(10, 0).date_naive()).unwrap();
        assert!(tracker.usage_on(at(10, 0).date_naive()).is_empty());
        let month = tracker.month_usage_at(at(11, 9));
        assert_eq!(month.requests, 1);
        assert_eq!(month.tokens, 50);
        assert!((month.cost - 0.2).abs() < 1e-9);
    }

    #[test]
    fn test_month_total_is_sum_of_days() {
        let (_, tracker) = tracker();
        tracker.record_call_at(at(10, 9), "openai", 100, 0.1).unwrap();
        tracker.record_call_at(at(11, 9), "openai", 50, 0.2).unwrap();
        let november = Utc.with_ymd_and_hms(2026, 11, 1, 9, 0, 0).unwrap();
        tracker.record_call_at(november, "openai", 7, 1.0).unwrap();

        // Retrying a reset must not take the day off the month twice
        tracker.reset_day(at(10, 0).date_naive()).unwrap();
        tracker.reset_day(at(10, 0).date_naive()).unwrap();

        let month = tracker.month_usage_at(at(20, 9));
        assert_eq!(month.month, "2026-10");
        assert_eq!(month.requests, 1);
        assert_eq!(month.tokens, 50);
        assert_eq!(tracker.month_usage_at(november).requests, 1);
    }

    #[test]
    fn test_history_includes_empty_days() {
        let (_, tracker) = tracker();
        tracker.record_call_at(at(12, 9), "openai", 1, 0.0).unwrap();
        let history = tracker.usage_history_at(at(14, 9), 3);
        assert_eq!(history.len(), 3);
        assert_eq!(history[0].date, at(14, 0).date_naive());
        assert!(history[1].is_empty());
        assert_eq!(history[2].requests, 1);
    }

    #[test]
    fn test_store_outage_degrades_to_defaults() {
        let (store, tracker) = tracker();
        tracker.record_call_at(at(13, 9), "openai", 1, 0.0).unwrap();
        store.set_unavailable(true);

        assert!(tracker.today_usage_at(at(13, 9)).is_empty());
        assert_eq!(tracker.limits(), UsageLimits::default());
        assert_eq!(tracker.check_usage_limits_at(at(13, 9)), LimitFlags::default());
        assert!(tracker.record_call_at(at(13, 9), "openai", 1, 0.0).is_err());
    }

    #[test]
    fn test_display_lists_providers() {
        let (_, tracker) = tracker();
        let daily = tracker.record_call_at(at(15, 9), "openai", 2500, 0.05).unwrap();
        let line = daily.display();
        assert!(line.starts_with("2026-10-15: 1 requests"));
        assert!(line.contains("2.5K tokens"));
        assert!(line.contains("(openai 1)"));
    }
}
