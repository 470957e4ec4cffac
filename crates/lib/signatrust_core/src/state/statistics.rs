//! Certification statistics: cooperator distribution and growth over time.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, TimeDelta, Utc};
use serde_json::Value;

use crate::error::ApiResult;
use crate::models::QueryParams;
use crate::service::StatisticsService;

/// Default growth window: the last half year.
pub const DEFAULT_WINDOW_HOURS: i64 = 365 * 24 / 2;
/// Longest growth window accepted: fifty years.
pub const MAX_WINDOW_HOURS: i64 = 50 * 366 * 24;

/// Bucket size of the growth series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountWay {
    Day,
    Week,
    #[default]
    Month,
}

impl fmt::Display for CountWay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CountWay::Day => "day",
            CountWay::Week => "week",
            CountWay::Month => "month",
        })
    }
}

impl FromStr for CountWay {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(CountWay::Day),
            "week" => Ok(CountWay::Week),
            "month" => Ok(CountWay::Month),
            other => Err(format!("unsupported count way '{other}'")),
        }
    }
}

/// Time range and bucket of the growth query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GrowthWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub count_way: CountWay,
}

impl GrowthWindow {
    /// Window of `hours` ending at `end`. `None` unless `hours` is positive
    /// and the start is a representable date.
    pub fn ending_at(end: DateTime<Utc>, hours: i64, count_way: CountWay) -> Option<Self> {
        if hours <= 0 {
            return None;
        }
        let start = TimeDelta::try_hours(hours).and_then(|len| end.checked_sub_signed(len))?;
        Some(Self {
            start,
            end,
            count_way,
        })
    }

    pub fn length(&self) -> Duration {
        self.end - self.start
    }

    /// `startTime`/`endTime` in epoch milliseconds plus `countWay`.
    pub fn params(&self) -> QueryParams {
        QueryParams::new()
            .with("startTime", self.start.timestamp_millis())
            .with("endTime", self.end.timestamp_millis())
            .with("countWay", self.count_way)
    }
}

impl Default for GrowthWindow {
    fn default() -> Self {
        let end = Utc::now();
        Self {
            start: end - Duration::hours(DEFAULT_WINDOW_HOURS),
            end,
            count_way: CountWay::default(),
        }
    }
}

/// Last statistics fetched for the dashboard.
#[derive(Debug, Clone, Default)]
pub struct StatisticsState {
    pub window: GrowthWindow,
    by_cooperator: Option<Value>,
    growth: Option<Value>,
}

impl StatisticsState {
    pub fn new(window: GrowthWindow) -> Self {
        Self {
            window,
            by_cooperator: None,
            growth: None,
        }
    }

    pub fn by_cooperator(&self) -> Option<&Value> {
        self.by_cooperator.as_ref()
    }

    pub fn growth(&self) -> Option<&Value> {
        self.growth.as_ref()
    }

    /// Replaces the window; the previous growth series no longer applies.
    pub fn set_window(&mut self, window: GrowthWindow) {
        self.window = window;
        self.growth = None;
    }

    pub async fn fetch_cooperators(&mut self, svc: &dyn StatisticsService) -> ApiResult<()> {
        self.by_cooperator = Some(svc.count_by_cooperator().await?);
        Ok(())
    }

    pub async fn fetch_growth(&mut self, svc: &dyn StatisticsService) -> ApiResult<()> {
        let params = self.window.params();
        self.growth = Some(svc.count_by_increase(&params).await?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn default_window_is_half_a_year_by_month() {
        let w = GrowthWindow::default();
        assert_eq!(w.length(), Duration::hours(4380));
        assert_eq!(w.count_way, CountWay::Month);
    }

    #[test]
    fn params_are_epoch_millis() {
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let w = GrowthWindow::ending_at(end, 24, CountWay::Day).unwrap();
        let p = w.params();
        assert_eq!(p.get("endTime"), Some("1704153600000"));
        assert_eq!(p.get("startTime"), Some("1704067200000"));
        assert_eq!(p.get("countWay"), Some("day"));
    }

    #[test]
    fn window_rejects_lengths_outside_the_calendar() {
        let end = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        assert!(GrowthWindow::ending_at(end, i64::MAX, CountWay::Day).is_none());
        assert!(GrowthWindow::ending_at(end, i64::MAX / 3_600_000, CountWay::Day).is_none());
        assert!(GrowthWindow::ending_at(end, 0, CountWay::Day).is_none());
        assert!(GrowthWindow::ending_at(end, -5, CountWay::Day).is_none());

        let longest = GrowthWindow::ending_at(end, MAX_WINDOW_HOURS, CountWay::Month).unwrap();
        assert_eq!(longest.length(), Duration::hours(MAX_WINDOW_HOURS));
    }

    struct FakeStats {
        seen: Mutex<Vec<QueryParams>>,
    }

    #[async_trait]
    impl StatisticsService for FakeStats {
        async fn count_by_cooperator(&self) -> ApiResult<Value> {
            Ok(serde_json::json!({"metrics": ["count"], "acme": [{"sig": "ca", "value": [3]}]}))
        }

        async fn count_by_increase(&self, params: &QueryParams) -> ApiResult<Value> {
            self.seen.lock().unwrap().push(params.clone());
            Ok(serde_json::json!([{"month": "2024-01", "count": 2}]))
        }
    }

    #[tokio::test]
    async fn fetch_growth_uses_window() {
        let svc = FakeStats {
            seen: Mutex::new(vec![]),
        };
        let mut state = StatisticsState::new(GrowthWindow::ending_at(Utc::now(), 48, CountWay::Week).unwrap());
        state.fetch_growth(&svc).await.unwrap();
        state.fetch_cooperators(&svc).await.unwrap();

        assert!(state.growth().is_some());
        assert!(state.by_cooperator().is_some());
        assert_eq!(svc.seen.lock().unwrap()[0].get("countWay"), Some("week"));

        state.set_window(GrowthWindow::default());
        assert!(state.growth().is_none());
    }
}
