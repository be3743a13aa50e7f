//! Analytics service
//!
//! Dashboard data plus the chart-ready trend series and CSV export.

use crate::api::models::{OverviewData, PerformanceData, TrendPoint};
use crate::api::AnalyticsApi;
use crate::config::{MAX_TREND_DAYS, MIN_TREND_DAYS};
use crate::error::Result;
use crate::trends;
use std::path::Path;
use std::sync::Arc;

pub struct AnalyticsService<A: AnalyticsApi> {
    api: Arc<A>,
}

impl<A: AnalyticsApi> AnalyticsService<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }

    pub async fn overview(&self) -> Result<OverviewData> {
        self.api.overview().await
    }

    pub async fn performance(&self) -> Result<Vec<PerformanceData>> {
        self.api.performance().await
    }

    /// Daily points for the last `days` days, clamped to what the server accepts
    pub async fn trends(&self, days: u32) -> Result<Vec<TrendPoint>> {
        let days = clamp_days(days);
        tracing::debug!("Fetching {} day(s) of trends", days);
        self.api.trends(days).await
    }

    /// Trends as they should be charted: daily up to 30 days, weekly beyond
    pub async fn chart_trends(&self, days: u32) -> Result<Vec<TrendPoint>> {
        let days = clamp_days(days);
        let points = self.api.trends(days).await?;
        Ok(trends::aggregate(&points, days))
    }

    pub async fn export_csv(&self) -> Result<Vec<u8>> {
        tracing::info!("Exporting tasks as CSV");
        self.api.export_csv().await
    }

    /// Export and write the CSV to `path`, returning the number of bytes written
    pub async fn export_csv_to(&self, path: &Path) -> Result<usize> {
        let csv = self.export_csv().await?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        tokio::fs::write(path, &csv).await?;

        tracing::info!("Wrote {} bytes of CSV to {:?}", csv.len(), path);
        Ok(csv.len())
    }
}

fn clamp_days(days: u32) -> u32 {
    days.clamp(MIN_TREND_DAYS, MAX_TREND_DAYS)
}

/// Human-readable duration for an average completion time in hours
pub fn format_duration(hours: f64) -> String {
    if !hours.is_finite() || hours < 1.0 {
        return "< 1h".to_string();
    }

    let total = hours.round() as u64;
    if total < 24 {
        return format!("{}h", total);
    }

    let (days, rest) = (total / 24, total % 24);
    if rest > 0 {
        format!("{}d {}h", days, rest)
    } else {
        format!("{}d", days)
    }
}
