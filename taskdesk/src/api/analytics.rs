//! Analytics endpoints

use super::client::{ApiClient, RequestKind};
use super::models::{OverviewData, PerformanceData, TrendPoint};
use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait AnalyticsApi: Send + Sync {
    async fn overview(&self) -> Result<OverviewData>;

    async fn performance(&self) -> Result<Vec<PerformanceData>>;

    /// Daily points for the last `days` days, oldest first
    async fn trends(&self, days: u32) -> Result<Vec<TrendPoint>>;

    /// All tasks as CSV
    async fn export_csv(&self) -> Result<Vec<u8>>;
}

#[async_trait]
impl AnalyticsApi for ApiClient {
    async fn overview(&self) -> Result<OverviewData> {
        self.data(self.get("/analytics/overview"), RequestKind::Read)
            .await
    }

    async fn performance(&self) -> Result<Vec<PerformanceData>> {
        self.data(self.get("/analytics/performance"), RequestKind::Read)
            .await
    }

    async fn trends(&self, days: u32) -> Result<Vec<TrendPoint>> {
        let request = self.get("/analytics/trends").query(&[("days", days)]);
        self.data(request, RequestKind::Read).await
    }

    async fn export_csv(&self) -> Result<Vec<u8>> {
        self.bytes(self.get("/analytics/export"), RequestKind::Read)
            .await
    }
}
