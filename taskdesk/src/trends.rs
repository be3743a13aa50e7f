//! Trend series bucketing for the analytics charts

use crate::api::models::TrendPoint;
use crate::config::{DAILY_RESOLUTION_MAX_DAYS, TREND_BUCKET_DAYS};

/// Daily points for windows up to 30 days, weekly rollups beyond that.
///
/// Buckets are consecutive runs of 7 points starting at index 0, not
/// calendar weeks. Each bucket carries the date of its first point and the
/// sums of its points; a shorter final bucket is kept. Input is expected in
/// ascending date order and is not re-sorted.
pub fn aggregate(points: &[TrendPoint], window_days: u32) -> Vec<TrendPoint> {
    if window_days <= DAILY_RESOLUTION_MAX_DAYS {
        return points.to_vec();
    }

    points
        .chunks(TREND_BUCKET_DAYS)
        .map(|chunk| TrendPoint {
            date: chunk[0].date,
            created: chunk.iter().map(|p| p.created).sum(),
            completed: chunk.iter().map(|p| p.completed).sum(),
        })
        .collect()
}
