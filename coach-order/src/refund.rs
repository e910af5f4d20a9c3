use chrono::{DateTime, Duration, Utc};

/// One step of the refund schedule: cancelling at least `notice` before
/// the journey day begins returns `percentage` of the fare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefundBand {
    pub notice: Duration,
    pub percentage: u8,
}

/// Tiered refund schedule. Bands are checked from the longest notice down;
/// anything shorter than the last band refunds nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefundPolicy {
    bands: Vec<RefundBand>,
}

impl RefundPolicy {
    pub fn new(mut bands: Vec<RefundBand>) -> Self {
        bands.sort_by(|a, b| b.notice.cmp(&a.notice));
        for band in &mut bands {
            band.percentage = band.percentage.min(100);
        }
        Self { bands }
    }

    pub fn percentage(&self, notice: Duration) -> u8 {
        self.bands
            .iter()
            .find(|band| notice >= band.notice)
            .map(|band| band.percentage)
            .unwrap_or(0)
    }

    pub fn percentage_at(&self, journey_start: DateTime<Utc>, now: DateTime<Utc>) -> u8 {
        self.percentage(journey_start - now)
    }
}

impl Default for RefundPolicy {
    fn default() -> Self {
        Self::new(vec![
            RefundBand { notice: Duration::hours(24), percentage: 90 },
            RefundBand { notice: Duration::hours(12), percentage: 50 },
            RefundBand { notice: Duration::hours(6), percentage: 25 },
        ])
    }
}

/// `total * percentage / 100`, truncated. Never exceeds `total`.
pub fn refund_amount(total: i64, percentage: u8) -> i64 {
    let pct = i128::from(percentage.min(100));
    (i128::from(total) * pct / 100) as i64
}
