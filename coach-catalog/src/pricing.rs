use coach_core::{EngineError, EngineResult};

/// Fare for a booking: the route's per-seat price times the seat count.
///
/// Amounts are integer minor units, so the product is exact; overflow is
/// reported instead of wrapping.
pub fn fare_total(price_per_seat: i64, seat_count: usize) -> EngineResult<i64> {
    if price_per_seat < 0 {
        return Err(EngineError::Validation("Route price cannot be negative".to_string()));
    }
    i64::try_from(seat_count)
        .ok()
        .and_then(|count| price_per_seat.checked_mul(count))
        .ok_or_else(|| EngineError::Validation("Booking amount is too large".to_string()))
}
