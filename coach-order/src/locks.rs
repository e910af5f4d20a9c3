use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use uuid::Uuid;

/// Identifies one trip: a bus on a route on a calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TripKey {
    pub bus_id: Uuid,
    pub route_id: Uuid,
    pub journey_date: NaiveDate,
}

/// Hands out one async mutex per trip so that the read-check-write of a
/// reservation runs alone for that trip. Trips on different keys proceed in
/// parallel.
#[derive(Default)]
pub struct ReservationLocks {
    slots: Mutex<HashMap<TripKey, Arc<AsyncMutex<()>>>>,
}

impl ReservationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, key: TripKey) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = match self.slots.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            // Drop slots nobody holds or waits on.
            slots.retain(|_, m| Arc::strong_count(m) > 1);
            slots.entry(key).or_default().clone()
        };
        slot.lock_owned().await
    }

}
