use std::collections::HashSet;

/// Seats already held on one trip (bus + route + calendar day).
///
/// Always derived from the confirmed bookings of that trip at request time,
/// never stored or cached.
#[derive(Debug, Clone, Default)]
pub struct SeatInventory {
    booked: HashSet<String>,
    held: usize,
}

impl SeatInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the inventory from the seat-number lists of confirmed bookings.
    pub fn from_bookings<I, S>(seat_lists: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: IntoIterator<Item = String>,
    {
        let mut inventory = Self::new();
        for seats in seat_lists {
            for seat in seats {
                inventory.hold(seat);
            }
        }
        inventory
    }

    pub fn hold(&mut self, seat_number: String) {
        self.held += 1;
        self.booked.insert(seat_number);
    }

    pub fn is_booked(&self, seat_number: &str) -> bool {
        self.booked.contains(seat_number)
    }

    /// Every requested seat that is already held, in request order.
    pub fn conflicts<'a, I>(&self, requested: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        requested
            .into_iter()
            .filter(|s| self.booked.contains(*s))
            .map(str::to_string)
            .collect()
    }

    /// Number of seat assignments across all confirmed bookings.
    pub fn held_count(&self) -> usize {
        self.held
    }

    /// Seats left on a bus of the given capacity. Negative when a trip has been
    /// oversold (e.g. capacity reduced after sale).
    pub fn available(&self, total_seats: u32) -> i64 {
        i64::from(total_seats) - self.held as i64
    }
}
