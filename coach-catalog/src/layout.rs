use chrono::{DateTime, Utc};
use coach_core::{text_enum, EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

text_enum! {
    pub enum LayoutKind {
        TwoByTwo => "2x2",
        TwoByThree => "2x3",
        OneByTwo => "1x2",
        TwoByOne => "2x1",
    }
}

text_enum! {
    pub enum SeatType {
        Seater => "seater",
        Sleeper => "sleeper",
    }
}

text_enum! {
    pub enum SeatPosition {
        Window => "window",
        Aisle => "aisle",
        Middle => "middle",
    }
}

text_enum! {
    pub enum Deck {
        Lower => "lower",
        Upper => "upper",
    }
}

impl Default for LayoutKind {
    fn default() -> Self {
        LayoutKind::TwoByTwo
    }
}

impl Default for SeatType {
    fn default() -> Self {
        SeatType::Seater
    }
}

impl Default for SeatPosition {
    fn default() -> Self {
        SeatPosition::Middle
    }
}

impl Default for Deck {
    fn default() -> Self {
        Deck::Lower
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatSpec {
    pub seat_number: String,
    pub row: u32,
    pub column: u32,
    #[serde(rename = "type", default)]
    pub seat_type: SeatType,
    #[serde(default)]
    pub position: SeatPosition,
    #[serde(default)]
    pub deck: Deck,
}

/// The physical seat map of one bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatLayout {
    pub id: Uuid,
    pub bus_id: Uuid,
    pub layout: LayoutKind,
    pub total_seats: u32,
    pub seats: Vec<SeatSpec>,
    pub created_at: DateTime<Utc>,
}

impl SeatLayout {
    pub fn new(
        bus_id: Uuid,
        layout: LayoutKind,
        total_seats: u32,
        seats: Vec<SeatSpec>,
        now: DateTime<Utc>,
    ) -> EngineResult<Self> {
        validate_seats(total_seats, &seats)?;
        Ok(Self {
            id: Uuid::new_v4(),
            bus_id,
            layout,
            total_seats,
            seats,
            created_at: now,
        })
    }

    pub fn seat_numbers(&self) -> HashSet<&str> {
        self.seats.iter().map(|s| s.seat_number.as_str()).collect()
    }

    /// Requested seats that are not part of this layout, in request order.
    pub fn unknown_seats<'a, I>(&self, requested: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let known = self.seat_numbers();
        requested
            .into_iter()
            .filter(|s| !known.contains(s))
            .map(str::to_string)
            .collect()
    }
}

/// Write-time invariant: one entry per seat, unique non-blank seat numbers.
pub fn validate_seats(total_seats: u32, seats: &[SeatSpec]) -> EngineResult<()> {
    if seats.len() != total_seats as usize {
        return Err(EngineError::Validation(
            "Total seats must match the number of seats in layout".to_string(),
        ));
    }
    let mut seen = HashSet::new();
    for seat in seats {
        if seat.seat_number.trim().is_empty() {
            return Err(EngineError::Validation("Seat number cannot be empty".to_string()));
        }
        if !seen.insert(seat.seat_number.as_str()) {
            return Err(EngineError::Validation(format!(
                "Duplicate seat number in layout: {}",
                seat.seat_number
            )));
        }
    }
    Ok(())
}
