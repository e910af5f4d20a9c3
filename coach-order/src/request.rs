use std::collections::HashSet;

use chrono::NaiveDate;
use coach_catalog::StopPoint;
use coach_core::payment::PaymentMethod;
use coach_core::{EngineError, EngineResult};
use serde::Deserialize;
use uuid::Uuid;

use crate::models::SeatAssignment;

pub const MIN_PASSENGER_AGE: u8 = 1;
pub const MAX_PASSENGER_AGE: u8 = 120;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReserveRequest {
    pub bus_id: Uuid,
    pub route_id: Uuid,
    pub journey_date: NaiveDate,
    pub seats: Vec<SeatAssignment>,
    #[serde(default)]
    pub boarding_point: Option<StopPoint>,
    #[serde(default)]
    pub dropping_point: Option<StopPoint>,
}

impl ReserveRequest {
    /// Shape checks that need no store access.
    pub fn validate(&self) -> EngineResult<()> {
        if self.seats.is_empty() {
            return Err(EngineError::Validation("At least one seat is required".to_string()));
        }

        let mut seen = HashSet::new();
        for seat in &self.seats {
            if seat.seat_number.trim().is_empty() {
                return Err(EngineError::Validation("Seat number is required".to_string()));
            }
            if !seen.insert(seat.seat_number.as_str()) {
                return Err(EngineError::Validation(format!(
                    "Seat {} is listed more than once",
                    seat.seat_number
                )));
            }
            if seat.passenger_name.trim().is_empty() {
                return Err(EngineError::Validation("Passenger name is required".to_string()));
            }
            if !(MIN_PASSENGER_AGE..=MAX_PASSENGER_AGE).contains(&seat.passenger_age) {
                return Err(EngineError::Validation(format!(
                    "Passenger age must be between {} and {}",
                    MIN_PASSENGER_AGE, MAX_PASSENGER_AGE
                )));
            }
        }

        if let Some(point) = &self.boarding_point {
            point.validate()?;
        }
        if let Some(point) = &self.dropping_point {
            point.validate()?;
        }
        Ok(())
    }

    pub fn seat_numbers(&self) -> impl Iterator<Item = &str> {
        self.seats.iter().map(|s| s.seat_number.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CancelRequest {
    #[serde(default)]
    pub reason: Option<String>,
}
