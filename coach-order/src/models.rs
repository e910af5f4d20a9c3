use chrono::{DateTime, NaiveDate, Utc};
use coach_catalog::{Bus, Route, StopPoint};
use coach_core::calendar::DayWindow;
use coach_core::payment::{PaymentMethod, PaymentStatus};
use coach_core::text_enum;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

text_enum! {
    /// Booking lifecycle. `Cancelled` is terminal; `Completed` is only set by
    /// post-journey processing outside this engine.
    pub enum BookingStatus {
        Confirmed => "confirmed",
        Cancelled => "cancelled",
        Completed => "completed",
    }
}

text_enum! {
    pub enum Gender {
        Male => "Male",
        Female => "Female",
        Other => "Other",
    }
}

/// One passenger on one seat.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeatAssignment {
    pub seat_number: String,
    pub passenger_name: String,
    pub passenger_age: u8,
    pub passenger_gender: Gender,
}

/// A confirmed claim by one user on seats of one trip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub user_id: Uuid,
    pub bus_id: Uuid,
    pub route_id: Uuid,
    pub journey_date: NaiveDate,
    pub departs_at: DateTime<Utc>,
    pub seats: Vec<SeatAssignment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boarding_point: Option<StopPoint>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dropping_point: Option<StopPoint>,
    pub total_amount: i64,
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub booking_status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<Utc>>,
    pub refund_amount: i64,
    pub booking_id: String,
    pub created_at: DateTime<Utc>,
}

impl Booking {
    pub fn seat_numbers(&self) -> impl Iterator<Item = &str> {
        self.seats.iter().map(|s| s.seat_number.as_str())
    }

    pub fn is_confirmed(&self) -> bool {
        self.booking_status == BookingStatus::Confirmed
    }

    pub fn is_cancelled(&self) -> bool {
        self.booking_status == BookingStatus::Cancelled
    }

    pub fn is_paid(&self) -> bool {
        self.payment_status == PaymentStatus::Completed
    }

    /// Midnight UTC of the journey date. Refund notice and the past-journey
    /// check count from here, not from the scheduled departure.
    pub fn journey_starts_at(&self) -> DateTime<Utc> {
        DayWindow::for_date(self.journey_date).opens_at()
    }
}

/// A booking together with the bus and route it was made on. Either may be
/// absent for old bookings whose bus or route has since been removed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetails {
    #[serde(flatten)]
    pub booking: Booking,
    pub bus: Option<Bus>,
    pub route: Option<Route>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancellationReceipt {
    pub booking: Booking,
    pub refund_amount: i64,
    pub refund_percentage: u8,
}
