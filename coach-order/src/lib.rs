pub mod admin;
pub mod availability;
pub mod engine;
pub mod locks;
pub mod memory;
pub mod models;
pub mod refund;
pub mod repository;
pub mod request;

#[cfg(test)]
mod fixtures;

pub use admin::{BackOffice, NewSeatLayout, SeatLayoutUpdate, Stats};
pub use availability::{Availability, BusDetails, RouteAvailability, SeatMap};
pub use engine::{BookingEngine, EngineSettings};
pub use memory::InMemoryStore;
pub use models::{Booking, BookingDetails, BookingStatus, CancellationReceipt, Gender, SeatAssignment};
pub use refund::RefundPolicy;
pub use repository::{BookingFilter, BookingStore, Stores};
pub use request::{CancelRequest, PaymentRequest, ReserveRequest};
