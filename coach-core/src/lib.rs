pub mod calendar;
pub mod clock;
pub mod identity;
pub mod payment;
pub mod search;
pub mod text_enum;

/// Failures raised by store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store refused to confirm seats that another booking already holds
    /// on the same trip.
    #[error("Seats {} are already booked", .0.join(", "))]
    SeatsTaken(Vec<String>),
    #[error("Duplicate record: {0}")]
    Duplicate(String),
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Every way a booking, catalogue or search operation can fail.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("Seats {} are already booked", .0.join(", "))]
    SeatConflict(Vec<String>),
    #[error("Invalid seat numbers: {}", .0.join(", "))]
    InvalidSeat(Vec<String>),
    #[error("{0}")]
    Forbidden(String),
    #[error("Booking is already cancelled")]
    AlreadyCancelled,
    #[error("Cannot cancel past bookings")]
    JourneyElapsed,
    #[error("Payment already completed")]
    AlreadyPaid,
    #[error("Storage failure: {0}")]
    Store(StoreError),
}

/// HTTP-style class of a failure, used by transports to pick a status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusClass {
    BadRequest,
    Forbidden,
    NotFound,
    Internal,
}

impl EngineError {
    pub fn status_class(&self) -> StatusClass {
        match self {
            EngineError::NotFound(_) => StatusClass::NotFound,
            EngineError::Forbidden(_) => StatusClass::Forbidden,
            EngineError::Validation(_)
            | EngineError::SeatConflict(_)
            | EngineError::InvalidSeat(_)
            | EngineError::AlreadyCancelled
            | EngineError::JourneyElapsed
            | EngineError::AlreadyPaid => StatusClass::BadRequest,
            EngineError::Store(_) => StatusClass::Internal,
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::SeatsTaken(seats) => EngineError::SeatConflict(seats),
            StoreError::Duplicate(msg) => EngineError::Validation(msg),
            other => EngineError::Store(other),
        }
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
pub type StoreResult<T> = Result<T, StoreError>;
