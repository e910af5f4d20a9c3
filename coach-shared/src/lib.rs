pub mod codes;
pub mod pii;

pub use codes::{booking_code, fallback_transaction_id};
pub use pii::Masked;
