use chrono::{DateTime, Utc};
use rand::Rng;

const BASE36: &[u8; 36] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Upper-case base36 rendering of an unsigned integer.
pub fn base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(BASE36[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Human-readable booking reference: `BKG` + base36(epoch millis) + 5 random
/// base36 characters, all upper case.
pub fn booking_code(now: DateTime<Utc>) -> String {
    let millis = now.timestamp_millis().max(0) as u64;
    let mut rng = rand::thread_rng();
    let suffix: String = (0..5)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect();
    format!("BKG{}{}", base36(millis), suffix)
}

/// Placeholder transaction reference used when the payment provider did not
/// send one. Millisecond resolution only; not collision free.
pub fn fallback_transaction_id(now: DateTime<Utc>) -> String {
    format!("TXN{}", now.timestamp_millis())
}
