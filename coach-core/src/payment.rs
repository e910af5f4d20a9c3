use crate::text_enum;

text_enum! {
    pub enum PaymentStatus {
        Pending => "pending",
        Completed => "completed",
        Failed => "failed",
        Refunded => "refunded",
    }
}

text_enum! {
    pub enum PaymentMethod {
        Card => "card",
        Upi => "upi",
        Netbanking => "netbanking",
        Wallet => "wallet",
    }
}
