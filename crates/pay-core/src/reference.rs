//! Payment reference and id generation.
//!
//! References look like `PAY-20221234-1700000000-9F2C41AB`: prefix, up to
//! eight alphanumerics of the company number, unix seconds, and eight random
//! hex digits so two requests in the same second cannot collide.

use chrono::Utc;
use uuid::Uuid;

const COMPANY_FRAGMENT_LEN: usize = 8;

/// Generate a payment reference for a company
pub fn generate_reference(prefix: &str, company_number: &str) -> String {
    let fragment: String = company_number
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(COMPANY_FRAGMENT_LEN)
        .collect::<String>()
        .to_uppercase();

    let random = Uuid::new_v4().simple().to_string();
    let suffix = random[..8].to_uppercase();
    let timestamp = Utc::now().timestamp();

    if fragment.is_empty() {
        format!("{}-{}-{}", prefix, timestamp, suffix)
    } else {
        format!("{}-{}-{}-{}", prefix, fragment, timestamp, suffix)
    }
}

/// Generate a payment record id
pub fn generate_payment_id() -> String {
    format!("pay_{}", Uuid::new_v4().simple())
}
