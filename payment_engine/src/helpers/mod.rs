use chrono::{DateTime, Utc};
use rand::Rng;

/// Characters used in invoice suffixes. 0/O/1/I are left out to keep the numbers unambiguous when
/// read back over the phone.
const INVOICE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Generate a fresh invoice number, e.g. `INV-20260827-K7Q2MX`. Generated once per order at
/// creation time; reconciliation never regenerates an invoice number that is already set.
pub fn new_invoice_number(now: DateTime<Utc>) -> String {
    let mut rng = rand::thread_rng();
    let suffix: String =
        (0..6).map(|_| INVOICE_ALPHABET[rng.gen_range(0..INVOICE_ALPHABET.len())] as char).collect();
    format!("INV-{}-{suffix}", now.format("%Y%m%d"))
}
