mod paise;

pub mod op;
mod secret;

pub use paise::{GstRate, Paise, DEFAULT_GST_RATE};
pub use secret::Secret;

/// Interpret an environment-variable style string as a boolean switch, falling back to the given
/// default when the variable is unset or contains something unrecognisable.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}
