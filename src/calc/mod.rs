//! Pure derivations used by the report forms.
//!
//! Nothing in here touches storage or returns errors; callers feed in the
//! current form values and get display-ready strings back.

pub mod insulation;
pub mod temperature;
pub mod turns_ratio;

pub use insulation::{acceptable, corrected_reading, ratio};
pub use temperature::{
    celsius_to_fahrenheit, correction_factor, fahrenheit_to_celsius, Temperature,
};
pub use turns_ratio::{calculated_ratio, deviation, pass_fail, resolve_nameplate_voltage};

// ---

/// Parse a user-entered number, rejecting blanks and non-finite values.
pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}
