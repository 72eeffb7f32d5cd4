//! Insulation resistance corrections and ratio checks.
//!
//! Raw megohm readings arrive as user-entered strings. Everything here
//! degrades to a blank string on bad input instead of failing, since partial
//! input is normal while a technician is still typing.

use super::parse_number;

/// Default minimum for DAR/PI before a winding is considered acceptable.
pub const DEFAULT_MINIMUM_RATIO: f64 = 1.0;

pub const ACCEPTABLE_YES: &str = "Yes";
pub const ACCEPTABLE_NO: &str = "No";

// ---

/// Apply a temperature correction factor to a raw reading.
///
/// Off-scale readings written as `"> 2000"` or `"< 0.5"` pass through
/// untouched. Blank or unparsable input yields a blank result.
pub fn corrected_reading(raw: &str, tcf: f64) -> String {
    // ---
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    if is_off_scale(trimmed) {
        return raw.to_string();
    }
    match parse_number(trimmed) {
        Some(value) => format!("{:.2}", value * tcf),
        None => String::new(),
    }
}

/// Divide two readings, formatted to two decimals.
///
/// Blank when either side is non-numeric or the denominator is zero.
pub fn ratio(numerator: &str, denominator: &str) -> String {
    // ---
    let (Some(n), Some(d)) = (parse_number(numerator), parse_number(denominator)) else {
        return String::new();
    };
    if d == 0.0 {
        return String::new();
    }
    format!("{:.2}", n / d)
}

/// Decide whether a set of DAR/PI values is acceptable.
///
/// Blank entries are ignored. Returns `"Yes"` only if at least one value is
/// present and every present value is strictly above `minimum`.
pub fn acceptable<'a, I>(ratios: I, minimum: f64) -> &'static str
where
    I: IntoIterator<Item = &'a str>,
{
    // ---
    let mut present = 0usize;
    for value in ratios {
        if value.trim().is_empty() {
            continue;
        }
        match parse_number(value) {
            Some(v) if v > minimum => present += 1,
            _ => return ACCEPTABLE_NO,
        }
    }
    if present > 0 {
        ACCEPTABLE_YES
    } else {
        ACCEPTABLE_NO
    }
}

fn is_off_scale(trimmed: &str) -> bool {
    trimmed.starts_with('>') || trimmed.starts_with('<')
}
