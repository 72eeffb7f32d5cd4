//! Transformer turns ratio: expected ratio from the nameplate and percent
//! deviation of measured phase-pair ratios.

use super::parse_number;

/// Deviations at or beyond this magnitude (in percent) fail.
pub const DEVIATION_LIMIT_PERCENT: f64 = 0.501;

pub const PASS: &str = "PASS";
pub const FAIL: &str = "FAIL";

// ---

/// Resolve the nameplate voltage for a 1-based tap.
///
/// An explicit, non-blank override wins; otherwise the tap voltage table is
/// consulted. Unknown taps resolve to blank.
pub fn resolve_nameplate_voltage(tap: usize, override_voltage: &str, tap_voltages: &[String]) -> String {
    // ---
    if !override_voltage.trim().is_empty() {
        return override_voltage.trim().to_string();
    }
    tap.checked_sub(1)
        .and_then(|idx| tap_voltages.get(idx))
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

/// Expected ratio, `nameplate / secondary`, to three decimals.
pub fn calculated_ratio(nameplate_voltage: &str, secondary_voltage: &str) -> String {
    // ---
    let (Some(primary), Some(secondary)) =
        (parse_number(nameplate_voltage), parse_number(secondary_voltage))
    else {
        return String::new();
    };
    if secondary == 0.0 {
        return String::new();
    }
    format!("{:.3}", primary / secondary)
}

/// Percent deviation of a measured ratio from the calculated one.
pub fn deviation(measured: &str, calculated: &str) -> String {
    // ---
    let (Some(m), Some(c)) = (parse_number(measured), parse_number(calculated)) else {
        return String::new();
    };
    if c == 0.0 {
        return String::new();
    }
    format!("{:.3}", (m - c) / c * 100.0)
}

/// Classify a formatted deviation.
///
/// The decision is made on the displayed (rounded) value so that what the
/// technician sees and the verdict always agree.
pub fn pass_fail(deviation: &str) -> String {
    match parse_number(deviation) {
        Some(d) if d.abs() < DEVIATION_LIMIT_PERCENT => PASS.to_string(),
        Some(_) => FAIL.to_string(),
        None => String::new(),
    }
}
