//! Temperature conversion and insulation-resistance correction factors.
//!
//! Readings are normalized to a 20°C reference. The factor table is keyed by
//! whole degrees Celsius from -24 to 110 inclusive; anything outside that
//! range (or non-finite) maps to a factor of 1.

use serde::{Deserialize, Serialize};

const TABLE_MIN_C: i64 = -24;
const TABLE_MAX_C: i64 = 110;

/// Largest magnitude accepted on either scale.
pub const MAX_ABS_DEGREES: f64 = 10_000.0;

/// Stored Fahrenheit may differ from the value derived from Celsius by the
/// two one-decimal roundings without being treated as stale.
const SCALE_TOLERANCE_F: f64 = 0.2;

/// Correction factors, one per whole degree from -24°C to 110°C.
#[rustfmt::skip]
const CORRECTION_FACTORS: [f64; 135] = [
    0.054, 0.068, 0.082, 0.096, 0.11, 0.124, 0.138, 0.152,       // -24..=-17
    0.166, 0.18, 0.194, 0.208, 0.222, 0.236, 0.25, 0.264,        // -16..=-9
    0.278, 0.292, 0.306, 0.32, 0.336, 0.352, 0.368, 0.384,       // -8..=-1
    0.4, 0.42, 0.44, 0.46, 0.48, 0.5, 0.526, 0.552,              // 0..=7
    0.578, 0.604, 0.63, 0.666, 0.702, 0.738, 0.774, 0.81,        // 8..=15
    0.848, 0.886, 0.924, 0.962, 1.0, 1.05, 1.1, 1.15,            // 16..=23
    1.2, 1.25, 1.316, 1.382, 1.448, 1.514, 1.58, 1.664,          // 24..=31
    1.748, 1.832, 1.916, 2.0, 2.1, 2.2, 2.3, 2.4,                // 32..=39
    2.5, 2.63, 2.76, 2.89, 3.02, 3.15, 3.316, 3.482,             // 40..=47
    3.648, 3.814, 3.98, 4.184, 4.388, 4.592, 4.796, 5.0,         // 48..=55
    5.26, 5.52, 5.78, 6.04, 6.3, 6.62, 6.94, 7.26,               // 56..=63
    7.58, 7.9, 8.32, 8.74, 9.16, 9.58, 10.0, 10.52,              // 64..=71
    11.04, 11.56, 12.08, 12.6, 13.24, 13.88, 14.52, 15.16,       // 72..=79
    15.8, 16.64, 17.48, 18.32, 19.16, 20.0, 21.0, 22.0,          // 80..=87
    23.0, 24.0, 25.0, 26.32, 27.64, 28.96, 30.28, 31.6,          // 88..=95
    33.28, 34.96, 36.64, 38.32, 40.0, 42.0, 44.0, 46.0,          // 96..=103
    48.0, 50.0, 52.6, 55.2, 57.8, 60.4, 63.0,                    // 104..=110
];

// ---

/// Look up the temperature correction factor for a Celsius reading.
///
/// The input is rounded to the nearest whole degree first. Out-of-range and
/// non-finite inputs return 1.
pub fn correction_factor(celsius: f64) -> f64 {
    // ---
    if !celsius.is_finite() {
        return 1.0;
    }
    let key = celsius.round() as i64;
    if !(TABLE_MIN_C..=TABLE_MAX_C).contains(&key) {
        return 1.0;
    }
    CORRECTION_FACTORS[(key - TABLE_MIN_C) as usize]
}

/// °F → °C, rounded to one decimal for display.
pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    round1((fahrenheit - 32.0) * 5.0 / 9.0)
}

/// °C → °F, rounded to one decimal for display.
pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    round1(celsius * 9.0 / 5.0 + 32.0)
}

/// Whether a temperature can be stored and converted without overflow.
pub fn is_valid_degrees(value: f64) -> bool {
    value.is_finite() && value.abs() <= MAX_ABS_DEGREES
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

// ---

/// Ambient conditions recorded with a report.
///
/// Fields are public for serialization, but callers change temperatures only
/// through [`Temperature::set_fahrenheit`] and [`Temperature::set_celsius`] so
/// that both scales and the correction factor stay consistent.
///
/// Celsius is the canonical scale. Deserialized values are reconciled on the
/// way in, so a payload carrying only one scale still yields a consistent
/// temperature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "StoredTemperature")]
pub struct Temperature {
    // ---
    pub fahrenheit: f64,
    pub celsius: f64,
    pub correction_factor: f64,
    pub humidity: Option<f64>,
}

impl Default for Temperature {
    fn default() -> Self {
        Temperature {
            fahrenheit: 68.0,
            celsius: 20.0,
            correction_factor: correction_factor(20.0),
            humidity: None,
        }
    }
}

impl Temperature {
    // ---
    pub fn set_fahrenheit(&mut self, fahrenheit: f64) {
        self.fahrenheit = fahrenheit;
        self.celsius = fahrenheit_to_celsius(fahrenheit);
        self.correction_factor = correction_factor(self.celsius);
    }

    pub fn set_celsius(&mut self, celsius: f64) {
        self.celsius = celsius;
        self.fahrenheit = celsius_to_fahrenheit(celsius);
        self.correction_factor = correction_factor(celsius);
    }

    /// Bring Fahrenheit and the correction factor back in line with Celsius.
    ///
    /// Fahrenheit is kept when it already agrees with Celsius within
    /// rounding, so a value the user typed is not rewritten.
    pub fn reconcile(&mut self) {
        // ---
        if !is_valid_degrees(self.celsius) {
            self.celsius = if is_valid_degrees(self.fahrenheit) {
                fahrenheit_to_celsius(self.fahrenheit)
            } else {
                Temperature::default().celsius
            };
        }
        let expected = celsius_to_fahrenheit(self.celsius);
        if !((expected - self.fahrenheit).abs() <= SCALE_TOLERANCE_F) {
            self.fahrenheit = expected;
        }
        self.correction_factor = correction_factor(self.celsius);
    }
}

/// Wire form of [`Temperature`]; every field may be absent.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StoredTemperature {
    fahrenheit: Option<f64>,
    celsius: Option<f64>,
    humidity: Option<f64>,
}

impl From<StoredTemperature> for Temperature {
    fn from(stored: StoredTemperature) -> Self {
        // ---
        let celsius = stored.celsius.filter(|c| is_valid_degrees(*c));
        let fahrenheit = stored.fahrenheit.filter(|f| is_valid_degrees(*f));

        let mut t = Temperature {
            humidity: stored.humidity,
            ..Temperature::default()
        };
        match (celsius, fahrenheit) {
            (Some(c), Some(f)) => {
                t.celsius = c;
                t.fahrenheit = f;
                t.reconcile();
            }
            (Some(c), None) => t.set_celsius(c),
            (None, Some(f)) => t.set_fahrenheit(f),
            (None, None) => {}
        }
        t
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn test_reference_temperature_is_unity() {
        assert_eq!(correction_factor(20.0), 1.0);
        assert_eq!(correction_factor(19.6), 1.0);
        assert_eq!(correction_factor(20.4), 1.0);
    }

    #[test]
    fn test_table_bounds() {
        // ---
        assert_eq!(correction_factor(-24.0), 0.054);
        assert_eq!(correction_factor(110.0), 63.0);
        assert_eq!(CORRECTION_FACTORS.len() as i64, TABLE_MAX_C - TABLE_MIN_C + 1);
    }

    #[test]
    fn test_out_of_range_defaults_to_one() {
        // ---
        for c in (-200..-24).chain(111..300) {
            assert_eq!(correction_factor(c as f64), 1.0, "celsius {c}");
        }
        assert_eq!(correction_factor(f64::NAN), 1.0);
        assert_eq!(correction_factor(f64::INFINITY), 1.0);
    }

    #[test]
    fn test_factor_stable_across_round_trip() {
        // ---
        for c in TABLE_MIN_C..=TABLE_MAX_C {
            let c = c as f64;
            let back = fahrenheit_to_celsius(celsius_to_fahrenheit(c));
            assert!((back - c).abs() < 0.1, "{c} came back as {back}");
            assert_eq!(correction_factor(back), correction_factor(c));
        }
    }

    #[test]
    fn test_conversions() {
        assert_eq!(fahrenheit_to_celsius(68.0), 20.0);
        assert_eq!(fahrenheit_to_celsius(70.0), 21.1);
        assert_eq!(celsius_to_fahrenheit(25.0), 77.0);
        assert_eq!(celsius_to_fahrenheit(-40.0), -40.0);
    }

    #[test]
    fn test_setters_keep_scales_consistent() {
        // ---
        let mut t = Temperature::default();

        t.set_fahrenheit(77.0);
        assert_eq!(t.celsius, 25.0);
        assert_eq!(t.correction_factor, 1.25);

        t.set_celsius(30.0);
        assert_eq!(t.fahrenheit, 86.0);
        assert_eq!(t.correction_factor, 1.58);
    }

    #[test]
    fn test_reconcile_overrides_stale_value() {
        let mut t = Temperature {
            fahrenheit: 86.0,
            celsius: 30.0,
            correction_factor: 0.0,
            humidity: Some(40.0),
        };
        t.reconcile();
        assert_eq!(t.correction_factor, 1.58);
        assert_eq!(t.fahrenheit, 86.0);
    }

    #[test]
    fn test_reconcile_rederives_fahrenheit_from_celsius() {
        // ---
        let mut t = Temperature {
            fahrenheit: 68.0,
            celsius: 30.0,
            correction_factor: 1.0,
            humidity: None,
        };
        t.reconcile();
        assert_eq!(t.fahrenheit, 86.0);
        assert_eq!(t.correction_factor, 1.58);

        // Typed Fahrenheit survives the one-decimal round trip.
        t.set_fahrenheit(60.0);
        t.reconcile();
        assert_eq!(t.fahrenheit, 60.0);
        assert_eq!(t.celsius, 15.6);
    }

    #[test]
    fn test_deserialize_single_scale() {
        // ---
        let t: Temperature = serde_json::from_value(serde_json::json!({"fahrenheit": 86.0})).unwrap();
        assert_eq!(t.celsius, 30.0);
        assert_eq!(t.correction_factor, 1.58);

        let t: Temperature = serde_json::from_value(serde_json::json!({"celsius": 15.0})).unwrap();
        assert_eq!(t.fahrenheit, 59.0);
        assert_eq!(t.correction_factor, 0.81);

        let t: Temperature = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(t, Temperature::default());
    }

    #[test]
    fn test_deserialize_ignores_stale_factor_and_bad_values() {
        // ---
        let t: Temperature = serde_json::from_value(serde_json::json!({
            "fahrenheit": 68.0,
            "celsius": 30.0,
            "correction_factor": 1.0,
            "humidity": 55.0
        }))
        .unwrap();
        assert_eq!(t.fahrenheit, 86.0);
        assert_eq!(t.correction_factor, 1.58);
        assert_eq!(t.humidity, Some(55.0));

        let t: Temperature =
            serde_json::from_value(serde_json::json!({"fahrenheit": 59.0, "celsius": 1e300})).unwrap();
        assert_eq!(t.celsius, 15.0);
    }

    #[test]
    fn test_valid_degrees() {
        assert!(is_valid_degrees(-40.0));
        assert!(is_valid_degrees(MAX_ABS_DEGREES));
        assert!(!is_valid_degrees(1e308));
        assert!(!is_valid_degrees(f64::NAN));
    }
}
