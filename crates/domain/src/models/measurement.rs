//! Measurement domain model.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Grams are canonical; kilograms and pounds are derived at read time.
pub const GRAMS_PER_KILOGRAM: f64 = 1000.0;
pub const POUNDS_PER_KILOGRAM: f64 = 2.20462;

/// A single stored weigh-in.
///
/// Unique per (scale MAC, scale-assigned measurement id); immutable after
/// insert. Re-uploads of the same id are deduplicated by the pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct Measurement {
    pub id: i64,
    pub scale_mac: String,
    pub measurement_id: i64,
    pub weight_grams: i64,
    pub impedance: i32,
    pub fat_raw_1: i32,
    pub fat_raw_2: i32,
    pub covariance: i32,
    pub body_fat_percent: Option<f32>,
    /// Scale-clock timestamp as sent on the wire (Unix seconds).
    pub timestamp_raw: i64,
    /// The same instant as a datetime, for ordering and display.
    pub timestamp: DateTime<Utc>,
    pub user_slot: i16,
    pub is_guest: bool,
    pub received_at: DateTime<Utc>,
}

impl Measurement {
    pub fn weight_kg(&self) -> f64 {
        self.weight_grams as f64 / GRAMS_PER_KILOGRAM
    }

    pub fn weight_lbs(&self) -> f64 {
        self.weight_kg() * POUNDS_PER_KILOGRAM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Measurement {
        Measurement {
            id: 1,
            scale_mac: "AA:BB:CC:DD:EE:FF".to_string(),
            measurement_id: 1,
            weight_grams: 75_300,
            impedance: 520,
            fat_raw_1: 370,
            fat_raw_2: 370,
            covariance: 12,
            body_fat_percent: Some(37.0),
            timestamp_raw: 1_705_315_840,
            timestamp: Utc::now(),
            user_slot: 1,
            is_guest: false,
            received_at: Utc::now(),
        }
    }

    #[test]
    fn derived_units() {
        let m = sample();
        assert!((m.weight_kg() - 75.3).abs() < 1e-9);
        assert!((m.weight_lbs() - 75.3 * 2.20462).abs() < 1e-6);
    }

    #[test]
    fn guest_measurement() {
        let mut m = sample();
        m.user_slot = 0;
        m.is_guest = true;
        assert!(m.is_guest);
    }
}
