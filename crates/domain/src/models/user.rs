//! User profile domain model.

use chrono::{DateTime, Utc};
use protocol::UserSlot;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::measurement::GRAMS_PER_KILOGRAM;

/// Number of profile slots the scale can display.
pub const SLOT_COUNT: i16 = 8;

/// An operator-created profile occupying one of the scale's eight slots.
///
/// Slots are unique among active profiles; deleting a profile frees its
/// slot. Gender uses the scale's encoding: 0 = female, 1 = male.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub scale_slot: i16,
    pub height_mm: i32,
    pub age: i16,
    pub gender: i16,
    pub min_weight_grams: i64,
    pub max_weight_grams: i64,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    /// The 13-byte wire block for this profile.
    pub fn to_wire_slot(&self) -> UserSlot {
        UserSlot {
            slot: self.scale_slot as u8,
            height_mm: self.height_mm as u16,
            age: self.age as u8,
            gender: self.gender as u8,
            min_weight_grams: self.min_weight_grams as u32,
            max_weight_grams: self.max_weight_grams as u32,
        }
    }
}

/// Operator input for creating a profile. Heights arrive in centimetres and
/// weights in kilograms; storage is millimetres and grams.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserParams {
    #[validate(length(min = 1, max = 20, message = "name must be 1 to 20 characters"))]
    pub name: String,

    #[validate(range(min = 50, max = 250, message = "height_cm must be between 50 and 250"))]
    pub height_cm: i32,

    #[validate(range(min = 1, max = 150, message = "age must be between 1 and 150"))]
    pub age: i16,

    #[validate(range(min = 0, max = 1, message = "gender must be 0 (female) or 1 (male)"))]
    #[serde(default)]
    pub gender: i16,

    #[validate(range(min = 10.0, max = 300.0, message = "min_weight_kg out of range"))]
    #[serde(default = "default_min_weight_kg")]
    pub min_weight_kg: f64,

    #[validate(range(min = 10.0, max = 500.0, message = "max_weight_kg out of range"))]
    #[serde(default = "default_max_weight_kg")]
    pub max_weight_kg: f64,
}

fn default_min_weight_kg() -> f64 {
    30.0
}

fn default_max_weight_kg() -> f64 {
    150.0
}

impl CreateUserParams {
    pub fn height_mm(&self) -> i32 {
        self.height_cm * 10
    }

    pub fn min_weight_grams(&self) -> i64 {
        (self.min_weight_kg * GRAMS_PER_KILOGRAM) as i64
    }

    pub fn max_weight_grams(&self) -> i64 {
        (self.max_weight_kg * GRAMS_PER_KILOGRAM) as i64
    }
}
