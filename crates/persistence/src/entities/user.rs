//! User profile entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the users table.
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: i64,
    pub name: String,
    pub scale_slot: i16,
    pub height_mm: i32,
    pub age: i16,
    pub gender: i16,
    pub min_weight_grams: i64,
    pub max_weight_grams: i64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<UserEntity> for domain::models::UserProfile {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name,
            scale_slot: entity.scale_slot,
            height_mm: entity.height_mm,
            age: entity.age,
            gender: entity.gender,
            min_weight_grams: entity.min_weight_grams,
            max_weight_grams: entity.max_weight_grams,
            created_at: entity.created_at,
        }
    }
}
