//! User directory repository.

use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use crate::entities::UserEntity;
use domain::models::user::SLOT_COUNT;

const USER_COLUMNS: &str = "id, name, scale_slot, height_mm, age, gender, \
                            min_weight_grams, max_weight_grams, active, created_at";

/// Why a profile could not be created.
#[derive(Debug, Error)]
pub enum CreateUserError {
    #[error("all scale slots are taken")]
    NoFreeSlot,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Repository for user profile rows.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// All active profiles in slot order.
    pub async fn list_active(&self) -> Result<Vec<UserEntity>, sqlx::Error> {
        sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE active ORDER BY scale_slot ASC"
        ))
        .fetch_all(&self.pool)
        .await
    }

    /// Same listing on a caller-owned connection, so the upload pipeline
    /// sees the directory as of its own transaction.
    pub async fn list_active_on(
        &self,
        conn: &mut PgConnection,
    ) -> Result<Vec<UserEntity>, sqlx::Error> {
        sqlx::query_as::<_, UserEntity>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE active ORDER BY scale_slot ASC"
        ))
        .fetch_all(conn)
        .await
    }

    /// Create a profile in the lowest free slot.
    ///
    /// The partial unique index on (scale_slot) WHERE active backstops the
    /// slot choice against concurrent creates; losing that race surfaces as
    /// a database error rather than silent double occupancy.
    pub async fn create(
        &self,
        name: &str,
        height_mm: i32,
        age: i16,
        gender: i16,
        min_weight_grams: i64,
        max_weight_grams: i64,
    ) -> Result<UserEntity, CreateUserError> {
        let taken: Vec<(i16,)> =
            sqlx::query_as("SELECT scale_slot FROM users WHERE active ORDER BY scale_slot ASC")
                .fetch_all(&self.pool)
                .await?;
        let slot = (0..SLOT_COUNT)
            .find(|s| !taken.iter().any(|(t,)| t == s))
            .ok_or(CreateUserError::NoFreeSlot)?;

        let user = sqlx::query_as::<_, UserEntity>(&format!(
            r#"
            INSERT INTO users (name, scale_slot, height_mm, age, gender,
                               min_weight_grams, max_weight_grams, active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(slot)
        .bind(height_mm)
        .bind(age)
        .bind(gender)
        .bind(min_weight_grams)
        .bind(max_weight_grams)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    /// Soft-delete a profile, freeing its slot. Returns rows affected
    /// (0 when the id does not name an active profile).
    pub async fn deactivate(&self, id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET active = FALSE WHERE id = $1 AND active")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
