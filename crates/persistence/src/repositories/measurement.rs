//! Measurement repository: dedup-aware inserts and the read views behind
//! the management API.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};

use crate::entities::MeasurementEntity;

const MEASUREMENT_COLUMNS: &str = "id, scale_mac, measurement_id, weight_grams, impedance, \
                                   fat_raw_1, fat_raw_2, covariance, body_fat_percent, \
                                   timestamp_raw, timestamp, user_slot, is_guest, received_at";

/// A measurement about to be inserted, converted from the wire record.
#[derive(Debug, Clone)]
pub struct NewMeasurement {
    pub scale_mac: String,
    pub measurement_id: i64,
    pub weight_grams: i64,
    pub impedance: i32,
    pub fat_raw_1: i32,
    pub fat_raw_2: i32,
    pub covariance: i32,
    pub body_fat_percent: Option<f32>,
    pub timestamp_raw: i64,
    pub timestamp: DateTime<Utc>,
    pub user_slot: i16,
    pub is_guest: bool,
}

impl NewMeasurement {
    /// Wire-field equality against a stored row. `received_at` and the
    /// derived datetime are server-side and excluded.
    fn matches(&self, existing: &MeasurementEntity) -> bool {
        self.weight_grams == existing.weight_grams
            && self.impedance == existing.impedance
            && self.fat_raw_1 == existing.fat_raw_1
            && self.fat_raw_2 == existing.fat_raw_2
            && self.covariance == existing.covariance
            && self.timestamp_raw == existing.timestamp_raw
            && self.user_slot == existing.user_slot
    }

    fn divergence(&self, existing: &MeasurementEntity) -> String {
        let mut diffs = Vec::new();
        if self.weight_grams != existing.weight_grams {
            diffs.push(format!(
                "weight_grams {} != {}",
                self.weight_grams, existing.weight_grams
            ));
        }
        if self.impedance != existing.impedance {
            diffs.push(format!("impedance {} != {}", self.impedance, existing.impedance));
        }
        if self.fat_raw_1 != existing.fat_raw_1 {
            diffs.push(format!("fat_raw_1 {} != {}", self.fat_raw_1, existing.fat_raw_1));
        }
        if self.fat_raw_2 != existing.fat_raw_2 {
            diffs.push(format!("fat_raw_2 {} != {}", self.fat_raw_2, existing.fat_raw_2));
        }
        if self.covariance != existing.covariance {
            diffs.push(format!("covariance {} != {}", self.covariance, existing.covariance));
        }
        if self.timestamp_raw != existing.timestamp_raw {
            diffs.push(format!(
                "timestamp {} != {}",
                self.timestamp_raw, existing.timestamp_raw
            ));
        }
        if self.user_slot != existing.user_slot {
            diffs.push(format!("user_slot {} != {}", self.user_slot, existing.user_slot));
        }
        diffs.join("; ")
    }
}

/// What happened to an attempted insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeasurementInsert {
    Inserted,
    /// Same (MAC, id), same wire fields: a replay. Nothing was written.
    DuplicateIdentical,
    /// Same (MAC, id), different wire fields. The stored row wins.
    DuplicateConflicting {
        existing_weight_grams: i64,
        detail: String,
    },
}

/// Filters for the paginated measurement listing.
#[derive(Debug, Clone, Default)]
pub struct MeasurementQuery {
    pub limit: i64,
    pub offset: i64,
    pub user_slot: Option<i16>,
    pub scale_mac: Option<String>,
}

/// Repository for measurement rows.
#[derive(Clone)]
pub struct MeasurementRepository {
    pool: PgPool,
}

impl MeasurementRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert unless the (MAC, id) pair already exists. Duplicates are
    /// compared field-by-field so replays and genuine conflicts can be told
    /// apart; in neither case is the stored row touched.
    pub async fn insert_if_absent(
        &self,
        conn: &mut PgConnection,
        new: &NewMeasurement,
    ) -> Result<MeasurementInsert, sqlx::Error> {
        let inserted: Option<(i64,)> = sqlx::query_as(
            r#"
            INSERT INTO measurements (scale_mac, measurement_id, weight_grams, impedance,
                                      fat_raw_1, fat_raw_2, covariance, body_fat_percent,
                                      timestamp_raw, timestamp, user_slot, is_guest, received_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())
            ON CONFLICT (scale_mac, measurement_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(&new.scale_mac)
        .bind(new.measurement_id)
        .bind(new.weight_grams)
        .bind(new.impedance)
        .bind(new.fat_raw_1)
        .bind(new.fat_raw_2)
        .bind(new.covariance)
        .bind(new.body_fat_percent)
        .bind(new.timestamp_raw)
        .bind(new.timestamp)
        .bind(new.user_slot)
        .bind(new.is_guest)
        .fetch_optional(&mut *conn)
        .await?;

        if inserted.is_some() {
            return Ok(MeasurementInsert::Inserted);
        }

        let existing = sqlx::query_as::<_, MeasurementEntity>(&format!(
            r#"
            SELECT {MEASUREMENT_COLUMNS} FROM measurements
            WHERE scale_mac = $1 AND measurement_id = $2
            "#
        ))
        .bind(&new.scale_mac)
        .bind(new.measurement_id)
        .fetch_one(&mut *conn)
        .await?;

        if new.matches(&existing) {
            Ok(MeasurementInsert::DuplicateIdentical)
        } else {
            Ok(MeasurementInsert::DuplicateConflicting {
                existing_weight_grams: existing.weight_grams,
                detail: new.divergence(&existing),
            })
        }
    }

    /// Record a divergent replay next to the row that won.
    pub async fn insert_conflict(
        &self,
        conn: &mut PgConnection,
        new: &NewMeasurement,
        existing_weight_grams: i64,
        raw_upload_id: i64,
        detail: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO measurement_conflicts (scale_mac, measurement_id, raw_upload_id,
                                               existing_weight_grams, incoming_weight_grams, detail)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&new.scale_mac)
        .bind(new.measurement_id)
        .bind(raw_upload_id)
        .bind(existing_weight_grams)
        .bind(new.weight_grams)
        .bind(detail)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Paginated listing, newest scale-clock timestamp first.
    pub async fn list(
        &self,
        query: MeasurementQuery,
    ) -> Result<Vec<MeasurementEntity>, sqlx::Error> {
        let mut sql = format!("SELECT {MEASUREMENT_COLUMNS} FROM measurements WHERE TRUE");
        let mut param_idx = 1;

        if query.user_slot.is_some() {
            sql.push_str(&format!(" AND user_slot = ${}", param_idx));
            param_idx += 1;
        }
        if query.scale_mac.is_some() {
            sql.push_str(&format!(" AND scale_mac = ${}", param_idx));
            param_idx += 1;
        }
        sql.push_str(&format!(
            " ORDER BY timestamp DESC, id DESC LIMIT ${} OFFSET ${}",
            param_idx,
            param_idx + 1
        ));

        let mut q = sqlx::query_as::<_, MeasurementEntity>(&sql);
        if let Some(slot) = query.user_slot {
            q = q.bind(slot);
        }
        if let Some(mac) = &query.scale_mac {
            q = q.bind(mac);
        }
        q.bind(query.limit).bind(query.offset).fetch_all(&self.pool).await
    }

    /// Most recent measurement, optionally for one user slot.
    pub async fn latest(
        &self,
        user_slot: Option<i16>,
    ) -> Result<Option<MeasurementEntity>, sqlx::Error> {
        let result = if let Some(slot) = user_slot {
            sqlx::query_as::<_, MeasurementEntity>(&format!(
                r#"
                SELECT {MEASUREMENT_COLUMNS} FROM measurements
                WHERE user_slot = $1
                ORDER BY timestamp DESC, id DESC
                LIMIT 1
                "#
            ))
            .bind(slot)
            .fetch_optional(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, MeasurementEntity>(&format!(
                r#"
                SELECT {MEASUREMENT_COLUMNS} FROM measurements
                ORDER BY timestamp DESC, id DESC
                LIMIT 1
                "#
            ))
            .fetch_optional(&self.pool)
            .await
        };
        result
    }

    /// All measurement rows for one scale, in measurement-id order.
    pub async fn list_for_scale(
        &self,
        scale_mac: &str,
    ) -> Result<Vec<MeasurementEntity>, sqlx::Error> {
        sqlx::query_as::<_, MeasurementEntity>(&format!(
            r#"
            SELECT {MEASUREMENT_COLUMNS} FROM measurements
            WHERE scale_mac = $1
            ORDER BY measurement_id ASC
            "#
        ))
        .bind(scale_mac)
        .fetch_all(&self.pool)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn new_measurement() -> NewMeasurement {
        NewMeasurement {
            scale_mac: "AA:BB:CC:DD:EE:FF".to_string(),
            measurement_id: 1,
            weight_grams: 75_300,
            impedance: 520,
            fat_raw_1: 370,
            fat_raw_2: 370,
            covariance: 12,
            body_fat_percent: Some(37.0),
            timestamp_raw: 1_705_315_840,
            timestamp: Utc.timestamp_opt(1_705_315_840, 0).unwrap(),
            user_slot: 1,
            is_guest: false,
        }
    }

    fn entity_from(new: &NewMeasurement) -> MeasurementEntity {
        MeasurementEntity {
            id: 1,
            scale_mac: new.scale_mac.clone(),
            measurement_id: new.measurement_id,
            weight_grams: new.weight_grams,
            impedance: new.impedance,
            fat_raw_1: new.fat_raw_1,
            fat_raw_2: new.fat_raw_2,
            covariance: new.covariance,
            body_fat_percent: new.body_fat_percent,
            timestamp_raw: new.timestamp_raw,
            timestamp: new.timestamp,
            user_slot: new.user_slot,
            is_guest: new.is_guest,
            received_at: Utc::now(),
        }
    }

    #[test]
    fn identical_wire_fields_match() {
        let new = new_measurement();
        let existing = entity_from(&new);
        assert!(new.matches(&existing));
        assert!(new.divergence(&existing).is_empty());
    }

    #[test]
    fn divergent_fields_are_named() {
        let new = new_measurement();
        let mut existing = entity_from(&new);
        existing.weight_grams = 80_000;
        existing.impedance = 0;
        assert!(!new.matches(&existing));
        let detail = new.divergence(&existing);
        assert!(detail.contains("weight_grams 75300 != 80000"));
        assert!(detail.contains("impedance 520 != 0"));
    }

    #[test]
    fn server_side_fields_do_not_affect_matching() {
        let new = new_measurement();
        let mut existing = entity_from(&new);
        existing.received_at = Utc.timestamp_opt(0, 0).unwrap();
        existing.body_fat_percent = None;
        assert!(new.matches(&existing));
    }
}
