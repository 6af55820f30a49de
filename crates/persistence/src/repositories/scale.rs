//! Scale registry repository.

use sqlx::{PgConnection, PgPool};

use crate::entities::ScaleEntity;

const SCALE_COLUMNS: &str = "id, mac_address, serial_number, firmware_version, protocol_version, \
                             battery_percent, last_ssid, auth_code, first_seen, last_seen";

/// Repository for scale identity rows.
#[derive(Clone)]
pub struct ScaleRepository {
    pool: PgPool,
}

impl ScaleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Upsert from a decoded upload frame. Creates the row on first sight;
    /// refreshes firmware, battery, auth code, and last-seen after that.
    /// Concurrent upserts for the same MAC resolve to a single row via the
    /// unique index.
    pub async fn upsert_from_upload(
        &self,
        conn: &mut PgConnection,
        mac_address: &str,
        serial_number: &str,
        protocol_version: i16,
        firmware_version: i16,
        battery_percent: i16,
        auth_code: Option<&str>,
    ) -> Result<ScaleEntity, sqlx::Error> {
        sqlx::query_as::<_, ScaleEntity>(&format!(
            r#"
            INSERT INTO scales (mac_address, serial_number, protocol_version, firmware_version,
                                battery_percent, auth_code, first_seen, last_seen)
            VALUES ($1, $2, $3, $4, $5, $6, NOW(), NOW())
            ON CONFLICT (mac_address) DO UPDATE SET
                protocol_version = EXCLUDED.protocol_version,
                firmware_version = EXCLUDED.firmware_version,
                battery_percent = EXCLUDED.battery_percent,
                auth_code = COALESCE(EXCLUDED.auth_code, scales.auth_code),
                last_seen = NOW()
            RETURNING {SCALE_COLUMNS}
            "#
        ))
        .bind(mac_address)
        .bind(serial_number)
        .bind(protocol_version)
        .bind(firmware_version)
        .bind(battery_percent)
        .bind(auth_code)
        .fetch_one(conn)
        .await
    }

    /// Upsert from the registration endpoint, which only carries the WiFi
    /// SSID and the setup token.
    pub async fn upsert_from_registration(
        &self,
        mac_address: &str,
        serial_number: &str,
        ssid: Option<&str>,
        auth_code: Option<&str>,
    ) -> Result<ScaleEntity, sqlx::Error> {
        sqlx::query_as::<_, ScaleEntity>(&format!(
            r#"
            INSERT INTO scales (mac_address, serial_number, last_ssid, auth_code, first_seen, last_seen)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            ON CONFLICT (mac_address) DO UPDATE SET
                last_ssid = COALESCE(EXCLUDED.last_ssid, scales.last_ssid),
                auth_code = COALESCE(EXCLUDED.auth_code, scales.auth_code),
                last_seen = NOW()
            RETURNING {SCALE_COLUMNS}
            "#
        ))
        .bind(mac_address)
        .bind(serial_number)
        .bind(ssid)
        .bind(auth_code)
        .fetch_one(&self.pool)
        .await
    }

    /// Find a scale by its canonical MAC form.
    pub async fn find_by_mac(&self, mac_address: &str) -> Result<Option<ScaleEntity>, sqlx::Error> {
        sqlx::query_as::<_, ScaleEntity>(&format!(
            "SELECT {SCALE_COLUMNS} FROM scales WHERE mac_address = $1"
        ))
        .bind(mac_address)
        .fetch_optional(&self.pool)
        .await
    }

    /// All known scales, most recently seen first.
    pub async fn list_all(&self) -> Result<Vec<ScaleEntity>, sqlx::Error> {
        sqlx::query_as::<_, ScaleEntity>(&format!(
            "SELECT {SCALE_COLUMNS} FROM scales ORDER BY last_seen DESC"
        ))
        .fetch_all(&self.pool)
        .await
    }
}
