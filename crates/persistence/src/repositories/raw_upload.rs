//! Raw upload repository. Rows are written inside the upload transaction,
//! so an aborted request leaves no trace and a committed one always carries
//! its final parse state.

use sqlx::{PgConnection, PgPool};

use crate::entities::RawUploadSummaryEntity;

/// Decoded header fields copied onto the raw row once decode succeeds.
#[derive(Debug, Clone)]
pub struct UploadMetadata {
    pub scale_mac: String,
    pub protocol_version: i16,
    pub firmware_version: i16,
    pub battery_percent: i16,
    pub scale_timestamp: i64,
    pub measurement_count: i32,
}

/// Repository for raw upload rows.
#[derive(Clone)]
pub struct RawUploadRepository {
    pool: PgPool,
}

impl RawUploadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record the verbatim request before anything else happens to it.
    /// `scale_mac` is the best-effort pre-parse extraction and may be absent.
    pub async fn insert(
        &self,
        conn: &mut PgConnection,
        request_data: &[u8],
        scale_mac: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO raw_uploads (request_data, scale_mac, parse_ok)
            VALUES ($1, $2, FALSE)
            RETURNING id
            "#,
        )
        .bind(request_data)
        .bind(scale_mac)
        .fetch_one(conn)
        .await?;
        Ok(id)
    }

    /// Attach decoded frame metadata to the row.
    pub async fn set_metadata(
        &self,
        conn: &mut PgConnection,
        id: i64,
        meta: &UploadMetadata,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE raw_uploads
            SET scale_mac = $2, protocol_version = $3, firmware_version = $4,
                battery_percent = $5, scale_timestamp = $6, measurement_count = $7
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&meta.scale_mac)
        .bind(meta.protocol_version)
        .bind(meta.firmware_version)
        .bind(meta.battery_percent)
        .bind(meta.scale_timestamp)
        .bind(meta.measurement_count)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Final state of the row: parse outcome, accumulated flags or the
    /// decode error, and the response bytes that went back to the scale.
    pub async fn finish(
        &self,
        conn: &mut PgConnection,
        id: i64,
        parse_ok: bool,
        error_message: Option<&str>,
        response_data: &[u8],
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE raw_uploads
            SET parse_ok = $2, error_message = $3, response_data = $4
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(parse_ok)
        .bind(error_message)
        .bind(response_data)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Debug listing, newest first. Blob sizes only.
    pub async fn list_summaries(
        &self,
        errors_only: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<RawUploadSummaryEntity>, sqlx::Error> {
        let filter = if errors_only {
            " WHERE NOT parse_ok OR error_message IS NOT NULL"
        } else {
            ""
        };
        sqlx::query_as::<_, RawUploadSummaryEntity>(&format!(
            r#"
            SELECT id, received_at, scale_mac, protocol_version, firmware_version,
                   battery_percent, scale_timestamp, measurement_count,
                   COALESCE(LENGTH(request_data), 0)::INT AS request_size,
                   COALESCE(LENGTH(response_data), 0)::INT AS response_size,
                   parse_ok, error_message
            FROM raw_uploads{filter}
            ORDER BY received_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }
}
