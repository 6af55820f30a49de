//! The upload ingestion pipeline.
//!
//! One transaction per upload, in a fixed order: record the raw bytes,
//! decode, validate, upsert the scale, insert measurements with
//! (MAC, id) dedup, finalize the raw row, build and store the response.
//! The response reflects the user directory as this transaction sees it.
//!
//! The scale must receive a well-formed response even when the frame is
//! garbage; only a failing store may surface as an HTTP error (503), and in
//! that case the rollback guarantees nothing was recorded, so the scale's
//! retry starts from a clean slate.

use chrono::{DateTime, TimeZone, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};

use domain::services::validation::{assess_frame, FrameAssessment};
use persistence::repositories::{
    MeasurementInsert, MeasurementRepository, NewMeasurement, RawUploadRepository, ScaleRepository,
    UploadMetadata, UserRepository,
};
use protocol::{
    decode_upload, encode_response, peek_mac, MeasurementRecord, ResponseFrame, UploadFrame,
    UserSlot, WeightUnit, USER_SLOTS,
};

/// The only failure an upload can propagate out of the pipeline.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("store unavailable: {0}")]
    Store(#[from] sqlx::Error),
}

/// Ingest one upload body and produce the binary response for the scale.
pub async fn ingest_upload(
    pool: &PgPool,
    unit: WeightUnit,
    body: &[u8],
) -> Result<Vec<u8>, IngestError> {
    let raw_repo = RawUploadRepository::new(pool.clone());
    let scale_repo = ScaleRepository::new(pool.clone());
    let measurement_repo = MeasurementRepository::new(pool.clone());
    let user_repo = UserRepository::new(pool.clone());

    let mut tx = pool.begin().await?;
    let now = Utc::now();

    let peeked_mac = peek_mac(body).map(|mac| mac.to_string());
    let raw_id = raw_repo
        .insert(&mut tx, body, peeked_mac.as_deref())
        .await?;

    let frame = match decode_upload(body) {
        Ok(frame) => frame,
        Err(err) => {
            warn!(error = %err, len = body.len(), "upload frame rejected, acknowledging anyway");
            let response = encode_response(&ResponseFrame::empty(now.timestamp() as u32, unit));
            raw_repo
                .finish(&mut tx, raw_id, false, Some(err.code()), &response)
                .await?;
            tx.commit().await?;
            return Ok(response);
        }
    };

    raw_repo
        .set_metadata(
            &mut tx,
            raw_id,
            &UploadMetadata {
                scale_mac: frame.mac.to_string(),
                protocol_version: frame.protocol_version as i16,
                firmware_version: frame.firmware_version as i16,
                battery_percent: frame.battery_percent as i16,
                scale_timestamp: frame.scale_timestamp as i64,
                measurement_count: frame.declared_count as i32,
            },
        )
        .await?;

    let assessment = assess_frame(&frame, now);
    if assessment.battery_clamped {
        warn!(
            mac = %frame.mac,
            battery = frame.battery_percent,
            "battery percent out of range, clamped"
        );
    }

    // A placeholder MAC cannot be attributed to a device; keep the raw row
    // and acknowledge, but persist nothing.
    if !assessment.mac_ok {
        warn!(mac = %frame.mac, "upload carries placeholder MAC, nothing persisted");
        let response = encode_response(&ResponseFrame::empty(now.timestamp() as u32, unit));
        raw_repo
            .finish(
                &mut tx,
                raw_id,
                false,
                assessment.flags_csv().as_deref(),
                &response,
            )
            .await?;
        tx.commit().await?;
        return Ok(response);
    }

    scale_repo
        .upsert_from_upload(
            &mut tx,
            &frame.mac.to_string(),
            &frame.mac.serial(),
            frame.protocol_version as i16,
            frame.firmware_version as i16,
            assessment.battery_percent as i16,
            Some(&hex::encode(frame.auth_code)),
        )
        .await?;

    let (mut inserted, mut replayed, mut conflicting) = (0u32, 0u32, 0u32);
    for record in &assessment.accepted {
        let new = to_new_measurement(&frame, record, now);
        match measurement_repo.insert_if_absent(&mut tx, &new).await? {
            MeasurementInsert::Inserted => inserted += 1,
            MeasurementInsert::DuplicateIdentical => replayed += 1,
            MeasurementInsert::DuplicateConflicting {
                existing_weight_grams,
                detail,
            } => {
                conflicting += 1;
                warn!(
                    mac = %frame.mac,
                    measurement_id = record.measurement_id,
                    detail = %detail,
                    "divergent re-upload, keeping original"
                );
                measurement_repo
                    .insert_conflict(&mut tx, &new, existing_weight_grams, raw_id, &detail)
                    .await?;
            }
        }
    }

    let response = build_response(&user_repo, &mut tx, now, unit).await?;
    raw_repo
        .finish(
            &mut tx,
            raw_id,
            true,
            assessment.flags_csv().as_deref(),
            &response,
        )
        .await?;
    tx.commit().await?;

    log_outcome(&frame, &assessment, inserted, replayed, conflicting);
    Ok(response)
}

/// Slot table as of the current transaction, encoded for the wire.
async fn build_response(
    user_repo: &UserRepository,
    tx: &mut sqlx::PgConnection,
    now: DateTime<Utc>,
    unit: WeightUnit,
) -> Result<Vec<u8>, IngestError> {
    let users = user_repo.list_active_on(tx).await?;

    let mut slots = [UserSlot::default(); USER_SLOTS];
    for user in users {
        let slot = user.scale_slot;
        if (0..USER_SLOTS as i16).contains(&slot) {
            let profile: domain::models::UserProfile = user.into();
            slots[slot as usize] = profile.to_wire_slot();
        }
    }

    Ok(encode_response(&ResponseFrame {
        timestamp: now.timestamp() as u32,
        unit,
        status: 0,
        slots,
    }))
}

fn to_new_measurement(
    frame: &UploadFrame,
    record: &MeasurementRecord,
    now: DateTime<Utc>,
) -> NewMeasurement {
    let timestamp = Utc
        .timestamp_opt(i64::from(record.timestamp), 0)
        .single()
        .unwrap_or(now);
    NewMeasurement {
        scale_mac: frame.mac.to_string(),
        measurement_id: i64::from(record.measurement_id),
        weight_grams: i64::from(record.weight_grams),
        impedance: i32::from(record.impedance),
        fat_raw_1: i32::from(record.fat_raw_1),
        fat_raw_2: i32::from(record.fat_raw_2),
        covariance: i32::from(record.covariance),
        body_fat_percent: record.body_fat_percent(),
        timestamp_raw: i64::from(record.timestamp),
        timestamp,
        user_slot: i16::from(record.user_slot),
        is_guest: record.is_guest(),
    }
}

fn log_outcome(
    frame: &UploadFrame,
    assessment: &FrameAssessment,
    inserted: u32,
    replayed: u32,
    conflicting: u32,
) {
    info!(
        mac = %frame.mac,
        firmware = frame.firmware_version,
        battery = assessment.battery_percent,
        declared = frame.declared_count,
        inserted,
        replayed,
        conflicting,
        rejected = assessment.rejected,
        flags = assessment.flags_csv().as_deref().unwrap_or("-"),
        "upload ingested"
    );
}
