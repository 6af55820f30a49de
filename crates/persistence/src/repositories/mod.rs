//! Repository implementations.
//!
//! Read paths take the repository's pool; write paths used by the upload
//! pipeline take a `&mut PgConnection` so the whole ingestion runs inside
//! one caller-owned transaction.

pub mod measurement;
pub mod raw_upload;
pub mod scale;
pub mod user;

pub use measurement::{MeasurementInsert, MeasurementQuery, MeasurementRepository, NewMeasurement};
pub use raw_upload::{RawUploadRepository, UploadMetadata};
pub use scale::ScaleRepository;
pub use user::{CreateUserError, UserRepository};
