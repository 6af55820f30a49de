//! Domain models for the scale server.

pub mod measurement;
pub mod raw_upload;
pub mod scale;
pub mod user;

pub use measurement::Measurement;
pub use raw_upload::RawUploadSummary;
pub use scale::Scale;
pub use user::{CreateUserParams, UserProfile};
