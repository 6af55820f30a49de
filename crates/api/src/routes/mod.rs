//! HTTP handlers: the three endpoints the scale calls, and the JSON
//! management API.

pub mod health;
pub mod measurements;
pub mod raw_uploads;
pub mod scale;
pub mod scales;
pub mod users;
