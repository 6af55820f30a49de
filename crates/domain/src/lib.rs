//! Domain layer for the scale server.
//!
//! This crate contains:
//! - Model types for scales, measurements, user profiles, and raw uploads
//! - The frame validator applied between decoding and persistence

pub mod models;
pub mod services;
