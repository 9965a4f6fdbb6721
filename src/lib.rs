//! Decoder for sensor node telemetry received over LoRaWAN
//!
//! [`codec`] turns a port number and raw payload bytes into measurement
//! records. [`uplink`] wraps it for network server messages: JSON in,
//! timestamped measurements out, for a storage collaborator to persist.

pub mod codec;
pub mod config;
pub mod models;
pub mod uplink;
pub mod utils;

pub use codec::{decode, decode_with, DecodeError, DecodeOptions};
pub use models::{Measurement, MeasurementRecord};
