use serde::Serialize;
use time::{Duration, OffsetDateTime};

/// One decoded sample, in physical units.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MeasurementRecord {
    pub firmware_version: Option<u8>,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub supply: Option<f64>,
    pub battery: Option<f64>,
    pub lux: Option<u32>,
    pub pm2_5: Option<u16>,
    pub pm10: Option<u16>,
    pub extra: Option<String>,
    /// Time before the reference instant (batch samples only).
    pub age: Option<Duration>,
}

/// A decoded record tied to its device and absolute time, ready for storage.
#[derive(Debug, Clone, Serialize)]
pub struct Measurement {
    pub dev_eui: u64,
    pub name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub port: u8,
    pub firmware_version: Option<u8>,
    pub latitude: f64,
    pub longitude: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub supply: Option<f64>,
    pub battery: Option<f64>,
    pub lux: Option<u32>,
    pub pm2_5: Option<u16>,
    pub pm10: Option<u16>,
    pub extra: Option<String>,
    pub datarate: Option<String>,
    pub rssi: Option<i32>,
    pub lsnr: Option<f64>,
}
