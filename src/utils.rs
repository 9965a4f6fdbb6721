/// Utility functions for timestamps and log formatting
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::OffsetDateTime;

use crate::models::MeasurementRecord;

/// Log-friendly `DD.MM.YYYY - HH:MM:SS` rendering of a sample time,
/// falling back to the `Display` form if formatting fails.
pub fn format_datetime(dt: &OffsetDateTime) -> String {
    let format = format_description!("[day].[month].[year] - [hour]:[minute]:[second]");
    dt.format(format).unwrap_or_else(|_| dt.to_string())
}

/// Parse a gateway timestamp such as `2016-06-10T08:46:51.138189Z`
pub fn parse_gateway_time(value: &str) -> Result<OffsetDateTime, time::error::Parse> {
    OffsetDateTime::parse(value, &Rfc3339)
}

/// Absolute sample time: the reference instant minus the record's age.
pub fn sample_time(reference: OffsetDateTime, record: &MeasurementRecord) -> OffsetDateTime {
    match record.age {
        Some(age) => reference - age,
        None => reference,
    }
}

/// One-line summary of a record for debug logs
pub fn summarize(record: &MeasurementRecord) -> String {
    let mut summary = format!(
        "lat={:.5} lon={:.5} temp={:.2}°C humidity={:.2}",
        record.latitude, record.longitude, record.temperature, record.humidity
    );
    if let Some(supply) = record.supply {
        summary.push_str(&format!(" supply={:.2}V", supply));
    }
    if let Some(battery) = record.battery {
        summary.push_str(&format!(" battery={:.2}V", battery));
    }
    if let Some(lux) = record.lux {
        summary.push_str(&format!(" lux={}", lux));
    }
    if let (Some(pm2_5), Some(pm10)) = (record.pm2_5, record.pm10) {
        summary.push_str(&format!(" pm2.5={} pm10={}", pm2_5, pm10));
    }
    summary
}
