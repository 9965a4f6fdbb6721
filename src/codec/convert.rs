/// Fixed-point to physical unit conversions
///
/// Every format carries its own `FieldScales` table. The tables differ on
/// purpose: deployed firmware generations disagree on the longitude divisor
/// and on humidity scaling, and both readings have to be reproduced as sent.

/// Humidity scaling rule for a format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumidityScale {
    /// Raw value is in 1/16 %RH.
    Sixteenths,
    /// Raw value is used as is.
    Raw,
}

/// Per-format divisor table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldScales {
    pub latitude_divisor: f64,
    pub longitude_divisor: f64,
    pub humidity: HumidityScale,
}

/// Port 10, 9-byte payloads unpacked directly from bytes.
pub const LEGACY_BYTES: FieldScales = FieldScales {
    latitude_divisor: 32768.0,
    longitude_divisor: 32768.0,
    humidity: HumidityScale::Sixteenths,
};

/// Port 10, 10 and 11 byte payloads read through the bit cursor.
// Longitude divides by 32767 here, unlike every other format. Likely a
// firmware-side slip, kept until the deployed nodes are confirmed.
pub const LEGACY_BITS: FieldScales = FieldScales {
    latitude_divisor: 32768.0,
    longitude_divisor: 32767.0,
    humidity: HumidityScale::Sixteenths,
};

/// Ports 11, 12 and 13.
pub const CURRENT: FieldScales = FieldScales {
    latitude_divisor: 32768.0,
    longitude_divisor: 32768.0,
    humidity: HumidityScale::Raw,
};

/// Port 20 differential batches.
pub const BATCH: FieldScales = FieldScales {
    latitude_divisor: 32768.0,
    longitude_divisor: 32768.0,
    humidity: HumidityScale::Sixteenths,
};

impl FieldScales {
    pub fn latitude(&self, raw: i64) -> f64 {
        raw as f64 / self.latitude_divisor
    }

    pub fn longitude(&self, raw: i64) -> f64 {
        raw as f64 / self.longitude_divisor
    }

    pub fn humidity(&self, raw: i64) -> f64 {
        match self.humidity {
            HumidityScale::Sixteenths => raw as f64 / 16.0,
            HumidityScale::Raw => raw as f64,
        }
    }
}

/// Temperature in °C from 1/16 °C units.
pub fn temperature(raw: i64) -> f64 {
    raw as f64 / 16.0
}

/// Supply voltage: 1 V offset, 10 mV steps.
pub fn supply_voltage(raw: u32) -> f64 {
    1.0 + raw as f64 / 100.0
}

/// Battery voltage: 1 V offset, 20 mV steps.
pub fn battery_voltage(raw: u32) -> f64 {
    1.0 + raw as f64 / 50.0
}

/// Illuminance count, widened by the format's scale bits.
pub fn illuminance(raw: u32, scale_bits: u8) -> u32 {
    raw << scale_bits
}
