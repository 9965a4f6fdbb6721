/// Port-20 differential batches: one absolute sample followed by deltas
/// walking backward in time.
use log::trace;
use time::Duration;

use crate::codec::convert::{self, FieldScales};
use crate::codec::cursor::BitCursor;
use crate::codec::error::DecodeError;
use crate::codec::format::*;
use crate::models::MeasurementRecord;

const WIDTH_BITS: u32 = 4;
/// Time deltas count in units of 1024 ms.
const TIME_UNIT_MS: i64 = 1024;

/// Bit widths announced by the batch header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaWidths {
    pub time: u32,
    pub position: u32,
    pub sensor: u32,
}

impl DeltaWidths {
    /// Bits taken by one delta record.
    pub fn record_bits(&self) -> usize {
        (self.time + 2 * self.position + 2 * self.sensor) as usize
    }
}

/// One delta record, subtracted from the newer sample to reach the older one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Delta {
    time: u32,
    latitude: i32,
    longitude: i32,
    temperature: i32,
    humidity: i32,
}

/// Running absolute values in raw wire units.
#[derive(Debug, Clone, Copy)]
struct Running {
    latitude: i64,
    longitude: i64,
    temperature: i64,
    humidity: i64,
    age_ms: i64,
}

/// Lazy iterator over the records of one batch, newest first.
///
/// The baseline sample is yielded first with a zero age and its supply
/// voltage. Every following record comes from one delta and has no supply.
/// Iteration ends quietly once the remaining bits cannot hold a full delta
/// record, which covers the padding left by byte rounding.
#[derive(Debug, Clone)]
pub struct BatchRecords<'a> {
    cursor: BitCursor<'a>,
    widths: DeltaWidths,
    scales: FieldScales,
    running: Running,
    baseline: Option<MeasurementRecord>,
    finished: bool,
}

impl<'a> BatchRecords<'a> {
    /// Read the width header and the baseline sample.
    pub fn new(payload: &'a [u8], scales: FieldScales) -> Result<Self, DecodeError> {
        let mut cursor = BitCursor::new(payload);

        let mut read = |field: &'static str, width: u32, signed: bool| {
            let bit_position = cursor.bit_position();
            let value = if signed {
                cursor.read_int(width).map(i64::from)
            } else {
                cursor.read_uint(width).map(i64::from)
            };
            value.map_err(|_| DecodeError::TruncatedField {
                field,
                bit_position,
            })
        };

        let widths = DeltaWidths {
            time: read("time_width", WIDTH_BITS, false)? as u32,
            position: read("position_width", WIDTH_BITS, false)? as u32,
            sensor: read("sensor_width", WIDTH_BITS, false)? as u32,
        };
        let running = Running {
            latitude: read("latitude", COORDINATE_BITS, true)?,
            longitude: read("longitude", COORDINATE_BITS, true)?,
            temperature: read("temperature", TEMPERATURE_BITS, true)?,
            humidity: read("humidity", HUMIDITY_BITS, false)?,
            age_ms: 0,
        };
        let supply = read("supply", SUPPLY_BITS, false)? as u32;

        trace!("Batch widths {:?}", widths);

        let mut baseline = Self::to_record(&scales, &running);
        baseline.supply = Some(convert::supply_voltage(supply));

        Ok(BatchRecords {
            cursor,
            widths,
            scales,
            running,
            baseline: Some(baseline),
            finished: false,
        })
    }

    pub fn widths(&self) -> DeltaWidths {
        self.widths
    }

    fn to_record(scales: &FieldScales, running: &Running) -> MeasurementRecord {
        MeasurementRecord {
            latitude: scales.latitude(running.latitude),
            longitude: scales.longitude(running.longitude),
            temperature: convert::temperature(running.temperature),
            humidity: scales.humidity(running.humidity),
            age: Some(Duration::milliseconds(running.age_ms)),
            ..Default::default()
        }
    }

    /// Next delta record, or `None` at the end of the batch.
    fn read_delta(&mut self) -> Option<Delta> {
        let record_bits = self.widths.record_bits();
        // A zero-width record would never consume the buffer
        if record_bits == 0 || self.cursor.remaining_bits() < record_bits {
            return None;
        }

        let w = self.widths;
        let c = &mut self.cursor;
        Some(Delta {
            time: c.read_uint(w.time).ok()?,
            latitude: c.read_int(w.position).ok()?,
            longitude: c.read_int(w.position).ok()?,
            temperature: c.read_int(w.sensor).ok()?,
            humidity: c.read_int(w.sensor).ok()?,
        })
    }
}

impl Iterator for BatchRecords<'_> {
    type Item = MeasurementRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(baseline) = self.baseline.take() {
            return Some(baseline);
        }
        if self.finished {
            return None;
        }

        let Some(delta) = self.read_delta() else {
            self.finished = true;
            return None;
        };

        let r = &mut self.running;
        r.latitude -= i64::from(delta.latitude);
        r.longitude -= i64::from(delta.longitude);
        r.temperature -= i64::from(delta.temperature);
        r.humidity -= i64::from(delta.humidity);
        r.age_ms += i64::from(delta.time) * TIME_UNIT_MS;

        Some(Self::to_record(&self.scales, &self.running))
    }
}
