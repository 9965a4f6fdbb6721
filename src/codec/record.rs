/// Single-record decoding for the legacy and flag-based formats
use crate::codec::convert;
use crate::codec::cursor::BitCursor;
use crate::codec::error::DecodeError;
use crate::codec::extension;
use crate::codec::format::*;
use crate::models::MeasurementRecord;

/// Decode one record according to `descriptor`.
///
/// Every field is mandatory once the descriptor says it is present, so any
/// short read rejects the whole payload.
pub fn decode_record(
    descriptor: &FormatDescriptor,
    payload: &[u8],
) -> Result<MeasurementRecord, DecodeError> {
    match descriptor.packing {
        Packing::Bytes => decode_packed_bytes(descriptor, payload),
        Packing::Bits => decode_bitstream(descriptor, payload),
    }
}

/// Decode the first-generation 9-byte port-10 layout straight from the bytes.
///
/// Layout:
/// - Bytes 0-2: Latitude (24-bit big-endian, zero-prefixed to 32 bits)
/// - Bytes 3-5: Longitude (same encoding)
/// - Bytes 6-8: Temperature (high 12 bits) and humidity (low 12 bits)
fn decode_packed_bytes(
    descriptor: &FormatDescriptor,
    payload: &[u8],
) -> Result<MeasurementRecord, DecodeError> {
    let data: &[u8; 9] = payload
        .get(..9)
        .and_then(|bytes| bytes.try_into().ok())
        .ok_or(DecodeError::TruncatedField {
            field: "latitude",
            bit_position: 0,
        })?;

    let coordinate = |b: &[u8]| i64::from(i32::from_be_bytes([0, b[0], b[1], b[2]]));

    // Arithmetic shift keeps the temperature sign
    let temperature = i16::from_be_bytes([data[6], data[7]]) >> 4;
    let humidity = i16::from_be_bytes([data[7], data[8]]) & 0xFFF;

    Ok(MeasurementRecord {
        latitude: descriptor.scales.latitude(coordinate(&data[0..3])),
        longitude: descriptor.scales.longitude(coordinate(&data[3..6])),
        temperature: convert::temperature(i64::from(temperature)),
        humidity: descriptor.scales.humidity(i64::from(humidity)),
        ..Default::default()
    })
}

/// Field reads that turn cursor exhaustion into a named decode error.
struct FieldReader<'a> {
    cursor: BitCursor<'a>,
}

impl<'a> FieldReader<'a> {
    fn uint(&mut self, field: &'static str, width: u32) -> Result<u32, DecodeError> {
        let bit_position = self.cursor.bit_position();
        self.cursor
            .read_uint(width)
            .map_err(|_| DecodeError::TruncatedField {
                field,
                bit_position,
            })
    }

    fn int(&mut self, field: &'static str, width: u32) -> Result<i64, DecodeError> {
        let bit_position = self.cursor.bit_position();
        self.cursor
            .read_int(width)
            .map(i64::from)
            .map_err(|_| DecodeError::TruncatedField {
                field,
                bit_position,
            })
    }
}

/// Decode in firmware order:
/// [flags] [firmware] lat lon temp humidity [supply] [lux] [pm2.5 pm10] [battery] [extension]
fn decode_bitstream(
    descriptor: &FormatDescriptor,
    payload: &[u8],
) -> Result<MeasurementRecord, DecodeError> {
    let mut r = FieldReader {
        cursor: BitCursor::new(payload),
    };
    let scales = &descriptor.scales;
    let mut record = MeasurementRecord::default();

    if descriptor.tag == FormatTag::FlagBased {
        // Already interpreted by the format selector
        r.uint("flags", FLAGS_BITS)?;
    }
    if descriptor.firmware {
        record.firmware_version = Some(r.uint("firmware_version", FIRMWARE_BITS)? as u8);
    }

    record.latitude = scales.latitude(r.int("latitude", COORDINATE_BITS)?);
    record.longitude = scales.longitude(r.int("longitude", COORDINATE_BITS)?);
    record.temperature = convert::temperature(r.int("temperature", TEMPERATURE_BITS)?);
    // Signed on the wire even though humidity is never negative
    record.humidity = scales.humidity(r.int("humidity", HUMIDITY_BITS)?);

    if descriptor.supply {
        record.supply = Some(convert::supply_voltage(r.uint("supply", SUPPLY_BITS)?));
    }
    if descriptor.illuminance {
        let raw = r.uint("lux", ILLUMINANCE_BITS)?;
        record.lux = Some(convert::illuminance(raw, descriptor.lux_scale_bits));
    }
    if descriptor.particulate_matter {
        record.pm2_5 = Some(r.uint("pm2_5", PARTICULATE_BITS)? as u16);
        record.pm10 = Some(r.uint("pm10", PARTICULATE_BITS)? as u16);
    }
    if descriptor.battery {
        record.battery = Some(convert::battery_voltage(r.uint("battery", BATTERY_BITS)?));
    }
    if descriptor.extension {
        let values = extension::decode_values(&mut r.cursor);
        record.extra = Some(extension::render(&values));
    }

    Ok(record)
}
