/// Format selection from port, payload length and (port 13) the flag byte
use log::debug;
use tartan_bitfield::bitfield;

use crate::codec::convert::{self, FieldScales};
use crate::codec::error::DecodeError;

// Field widths in bits, in wire order
pub const FLAGS_BITS: u32 = 8;
pub const FIRMWARE_BITS: u32 = 8;
pub const COORDINATE_BITS: u32 = 24;
pub const TEMPERATURE_BITS: u32 = 12;
pub const HUMIDITY_BITS: u32 = 12;
pub const SUPPLY_BITS: u32 = 8;
pub const ILLUMINANCE_BITS: u32 = 16;
pub const PARTICULATE_BITS: u32 = 16;
pub const BATTERY_BITS: u32 = 8;

// LoRaWAN application ports
pub const PORT_LEGACY: u8 = 10;
pub const PORT_FIRMWARE: u8 = 11;
pub const PORT_FIRMWARE_LUX: u8 = 12;
pub const PORT_FLAGS: u8 = 13;
pub const PORT_BATCH: u8 = 20;

/// Smallest port-13 payload: flag byte, firmware, position, climate, supply.
pub const FLAGS_MIN_LENGTH: usize = 12;
/// Smallest port-20 payload: width header plus baseline sample.
pub const BATCH_MIN_LENGTH: usize = 12;

/// Illuminance scale used by the flag-based format to extend its range.
const FLAGS_LUX_SCALE_BITS: u8 = 2;

/// Wire format family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormatTag {
    LegacyV1,
    LegacyV2NoLux,
    LegacyV2Lux,
    FlagBased,
    DifferentialBatch,
}

/// How the fixed fields are pulled out of the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Packing {
    /// Byte slicing with integer shifts (9-byte port-10 payloads).
    Bytes,
    /// Sequential bit cursor reads.
    Bits,
}

/// Which format applies to one payload and which optional fields it carries.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FormatDescriptor {
    pub tag: FormatTag,
    pub packing: Packing,
    pub firmware: bool,
    pub supply: bool,
    pub battery: bool,
    pub illuminance: bool,
    pub particulate_matter: bool,
    pub extension: bool,
    pub lux_scale_bits: u8,
    pub scales: FieldScales,
}

/// Outcome of the length-only pre-check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Selection {
    Resolved(FormatDescriptor),
    /// Port 13: the optional fields depend on the leading flag byte.
    NeedsFlags,
}

impl FormatDescriptor {
    fn base(tag: FormatTag, scales: FieldScales) -> Self {
        FormatDescriptor {
            tag,
            packing: Packing::Bits,
            firmware: false,
            supply: false,
            battery: false,
            illuminance: false,
            particulate_matter: false,
            extension: false,
            lux_scale_bits: 0,
            scales,
        }
    }

    /// Bits taken by the header (flag byte) and every present fixed field.
    /// The extension section is variable and not counted.
    pub fn fixed_bits(&self) -> u32 {
        let mut bits = 2 * COORDINATE_BITS + TEMPERATURE_BITS + HUMIDITY_BITS;
        if self.tag == FormatTag::FlagBased {
            bits += FLAGS_BITS;
        }
        if self.firmware {
            bits += FIRMWARE_BITS;
        }
        if self.supply {
            bits += SUPPLY_BITS;
        }
        if self.illuminance {
            bits += ILLUMINANCE_BITS;
        }
        if self.particulate_matter {
            bits += 2 * PARTICULATE_BITS;
        }
        if self.battery {
            bits += BATTERY_BITS;
        }
        bits
    }
}

/// First phase: decide from port and length alone.
pub fn select(port: u8, length: usize) -> Result<Selection, DecodeError> {
    let invalid = || DecodeError::InvalidLength { port, length };

    let descriptor = match port {
        PORT_LEGACY => {
            let mut d = FormatDescriptor::base(FormatTag::LegacyV1, convert::LEGACY_BITS);
            match length {
                9 => {
                    d.packing = Packing::Bytes;
                    d.scales = convert::LEGACY_BYTES;
                }
                10 => d.supply = true,
                11 => {
                    d.supply = true;
                    d.battery = true;
                }
                _ => return Err(invalid()),
            }
            d
        }
        PORT_FIRMWARE | PORT_FIRMWARE_LUX => {
            let lux = port == PORT_FIRMWARE_LUX;
            let tag = if lux {
                FormatTag::LegacyV2Lux
            } else {
                FormatTag::LegacyV2NoLux
            };
            // Illuminance adds 2 bytes to every port-12 length
            let core = if lux { length.checked_sub(2) } else { Some(length) };
            let (particulate_matter, battery) = match core {
                Some(11) => (false, false),
                Some(12) => (false, true),
                Some(15) => (true, false),
                Some(16) => (true, true),
                _ => return Err(invalid()),
            };
            FormatDescriptor {
                firmware: true,
                supply: true,
                illuminance: lux,
                particulate_matter,
                battery,
                ..FormatDescriptor::base(tag, convert::CURRENT)
            }
        }
        PORT_FLAGS => {
            if length < FLAGS_MIN_LENGTH {
                return Err(invalid());
            }
            return Ok(Selection::NeedsFlags);
        }
        PORT_BATCH => {
            if length < BATCH_MIN_LENGTH {
                return Err(invalid());
            }
            FormatDescriptor {
                supply: true,
                ..FormatDescriptor::base(FormatTag::DifferentialBatch, convert::BATCH)
            }
        }
        _ => return Err(DecodeError::UnknownPort(port)),
    };

    Ok(Selection::Resolved(descriptor))
}

/// Second phase for port 13: apply the leading flag byte.
///
/// With `strict` set, nonzero reserved bits reject the payload.
pub fn refine(flags: u8, length: usize, strict: bool) -> Result<FormatDescriptor, DecodeError> {
    bitfield! {
        struct Flags(u8) {
            [0] illuminance,
            [1] particulate_matter,
            [2] battery,
            [3] extension,
            [4..8] reserved: u8,
        }
    }

    let f = Flags(flags);
    if f.reserved() != 0 {
        if strict {
            return Err(DecodeError::InvalidFlagCombination(flags));
        }
        debug!("Ignoring reserved flag bits in {:#04x}", flags);
    }

    let descriptor = FormatDescriptor {
        firmware: true,
        supply: true,
        illuminance: f.illuminance(),
        particulate_matter: f.particulate_matter(),
        battery: f.battery(),
        extension: f.extension(),
        lux_scale_bits: FLAGS_LUX_SCALE_BITS,
        ..FormatDescriptor::base(FormatTag::FlagBased, convert::CURRENT)
    };

    if (length as u64) * 8 < u64::from(descriptor.fixed_bits()) {
        return Err(DecodeError::InvalidLength {
            port: PORT_FLAGS,
            length,
        });
    }

    Ok(descriptor)
}

/// Both phases over an actual payload.
pub fn describe(port: u8, payload: &[u8], strict: bool) -> Result<FormatDescriptor, DecodeError> {
    match select(port, payload.len())? {
        Selection::Resolved(descriptor) => Ok(descriptor),
        // The pre-check guarantees at least one byte
        Selection::NeedsFlags => refine(payload[0], payload.len(), strict),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolved(port: u8, length: usize) -> FormatDescriptor {
        match select(port, length).unwrap() {
            Selection::Resolved(d) => d,
            Selection::NeedsFlags => panic!("port {} needs flags", port),
        }
    }

    #[test]
    fn test_port_10_lengths() {
        let d = resolved(10, 9);
        assert_eq!(d.tag, FormatTag::LegacyV1);
        assert_eq!(d.packing, Packing::Bytes);
        assert!(!d.supply && !d.battery);
        assert_eq!(d.scales, convert::LEGACY_BYTES);

        let d = resolved(10, 10);
        assert_eq!(d.packing, Packing::Bits);
        assert!(d.supply && !d.battery);
        assert_eq!(d.scales.longitude_divisor, 32767.0);

        let d = resolved(10, 11);
        assert!(d.supply && d.battery);
        assert_eq!(d.fixed_bits(), 88);
    }

    #[test]
    fn test_port_11_and_12_lengths() {
        let cases = [
            (11, 11, false, false, false),
            (11, 12, false, false, true),
            (11, 15, false, true, false),
            (11, 16, false, true, true),
            (12, 13, true, false, false),
            (12, 14, true, false, true),
            (12, 17, true, true, false),
            (12, 18, true, true, true),
        ];
        for (port, length, lux, pm, battery) in cases {
            let d = resolved(port, length);
            assert!(d.firmware && d.supply);
            assert_eq!(d.illuminance, lux);
            assert_eq!(d.particulate_matter, pm);
            assert_eq!(d.battery, battery);
            assert_eq!(d.lux_scale_bits, 0);
            assert_eq!(d.fixed_bits() as usize, length * 8);
        }
        assert_eq!(resolved(12, 17).tag, FormatTag::LegacyV2Lux);
        assert_eq!(resolved(11, 16).tag, FormatTag::LegacyV2NoLux);
    }

    #[test]
    fn test_rejections() {
        assert_eq!(select(1, 9), Err(DecodeError::UnknownPort(1)));
        assert_eq!(select(14, 20), Err(DecodeError::UnknownPort(14)));
        for (port, length) in [(10, 8), (10, 12), (11, 13), (11, 14), (12, 11), (12, 1), (12, 0), (13, 11), (20, 11)] {
            assert_eq!(
                select(port, length),
                Err(DecodeError::InvalidLength { port, length })
            );
        }
    }

    #[test]
    fn test_flags_need_refinement() {
        assert_eq!(select(13, 12), Ok(Selection::NeedsFlags));
        assert_eq!(select(13, 40), Ok(Selection::NeedsFlags));
    }

    #[test]
    fn test_refine_flag_bits() {
        let d = refine(0b0000_0000, 12, false).unwrap();
        assert_eq!(d.tag, FormatTag::FlagBased);
        assert!(!d.illuminance && !d.particulate_matter && !d.battery && !d.extension);
        assert_eq!(d.fixed_bits(), 96);

        let d = refine(0b0000_1111, 19, false).unwrap();
        assert!(d.illuminance && d.particulate_matter && d.battery && d.extension);
        assert_eq!(d.lux_scale_bits, 2);
        assert_eq!(d.fixed_bits(), 96 + 16 + 32 + 8);

        assert_eq!(
            refine(0b0000_0001, 13, false),
            Err(DecodeError::InvalidLength { port: 13, length: 13 })
        );
    }

    #[test]
    fn test_reserved_flag_bits() {
        assert!(refine(0b1010_0000, 12, false).is_ok());
        assert_eq!(
            refine(0b1010_0000, 12, true),
            Err(DecodeError::InvalidFlagCombination(0b1010_0000))
        );
    }

    #[test]
    fn test_batch_selection() {
        let d = resolved(20, 12);
        assert_eq!(d.tag, FormatTag::DifferentialBatch);
        assert!(d.supply && !d.firmware);
        assert_eq!(d.scales, convert::BATCH);
    }
}
