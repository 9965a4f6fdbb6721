//! Decoding of sensor node uplink payloads
//!
//! The LoRaWAN port selects the wire format. Ports 10 to 12 carry fixed
//! layouts whose optional fields follow from the payload length, port 13
//! announces its optional fields in a leading flag byte, and port 20 packs
//! a batch of samples as deltas against the newest one.
//!
//! Decoding is pure: the same port and bytes always give the same records.

pub mod batch;
pub mod convert;
pub mod cursor;
pub mod error;
pub mod extension;
pub mod format;
pub mod record;

use log::debug;

use crate::models::MeasurementRecord;

pub use batch::BatchRecords;
pub use cursor::BitCursor;
pub use error::{CursorError, DecodeError};
pub use format::{describe, refine, select, FormatDescriptor, FormatTag, Selection};

/// Knobs that change what is accepted, not how fields are read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Reject port-13 payloads with reserved flag bits set.
    pub strict_flags: bool,
}

/// Decode a payload with default options.
pub fn decode(port: u8, payload: &[u8]) -> Result<Vec<MeasurementRecord>, DecodeError> {
    decode_with(port, payload, DecodeOptions::default())
}

/// Decode a payload into its records, newest first for batches.
pub fn decode_with(
    port: u8,
    payload: &[u8],
    options: DecodeOptions,
) -> Result<Vec<MeasurementRecord>, DecodeError> {
    let descriptor = describe(port, payload, options.strict_flags)?;
    debug!(
        "Port {} ({} bytes) decodes as {:?}",
        port,
        payload.len(),
        descriptor.tag
    );

    match descriptor.tag {
        FormatTag::DifferentialBatch => {
            Ok(BatchRecords::new(payload, descriptor.scales)?.collect())
        }
        _ => Ok(vec![record::decode_record(&descriptor, payload)?]),
    }
}
