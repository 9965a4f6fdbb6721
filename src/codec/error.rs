/// Errors raised while selecting a payload format or decoding its fields
use thiserror::Error;

/// A read past the end of the bitstream, or a read wider than the cursor supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CursorError {
    /// Fewer bits remain than the read asked for.
    #[error("buffer exhausted: requested {requested} bits, {remaining} remaining")]
    Exhausted { requested: u32, remaining: usize },
    /// Reads are limited to 32 bits.
    #[error("read width {0} exceeds 32 bits")]
    WidthTooLarge(u32),
}

/// A rejected payload. Nothing from a rejected payload is ever emitted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The port selects no known wire format.
    #[error("unknown port {0}")]
    UnknownPort(u8),
    /// The payload length is not valid for the port (or for its flag byte).
    #[error("invalid length {length} for port {port}")]
    InvalidLength { port: u8, length: usize },
    /// A mandatory or declared-present field ran past the end of the payload.
    #[error("truncated field {field} at bit {bit_position}")]
    TruncatedField {
        field: &'static str,
        bit_position: usize,
    },
    /// Reserved flag bits were set (only raised with strict flag checking).
    #[error("invalid flag combination {0:#04x}")]
    InvalidFlagCombination(u8),
}
