use serde_json::Number;

use crate::protocol::Protocol;

// A fully validated request, ready for dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Raw(RawCommand),
    Encoded(EncodedCommand),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCommand {
    pub pin: u8,
    pub frequency_khz: u8,
    pub pulses: Vec<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedCommand {
    pub pin: u8,
    pub protocol: Protocol,
    pub address: u16,
    pub function: u16,
}

impl Command {
    pub fn pin(&self) -> u8 {
        match self {
            Command::Raw(c) => c.pin,
            Command::Encoded(c) => c.pin,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Command::Raw(_) => "raw",
            Command::Encoded(_) => "encoded",
        }
    }
}

/// Combines device (high byte) and subdevice (low byte) into a 16-bit address.
/// Each part is truncated to 8 bits first.
pub fn address(device: u8, subdevice: u8) -> u16 {
    (u16::from(device) << 8) | u16::from(subdevice)
}

// Numeric fields are truncated, never rejected: fractions drop toward zero,
// then the integer wraps to the target width (0xffffffff -> 0xffff).
fn to_wrapping_i64(n: &Number) -> i64 {
    if let Some(v) = n.as_i64() {
        v
    } else if let Some(v) = n.as_u64() {
        v as i64
    } else {
        // `as` saturates out-of-range floats and maps NaN to 0
        n.as_f64().map(|f| f.trunc() as i64).unwrap_or(0)
    }
}

pub fn truncate_u8(n: &Number) -> u8 {
    to_wrapping_i64(n) as u8
}

pub fn truncate_u16(n: &Number) -> u16 {
    to_wrapping_i64(n) as u16
}
