//! Error types for the CIGI codec

use crate::packets::PacketKind;
use crate::version::CigiVersion;

/// Errors raised while negotiating a session or translating packets.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// The requested protocol version has no registration table
    #[error("Unsupported CIGI version: {0}")]
    UnsupportedVersion(CigiVersion),

    /// Fewer bytes are left than a header or field requires
    #[error("Truncated stream: needed {needed} bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    /// A header declared a size its codec cannot produce or consume
    #[error("Size mismatch for packet id {packet_id}: declared {declared} bytes, codec uses {actual}")]
    SizeMismatch {
        packet_id: u16,
        declared: usize,
        actual: usize,
    },

    /// The declared size cannot even cover the header
    #[error("Invalid header for packet id {packet_id}: declared size {declared}")]
    InvalidHeader { packet_id: u16, declared: usize },

    /// No codec exists for this packet kind in the negotiated version
    #[error("Packet {kind:?} is not available in CIGI {version}")]
    UnsupportedPacket { kind: PacketKind, version: CigiVersion },

    /// An encoded packet would not fit the header's size field
    #[error("Packet {kind:?} is too large to encode: {size} bytes")]
    PacketTooLarge { kind: PacketKind, size: usize },

    /// The message does not start with the packet that carries the byte-swap magic
    #[error("Message must start with {expected:?} but starts with packet id {found}")]
    MissingIgControl { expected: PacketKind, found: u16 },

    /// The byte-swap magic number is neither 0x8000 nor its swapped form
    #[error("Unrecognised byte-swap magic: {0:#06x}")]
    BadMagic(u16),

    /// A field holds a value outside its documented range
    #[error("Invalid value for {field}: {value}")]
    InvalidField { field: &'static str, value: u32 },
}

pub type Result<T> = std::result::Result<T, CodecError>;
