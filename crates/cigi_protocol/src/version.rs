//! CIGI protocol versions
//!
//! A session negotiates one `major.minor` version at construction and keeps it
//! for its whole life. Versions that share a wire layout (3.0 to 3.2) share
//! codecs; the layout decides header shape and packet offsets.
//!
//! | Version | Layout | Header |
//! |---|---|---|
//! | 3.0, 3.1, 3.2 | [`WireLayout::Cigi3`] | `id: u8, size: u8` |
//! | 3.3 | [`WireLayout::Cigi3_3`] | `id: u8, size: u8` |
//! | 4.0 | [`WireLayout::Cigi4`] | `size: u16, id: u16` |

use crate::error::{CodecError, Result};
use std::fmt;

/// A CIGI `major.minor` protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CigiVersion {
    pub major: u8,
    pub minor: u8,
}

/// Packet layout family shared by one or more protocol versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireLayout {
    Cigi3,
    Cigi3_3,
    Cigi4,
}

impl CigiVersion {
    pub const V3_0: CigiVersion = CigiVersion::new(3, 0);
    pub const V3_1: CigiVersion = CigiVersion::new(3, 1);
    pub const V3_2: CigiVersion = CigiVersion::new(3, 2);
    pub const V3_3: CigiVersion = CigiVersion::new(3, 3);
    pub const V4_0: CigiVersion = CigiVersion::new(4, 0);

    /// Every version this crate can negotiate, oldest first.
    pub const SUPPORTED: [CigiVersion; 5] = [
        Self::V3_0,
        Self::V3_1,
        Self::V3_2,
        Self::V3_3,
        Self::V4_0,
    ];

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    pub fn is_supported(self) -> bool {
        Self::SUPPORTED.contains(&self)
    }

    /// Resolves the wire layout used by this version.
    ///
    /// # Returns
    ///
    /// `CodecError::UnsupportedVersion` when the version is unknown.
    pub fn layout(self) -> Result<WireLayout> {
        match (self.major, self.minor) {
            (3, 0..=2) => Ok(WireLayout::Cigi3),
            (3, 3) => Ok(WireLayout::Cigi3_3),
            (4, 0) => Ok(WireLayout::Cigi4),
            _ => Err(CodecError::UnsupportedVersion(self)),
        }
    }

    /// Parses `"3.3"` style strings.
    pub fn parse(text: &str) -> Option<Self> {
        let (major, minor) = text.trim().split_once('.')?;
        Some(Self::new(major.parse().ok()?, minor.parse().ok()?))
    }
}

impl fmt::Display for CigiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl WireLayout {
    /// Size in bytes of the packet header.
    pub fn header_len(self) -> usize {
        match self {
            WireLayout::Cigi3 | WireLayout::Cigi3_3 => 2,
            WireLayout::Cigi4 => 4,
        }
    }

    /// Largest size the header can declare.
    pub fn max_packet_len(self) -> usize {
        match self {
            WireLayout::Cigi3 | WireLayout::Cigi3_3 => u8::MAX as usize,
            WireLayout::Cigi4 => u16::MAX as usize & !7,
        }
    }

    /// Offset of the byte-swap magic inside IG Control and Start Of Frame.
    pub fn magic_offset(self) -> usize {
        self.header_len() + 4
    }

    /// Whether symbology packets exist in this layout.
    pub fn has_symbology(self) -> bool {
        !matches!(self, WireLayout::Cigi3)
    }
}
