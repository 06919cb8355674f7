//! Packet registration table
//!
//! A [`PacketRegistry`] maps the wire id of every packet available in one
//! protocol version to its kind and size. The session builds it once; the
//! incoming side looks codecs up by id and the outgoing side by kind.
//!
//! # Example
//!
//! ```
//! use cigi_protocol::{CigiVersion, PacketKind, PacketRegistry};
//!
//! let registry = PacketRegistry::for_version(CigiVersion::V3_3).unwrap();
//! let codec = registry.codec_for_id(2).unwrap();
//! assert_eq!(codec.kind, PacketKind::EntityControl);
//! ```

use crate::byte_order::{ByteOrder, PacketWriter};
use crate::error::{CodecError, Result};
use crate::packets::{PacketKind, PacketSize};
use crate::version::{CigiVersion, WireLayout};
use std::collections::HashMap;

/// Registration entry for one packet kind in one version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketCodec {
    pub kind: PacketKind,
    pub id: u16,
    pub size: PacketSize,
}

/// Decoded packet header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    pub id: u16,
    /// Declared packet size, header included
    pub size: usize,
}

#[derive(Debug, Clone)]
pub struct PacketRegistry {
    version: CigiVersion,
    layout: WireLayout,
    by_id: HashMap<u16, PacketCodec>,
    by_kind: HashMap<PacketKind, PacketCodec>,
}

impl PacketRegistry {
    /// Builds the table for `version`.
    ///
    /// # Returns
    ///
    /// `CodecError::UnsupportedVersion` if the version is not one of
    /// [`CigiVersion::SUPPORTED`].
    pub fn for_version(version: CigiVersion) -> Result<Self> {
        let layout = version.layout()?;
        let mut registry = Self {
            version,
            layout,
            by_id: HashMap::new(),
            by_kind: HashMap::new(),
        };
        for &kind in PacketKind::ALL {
            if let Some(size) = kind.wire_size(layout) {
                registry.insert(PacketCodec {
                    kind,
                    id: kind.wire_id(),
                    size,
                });
            }
        }
        Ok(registry)
    }

    fn insert(&mut self, codec: PacketCodec) {
        self.by_id.insert(codec.id, codec);
        self.by_kind.insert(codec.kind, codec);
    }

    /// Removes a kind from the table so it is skipped on decode and refused
    /// on encode.
    pub fn unregister(&mut self, kind: PacketKind) -> Option<PacketCodec> {
        let codec = self.by_kind.remove(&kind)?;
        self.by_id.remove(&codec.id);
        Some(codec)
    }

    pub fn version(&self) -> CigiVersion {
        self.version
    }

    pub fn layout(&self) -> WireLayout {
        self.layout
    }

    pub fn codec_for_id(&self, id: u16) -> Option<&PacketCodec> {
        self.by_id.get(&id)
    }

    pub fn codec_for_kind(&self, kind: PacketKind) -> Option<&PacketCodec> {
        self.by_kind.get(&kind)
    }

    pub fn is_registered(&self, kind: PacketKind) -> bool {
        self.by_kind.contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Registered kinds in wire-id order.
    pub fn kinds(&self) -> Vec<PacketKind> {
        let mut kinds: Vec<PacketKind> = self.by_kind.keys().copied().collect();
        kinds.sort_by_key(|kind| kind.wire_id());
        kinds
    }

    /// Reads the header at the start of `buf`.
    pub fn read_header(&self, buf: &[u8], order: ByteOrder) -> Result<PacketHeader> {
        let header_len = self.layout.header_len();
        if buf.len() < header_len {
            return Err(CodecError::Truncated {
                needed: header_len,
                available: buf.len(),
            });
        }
        let header = match self.layout {
            WireLayout::Cigi3 | WireLayout::Cigi3_3 => PacketHeader {
                id: buf[0] as u16,
                size: buf[1] as usize,
            },
            WireLayout::Cigi4 => {
                let word = |at: usize| {
                    let raw = [buf[at], buf[at + 1]];
                    match order {
                        ByteOrder::Big => u16::from_be_bytes(raw),
                        ByteOrder::Little => u16::from_le_bytes(raw),
                    }
                };
                PacketHeader {
                    size: word(0) as usize,
                    id: word(2),
                }
            }
        };
        if header.size < header_len {
            return Err(CodecError::InvalidHeader {
                packet_id: header.id,
                declared: header.size,
            });
        }
        Ok(header)
    }

    /// Writes a header for `codec` declaring `size` bytes.
    pub(crate) fn write_header(&self, writer: &mut PacketWriter<'_>, codec: &PacketCodec, size: usize) -> Result<()> {
        if size > self.layout.max_packet_len() {
            return Err(CodecError::PacketTooLarge {
                kind: codec.kind,
                size,
            });
        }
        match self.layout {
            WireLayout::Cigi3 | WireLayout::Cigi3_3 => {
                writer.put_u8(codec.id as u8);
                writer.put_u8(size as u8);
            }
            WireLayout::Cigi4 => {
                writer.put_u16(size as u16);
                writer.put_u16(codec.id);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbology_only_from_3_3() {
        let v3 = PacketRegistry::for_version(CigiVersion::V3_2).unwrap();
        let v33 = PacketRegistry::for_version(CigiVersion::V3_3).unwrap();
        assert!(!v3.is_registered(PacketKind::SymbolControl));
        assert!(v33.is_registered(PacketKind::SymbolControl));
        assert_eq!(v33.len(), PacketKind::ALL.len());
        assert_eq!(v3.len(), PacketKind::ALL.len() - 5);
    }

    #[test]
    fn unsupported_version_fails() {
        let err = PacketRegistry::for_version(CigiVersion::new(1, 0)).unwrap_err();
        assert_eq!(err, CodecError::UnsupportedVersion(CigiVersion::new(1, 0)));
    }

    #[test]
    fn wide_headers_follow_stream_order() {
        let registry = PacketRegistry::for_version(CigiVersion::V4_0).unwrap();
        let big = registry.read_header(&[0x00, 0x38, 0x00, 0x02], ByteOrder::Big).unwrap();
        let little = registry.read_header(&[0x38, 0x00, 0x02, 0x00], ByteOrder::Little).unwrap();
        assert_eq!(big, PacketHeader { id: 2, size: 56 });
        assert_eq!(big, little);
    }

    #[test]
    fn header_smaller_than_itself_is_invalid() {
        let registry = PacketRegistry::for_version(CigiVersion::V3_0).unwrap();
        assert_eq!(
            registry.read_header(&[2, 1], ByteOrder::Big),
            Err(CodecError::InvalidHeader {
                packet_id: 2,
                declared: 1
            })
        );
        assert!(matches!(
            registry.read_header(&[2], ByteOrder::Big),
            Err(CodecError::Truncated { .. })
        ));
    }

    #[test]
    fn unregister_removes_both_directions() {
        let mut registry = PacketRegistry::for_version(CigiVersion::V3_3).unwrap();
        let codec = registry.unregister(PacketKind::ViewControl).unwrap();
        assert_eq!(codec.id, 16);
        assert!(registry.codec_for_id(16).is_none());
        assert!(registry.codec_for_kind(PacketKind::ViewControl).is_none());
        assert!(registry.unregister(PacketKind::ViewControl).is_none());
    }
}
