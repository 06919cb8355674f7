//! Outgoing message accumulation

use crate::byte_order::{ByteOrder, PacketWriter};
use crate::error::{CodecError, Result};
use crate::packets::CigiPacket;
use crate::registry::PacketRegistry;
use bytes::{Bytes, BytesMut};
use std::ops::ShlAssign;
use std::sync::Arc;
use tracing::warn;

/// Accumulates encoded packets for one transmission.
///
/// ```rust
/// use cigi_protocol::{CigiPacket, CigiVersion, IgControl, Session, SessionRole};
///
/// let mut session = Session::new(SessionRole::Host, CigiVersion::V3_3).unwrap();
/// let outgoing = session.outgoing_mut();
/// *outgoing <<= &CigiPacket::from(IgControl { major_version: 3, minor_version: 3, ..Default::default() });
/// let message = outgoing.take_buffer();
/// assert_eq!(message.len(), 24);
/// assert!(outgoing.is_empty());
/// ```
pub struct Outgoing {
    registry: Arc<PacketRegistry>,
    order: ByteOrder,
    buffer: BytesMut,
    packet_count: usize,
}

impl Outgoing {
    pub fn new(registry: Arc<PacketRegistry>, order: ByteOrder) -> Self {
        Self {
            registry,
            order,
            buffer: BytesMut::with_capacity(1024),
            packet_count: 0,
        }
    }

    pub fn order(&self) -> ByteOrder {
        self.order
    }

    /// Changes the byte order of packets appended from now on.
    pub fn set_order(&mut self, order: ByteOrder) {
        self.order = order;
    }

    /// Encodes `packet` at the end of the buffer.
    ///
    /// On error nothing is appended.
    pub fn append(&mut self, packet: &CigiPacket) -> Result<()> {
        let layout = self.registry.layout();
        let kind = packet.kind();
        let codec = *self
            .registry
            .codec_for_kind(kind)
            .ok_or(CodecError::UnsupportedPacket {
                kind,
                version: self.registry.version(),
            })?;

        let size = packet.encoded_len(layout);
        if size > layout.max_packet_len() {
            return Err(CodecError::PacketTooLarge { kind, size });
        }
        if !codec.size.accepts(size) {
            return Err(CodecError::SizeMismatch {
                packet_id: codec.id,
                declared: size,
                actual: codec.size.min(),
            });
        }

        let start = self.buffer.len();
        let result = (|| {
            self.registry
                .write_header(&mut PacketWriter::new(&mut self.buffer, self.order), &codec, size)?;
            let mut writer = PacketWriter::new(&mut self.buffer, self.order);
            packet.encode(&mut writer, layout)?;
            let written = layout.header_len() + writer.written();
            if written != size {
                return Err(CodecError::SizeMismatch {
                    packet_id: codec.id,
                    declared: size,
                    actual: written,
                });
            }
            Ok(())
        })();

        match result {
            Ok(()) => {
                self.packet_count += 1;
                Ok(())
            }
            Err(err) => {
                self.buffer.truncate(start);
                Err(err)
            }
        }
    }

    /// Returns the accumulated message and starts a new one.
    pub fn take_buffer(&mut self) -> Bytes {
        self.packet_count = 0;
        self.buffer.split().freeze()
    }

    /// Bytes accumulated so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn packet_count(&self) -> usize {
        self.packet_count
    }
}

impl ShlAssign<&CigiPacket> for Outgoing {
    /// Streaming insert. Encoding errors are logged and the packet dropped;
    /// use [`Outgoing::append`] to handle them.
    fn shl_assign(&mut self, packet: &CigiPacket) {
        if let Err(err) = self.append(packet) {
            warn!("⚠️ Dropped outgoing {:?}: {}", packet.kind(), err);
        }
    }
}
