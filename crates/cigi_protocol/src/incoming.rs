//! Incoming message parsing
//!
//! An [`Incoming`] turns one received datagram into a lazy sequence of
//! packets. The caller keeps the buffer alive while iterating; nothing is
//! copied.
//!
//! Every message must start with the packet carrying the byte-swap magic
//! (IG Control for an IG, Start Of Frame for a Host). Its position tells the
//! sender's byte order, and the rest of the message is read in that order.
//!
//! Parsing rules:
//!
//! - an unknown packet id is skipped using its declared size,
//! - a header that declares more bytes than remain, or fewer than the header
//!   itself, ends the message with an error,
//! - a declared size the codec does not accept ends the message with an
//!   error (the stream is out of sync),
//! - a field outside its range rejects that one packet and parsing goes on.

use crate::byte_order::{ByteOrder, PacketReader};
use crate::error::{CodecError, Result};
use crate::packets::{CigiPacket, PacketKind};
use crate::registry::PacketRegistry;
use crate::router::PacketRouter;
use std::cell::Cell;
use std::sync::Arc;
use tracing::{debug, warn};

/// Counters kept across every message an [`Incoming`] parses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncomingStats {
    pub messages: u64,
    pub decoded: u64,
    /// Unknown packet ids skipped
    pub skipped: u64,
    /// Packets or messages rejected with an error
    pub rejected: u64,
}

impl CodecError {
    /// Whether parsing can continue with the next packet after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, CodecError::InvalidField { .. })
    }
}

pub struct Incoming {
    registry: Arc<PacketRegistry>,
    first_packet: PacketKind,
    stats: Cell<IncomingStats>,
}

impl Incoming {
    /// # Arguments
    ///
    /// * `registry` - Packet table of the negotiated version
    /// * `first_packet` - Kind every message must start with
    pub fn new(registry: Arc<PacketRegistry>, first_packet: PacketKind) -> Self {
        Self {
            registry,
            first_packet,
            stats: Cell::new(IncomingStats::default()),
        }
    }

    pub fn registry(&self) -> &PacketRegistry {
        &self.registry
    }

    pub fn stats(&self) -> IncomingStats {
        self.stats.get()
    }

    pub fn reset_stats(&self) {
        self.stats.set(IncomingStats::default());
    }

    fn bump(&self, update: impl FnOnce(&mut IncomingStats)) {
        let mut stats = self.stats.get();
        update(&mut stats);
        self.stats.set(stats);
    }

    /// Iterates over the packets in `buf`.
    ///
    /// The sequence is consumed once; call again with the next buffer.
    pub fn packets<'a>(&'a self, buf: &'a [u8]) -> PacketIter<'a> {
        self.bump(|stats| stats.messages += 1);
        let (order, pending) = if buf.is_empty() {
            (ByteOrder::Big, None)
        } else {
            match self.detect_byte_order(buf) {
                Ok(order) => (order, None),
                Err(err) => (ByteOrder::Big, Some(err)),
            }
        };
        PacketIter {
            incoming: self,
            buf,
            pos: 0,
            order,
            pending,
            fused: false,
        }
    }

    /// Parses `buf` and routes every packet through `router`.
    ///
    /// # Returns
    ///
    /// The number of packets routed, or the error that ended the message.
    /// Packets before the error have already been routed.
    pub fn dispatch(&self, buf: &[u8], router: &PacketRouter) -> Result<usize> {
        let mut routed = 0;
        for packet in self.packets(buf) {
            match packet {
                Ok(packet) => {
                    router.route(&packet);
                    routed += 1;
                }
                Err(err) if err.is_recoverable() => {
                    warn!("⚠️ Rejected packet: {}", err);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(routed)
    }

    /// Finds the sender's byte order from the magic in the first packet.
    fn detect_byte_order(&self, buf: &[u8]) -> Result<ByteOrder> {
        let layout = self.registry.layout();
        let header_len = layout.header_len();
        if buf.len() < header_len {
            return Err(CodecError::Truncated {
                needed: header_len,
                available: buf.len(),
            });
        }

        let expected = self.first_packet.wire_id();
        let found = match layout.header_len() {
            2 => buf[0] as u16,
            _ => {
                let raw = [buf[2], buf[3]];
                if u16::from_be_bytes(raw) == expected || u16::from_le_bytes(raw) == expected {
                    expected
                } else {
                    u16::from_be_bytes(raw)
                }
            }
        };
        if found != expected {
            return Err(CodecError::MissingIgControl {
                expected: self.first_packet,
                found,
            });
        }

        let offset = layout.magic_offset();
        if buf.len() < offset + 2 {
            return Err(CodecError::Truncated {
                needed: offset + 2,
                available: buf.len(),
            });
        }
        ByteOrder::from_magic([buf[offset], buf[offset + 1]])
    }
}

/// Lazy packet sequence over one message. Fused after a framing error.
pub struct PacketIter<'a> {
    incoming: &'a Incoming,
    buf: &'a [u8],
    pos: usize,
    order: ByteOrder,
    pending: Option<CodecError>,
    fused: bool,
}

impl<'a> PacketIter<'a> {
    /// Byte order detected for this message.
    pub fn byte_order(&self) -> ByteOrder {
        self.order
    }

    fn fail(&mut self, err: CodecError) -> Option<Result<CigiPacket>> {
        if !err.is_recoverable() {
            self.fused = true;
        }
        self.incoming.bump(|stats| stats.rejected += 1);
        Some(Err(err))
    }
}

impl<'a> Iterator for PacketIter<'a> {
    type Item = Result<CigiPacket>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(err) = self.pending.take() {
            return self.fail(err);
        }
        let incoming = self.incoming;
        let registry = &incoming.registry;
        let layout = registry.layout();

        loop {
            if self.fused || self.pos >= self.buf.len() {
                return None;
            }
            let rest = &self.buf[self.pos..];
            let header = match registry.read_header(rest, self.order) {
                Ok(header) => header,
                Err(err) => return self.fail(err),
            };
            if header.size > rest.len() {
                return self.fail(CodecError::Truncated {
                    needed: header.size,
                    available: rest.len(),
                });
            }
            let body = &rest[layout.header_len()..header.size];
            self.pos += header.size;

            let Some(codec) = registry.codec_for_id(header.id) else {
                debug!(
                    "Skipping unregistered packet id {} ({} bytes)",
                    header.id, header.size
                );
                incoming.bump(|stats| stats.skipped += 1);
                continue;
            };
            if !codec.size.accepts(header.size) {
                return self.fail(CodecError::SizeMismatch {
                    packet_id: header.id,
                    declared: header.size,
                    actual: codec.size.min(),
                });
            }

            let mut reader = PacketReader::new(body, self.order);
            let packet = match CigiPacket::decode(codec.kind, &mut reader, layout) {
                Ok(packet) => packet,
                Err(err) => return self.fail(err),
            };
            if reader.remaining() != 0 {
                return self.fail(CodecError::SizeMismatch {
                    packet_id: header.id,
                    declared: header.size,
                    actual: header.size - reader.remaining(),
                });
            }
            incoming.bump(|stats| stats.decoded += 1);
            return Some(Ok(packet));
        }
    }
}

impl std::iter::FusedIterator for PacketIter<'_> {}
