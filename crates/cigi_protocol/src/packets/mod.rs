//! CIGI packet types
//!
//! Each packet kind is a plain struct implementing [`PacketBody`]. The
//! [`CigiPacket`] enum wraps them for transport through the message buffers
//! and the [`PacketRouter`](crate::router::PacketRouter).
//!
//! Packets describe their layout per [`WireLayout`]; one struct covers every
//! version of "the same" packet, and fields a layout does not carry decode to
//! their defaults.

use crate::byte_order::{PacketReader, PacketWriter};
use crate::error::{CodecError, Result};
use crate::version::WireLayout;

pub mod articulated_part;
pub mod component_control;
pub mod entity_control;
pub mod ig_control;
pub mod start_of_frame;
pub mod symbol_circle;
pub mod symbol_clone;
pub mod symbol_control;
pub mod symbol_surface;
pub mod symbol_text;
pub mod view_control;
pub mod view_definition;

pub use articulated_part::{ArticulatedPartControl, ArticulationEnables};
pub use component_control::{ComponentClass, ComponentControl};
pub use entity_control::{AnimationDirection, AnimationStateField, EntityControl, EntityStateField};
pub use ig_control::{IgControl, IgMode};
pub use start_of_frame::{EarthModel, StartOfFrame};
pub use symbol_circle::{CircleGeometry, DrawingStyle, SymbolCircleDefinition};
pub use symbol_clone::{CloneSource, SymbolClone};
pub use symbol_control::{SymbolControl, SymbolStateField};
pub use symbol_surface::{SurfaceAttachType, SurfaceStateField, SymbolSurfaceDefinition};
pub use symbol_text::{SymbolTextDefinition, TextAlignment, TextOrientation};
pub use view_control::{ViewControl, ViewControlEnables};
pub use view_definition::{FrustumEnables, MirrorMode, Projection, ViewDefinition};

/// How many bytes a packet kind occupies on the wire, header included.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketSize {
    Fixed(usize),
    /// `min + k * step` bytes for any `k >= 0`
    Variable { min: usize, step: usize },
}

impl PacketSize {
    pub fn accepts(self, size: usize) -> bool {
        match self {
            PacketSize::Fixed(expected) => size == expected,
            PacketSize::Variable { min, step } => size >= min && (size - min) % step == 0,
        }
    }

    pub fn min(self) -> usize {
        match self {
            PacketSize::Fixed(size) => size,
            PacketSize::Variable { min, .. } => min,
        }
    }
}

/// Encode/decode contract shared by every packet struct.
pub trait PacketBody: Sized {
    const KIND: PacketKind;

    /// Wire size in `layout`, or `None` when the packet does not exist there.
    fn wire_size(layout: WireLayout) -> Option<PacketSize>;

    /// Parses the payload that follows the header.
    fn decode(reader: &mut PacketReader<'_>, layout: WireLayout) -> Result<Self>;

    /// Writes the payload that follows the header.
    fn encode(&self, writer: &mut PacketWriter<'_>, layout: WireLayout) -> Result<()>;

    /// Total encoded size, header included.
    fn encoded_len(&self, layout: WireLayout) -> usize {
        Self::wire_size(layout).map(PacketSize::min).unwrap_or(0)
    }
}

/// Borrows the concrete packet out of a [`CigiPacket`] of the matching kind.
pub trait FromPacket: PacketBody {
    fn from_packet(packet: &CigiPacket) -> Option<&Self>;
}

macro_rules! cigi_packets {
    ($($variant:ident($ty:ty) = $id:literal,)+) => {
        /// Kind of a CIGI packet, independent of protocol version.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum PacketKind {
            $($variant,)+
        }

        impl PacketKind {
            pub const ALL: &'static [PacketKind] = &[$(PacketKind::$variant,)+];

            /// Packet id used on the wire.
            pub fn wire_id(self) -> u16 {
                match self {
                    $(PacketKind::$variant => $id,)+
                }
            }

            pub fn wire_size(self, layout: WireLayout) -> Option<PacketSize> {
                match self {
                    $(PacketKind::$variant => <$ty as PacketBody>::wire_size(layout),)+
                }
            }
        }

        /// A decoded packet of any supported kind.
        #[derive(Debug, Clone, PartialEq)]
        pub enum CigiPacket {
            $($variant($ty),)+
        }

        impl CigiPacket {
            pub fn kind(&self) -> PacketKind {
                match self {
                    $(CigiPacket::$variant(_) => PacketKind::$variant,)+
                }
            }

            pub(crate) fn decode(
                kind: PacketKind,
                reader: &mut PacketReader<'_>,
                layout: WireLayout,
            ) -> Result<CigiPacket> {
                match kind {
                    $(PacketKind::$variant => Ok(CigiPacket::$variant(<$ty>::decode(reader, layout)?)),)+
                }
            }

            pub(crate) fn encode(&self, writer: &mut PacketWriter<'_>, layout: WireLayout) -> Result<()> {
                match self {
                    $(CigiPacket::$variant(packet) => packet.encode(writer, layout),)+
                }
            }

            pub(crate) fn encoded_len(&self, layout: WireLayout) -> usize {
                match self {
                    $(CigiPacket::$variant(packet) => packet.encoded_len(layout),)+
                }
            }
        }

        $(
            impl From<$ty> for CigiPacket {
                fn from(packet: $ty) -> Self {
                    CigiPacket::$variant(packet)
                }
            }

            impl FromPacket for $ty {
                fn from_packet(packet: &CigiPacket) -> Option<&Self> {
                    match packet {
                        CigiPacket::$variant(inner) => Some(inner),
                        _ => None,
                    }
                }
            }
        )+
    };
}

cigi_packets! {
    IgControl(IgControl) = 1,
    EntityControl(EntityControl) = 2,
    ComponentControl(ComponentControl) = 4,
    ArticulatedPartControl(ArticulatedPartControl) = 6,
    ViewControl(ViewControl) = 16,
    ViewDefinition(ViewDefinition) = 21,
    SymbolSurfaceDefinition(SymbolSurfaceDefinition) = 29,
    SymbolTextDefinition(SymbolTextDefinition) = 30,
    SymbolCircleDefinition(SymbolCircleDefinition) = 31,
    SymbolClone(SymbolClone) = 33,
    SymbolControl(SymbolControl) = 34,
    StartOfFrame(StartOfFrame) = 101,
}

#[inline]
pub(crate) fn bit(byte: u8, index: u8) -> bool {
    (byte >> index) & 1 == 1
}

#[inline]
pub(crate) fn bits(byte: u8, shift: u8, width: u8) -> u8 {
    (byte >> shift) & ((1u8 << width) - 1)
}

#[inline]
pub(crate) fn flag(value: bool, index: u8) -> u8 {
    (value as u8) << index
}

pub(crate) fn invalid(field: &'static str, value: impl Into<u32>) -> CodecError {
    CodecError::InvalidField {
        field,
        value: value.into(),
    }
}

/// Rounds `len` up to the next multiple of eight.
#[inline]
pub(crate) fn align8(len: usize) -> usize {
    (len + 7) & !7
}
