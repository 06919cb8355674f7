//! View Definition (Host -> IG)
//!
//! Sets the frustum of a view. Only the planes whose enable bit is set are
//! meant to be applied by the receiver.

use super::{bit, bits, flag, PacketBody, PacketKind, PacketSize};
use crate::byte_order::{PacketReader, PacketWriter};
use crate::error::Result;
use crate::version::WireLayout;
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FrustumEnables: u8 {
        const NEAR = 1 << 0;
        const FAR = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
        const TOP = 1 << 4;
        const BOTTOM = 1 << 5;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MirrorMode {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

impl MirrorMode {
    fn from_bits(value: u8) -> Self {
        match value & 0b11 {
            0 => MirrorMode::None,
            1 => MirrorMode::Horizontal,
            2 => MirrorMode::Vertical,
            _ => MirrorMode::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Projection {
    #[default]
    Perspective,
    Orthographic,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewDefinition {
    pub view_id: u16,
    pub group_id: u8,
    pub enables: FrustumEnables,
    pub mirror_mode: MirrorMode,
    /// 0 none, 1 to 4 replication factors
    pub pixel_replication: u8,
    pub tracker_assigned: bool,
    pub projection: Projection,
    pub reorder: bool,
    pub view_type: u8,
    pub near: f32,
    pub far: f32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl PacketBody for ViewDefinition {
    const KIND: PacketKind = PacketKind::ViewDefinition;

    fn wire_size(layout: WireLayout) -> Option<PacketSize> {
        Some(PacketSize::Fixed(match layout {
            WireLayout::Cigi3 | WireLayout::Cigi3_3 => 32,
            WireLayout::Cigi4 => 40,
        }))
    }

    fn decode(reader: &mut PacketReader<'_>, layout: WireLayout) -> Result<Self> {
        let view_id = reader.get_u16()?;
        let group_id = reader.get_u8()?;
        let enable_flags = reader.get_u8()?;
        let mode_flags = reader.get_u8()?;
        let view_type = bits(reader.get_u8()?, 0, 3);
        if layout == WireLayout::Cigi4 {
            reader.skip(2)?;
        }
        let packet = Self {
            view_id,
            group_id,
            enables: FrustumEnables::from_bits_truncate(bits(enable_flags, 0, 6)),
            mirror_mode: MirrorMode::from_bits(bits(enable_flags, 6, 2)),
            pixel_replication: bits(mode_flags, 0, 3),
            tracker_assigned: bit(mode_flags, 3),
            projection: if bit(mode_flags, 4) {
                Projection::Orthographic
            } else {
                Projection::Perspective
            },
            reorder: bit(mode_flags, 5),
            view_type,
            near: reader.get_f32()?,
            far: reader.get_f32()?,
            left: reader.get_f32()?,
            right: reader.get_f32()?,
            top: reader.get_f32()?,
            bottom: reader.get_f32()?,
        };
        if layout == WireLayout::Cigi4 {
            reader.skip(4)?;
        }
        Ok(packet)
    }

    fn encode(&self, writer: &mut PacketWriter<'_>, layout: WireLayout) -> Result<()> {
        writer.put_u16(self.view_id);
        writer.put_u8(self.group_id);
        writer.put_u8(self.enables.bits() | ((self.mirror_mode as u8) << 6));
        writer.put_u8(
            (self.pixel_replication & 0b111)
                | flag(self.tracker_assigned, 3)
                | flag(self.projection == Projection::Orthographic, 4)
                | flag(self.reorder, 5),
        );
        writer.put_u8(self.view_type & 0b111);
        if layout == WireLayout::Cigi4 {
            writer.put_zeros(2);
        }
        for value in [self.near, self.far, self.left, self.right, self.top, self.bottom] {
            writer.put_f32(value);
        }
        if layout == WireLayout::Cigi4 {
            writer.put_zeros(4);
        }
        Ok(())
    }
}
