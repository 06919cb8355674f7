//! View Control (Host -> IG)
//!
//! Places a view's eyepoint relative to the entity it is attached to.

use super::{PacketBody, PacketKind, PacketSize};
use crate::byte_order::{PacketReader, PacketWriter};
use crate::error::Result;
use crate::version::WireLayout;
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ViewControlEnables: u8 {
        const X_OFFSET = 1 << 0;
        const Y_OFFSET = 1 << 1;
        const Z_OFFSET = 1 << 2;
        const ROLL = 1 << 3;
        const PITCH = 1 << 4;
        const YAW = 1 << 5;
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewControl {
    pub view_id: u16,
    pub group_id: u8,
    pub enables: ViewControlEnables,
    pub entity_id: u16,
    pub x_offset: f32,
    pub y_offset: f32,
    pub z_offset: f32,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl PacketBody for ViewControl {
    const KIND: PacketKind = PacketKind::ViewControl;

    fn wire_size(layout: WireLayout) -> Option<PacketSize> {
        Some(PacketSize::Fixed(match layout {
            WireLayout::Cigi3 | WireLayout::Cigi3_3 => 32,
            WireLayout::Cigi4 => 40,
        }))
    }

    fn decode(reader: &mut PacketReader<'_>, layout: WireLayout) -> Result<Self> {
        let view_id = reader.get_u16()?;
        let group_id = reader.get_u8()?;
        let enables = ViewControlEnables::from_bits_truncate(reader.get_u8()?);
        let entity_id = reader.get_u16()?;
        if layout == WireLayout::Cigi4 {
            reader.skip(2)?;
        }
        let packet = Self {
            view_id,
            group_id,
            enables,
            entity_id,
            x_offset: reader.get_f32()?,
            y_offset: reader.get_f32()?,
            z_offset: reader.get_f32()?,
            roll: reader.get_f32()?,
            pitch: reader.get_f32()?,
            yaw: reader.get_f32()?,
        };
        if layout == WireLayout::Cigi4 {
            reader.skip(4)?;
        }
        Ok(packet)
    }

    fn encode(&self, writer: &mut PacketWriter<'_>, layout: WireLayout) -> Result<()> {
        writer.put_u16(self.view_id);
        writer.put_u8(self.group_id);
        writer.put_u8(self.enables.bits());
        writer.put_u16(self.entity_id);
        if layout == WireLayout::Cigi4 {
            writer.put_zeros(2);
        }
        for value in [
            self.x_offset,
            self.y_offset,
            self.z_offset,
            self.roll,
            self.pitch,
            self.yaw,
        ] {
            writer.put_f32(value);
        }
        if layout == WireLayout::Cigi4 {
            writer.put_zeros(4);
        }
        Ok(())
    }
}
