//! Articulated Part Control (Host -> IG)

use super::{PacketBody, PacketKind, PacketSize};
use crate::byte_order::{PacketReader, PacketWriter};
use crate::error::Result;
use crate::version::WireLayout;
use bitflags::bitflags;

bitflags! {
    /// Which fields of an articulated part control apply.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ArticulationEnables: u8 {
        const PART_ENABLED = 1 << 0;
        const X_OFFSET = 1 << 1;
        const Y_OFFSET = 1 << 2;
        const Z_OFFSET = 1 << 3;
        const ROLL = 1 << 4;
        const PITCH = 1 << 5;
        const YAW = 1 << 6;
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ArticulatedPartControl {
    pub entity_id: u16,
    pub part_id: u8,
    pub enables: ArticulationEnables,
    pub x_offset: f32,
    pub y_offset: f32,
    pub z_offset: f32,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
}

impl PacketBody for ArticulatedPartControl {
    const KIND: PacketKind = PacketKind::ArticulatedPartControl;

    fn wire_size(_layout: WireLayout) -> Option<PacketSize> {
        Some(PacketSize::Fixed(32))
    }

    fn decode(reader: &mut PacketReader<'_>, layout: WireLayout) -> Result<Self> {
        let entity_id = reader.get_u16()?;
        let part_id = reader.get_u8()?;
        let enables = ArticulationEnables::from_bits_truncate(reader.get_u8()?);
        if layout != WireLayout::Cigi4 {
            reader.skip(2)?;
        }
        Ok(Self {
            entity_id,
            part_id,
            enables,
            x_offset: reader.get_f32()?,
            y_offset: reader.get_f32()?,
            z_offset: reader.get_f32()?,
            roll: reader.get_f32()?,
            pitch: reader.get_f32()?,
            yaw: reader.get_f32()?,
        })
    }

    fn encode(&self, writer: &mut PacketWriter<'_>, layout: WireLayout) -> Result<()> {
        writer.put_u16(self.entity_id);
        writer.put_u8(self.part_id);
        writer.put_u8(self.enables.bits());
        if layout != WireLayout::Cigi4 {
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
        Ok(())
    }
}
