//! Symbol Surface Definition (Host -> IG, 3.3 and later)
//!
//! Entity-attached surfaces use the position/orientation/size fields;
//! view-attached surfaces reuse the first four floats as normalised
//! left/right/top/bottom view extents.

use super::{bit, flag, PacketBody, PacketKind, PacketSize};
use crate::byte_order::{PacketReader, PacketWriter};
use crate::error::Result;
use crate::version::WireLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceStateField {
    #[default]
    Active,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceAttachType {
    #[default]
    Entity,
    View,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SymbolSurfaceDefinition {
    pub surface_id: u16,
    pub state: SurfaceStateField,
    pub attach_type: SurfaceAttachType,
    pub billboard: bool,
    pub perspective_growth: bool,
    /// Entity id or view id, depending on `attach_type`
    pub host_id: u16,
    pub x_or_left: f32,
    pub y_or_right: f32,
    pub z_or_top: f32,
    pub yaw_or_bottom: f32,
    pub pitch: f32,
    pub roll: f32,
    pub width: f32,
    pub height: f32,
    pub min_u: f32,
    pub max_u: f32,
    pub min_v: f32,
    pub max_v: f32,
}

impl PacketBody for SymbolSurfaceDefinition {
    const KIND: PacketKind = PacketKind::SymbolSurfaceDefinition;

    fn wire_size(layout: WireLayout) -> Option<PacketSize> {
        match layout {
            WireLayout::Cigi3 => None,
            WireLayout::Cigi3_3 => Some(PacketSize::Fixed(56)),
            WireLayout::Cigi4 => Some(PacketSize::Fixed(64)),
        }
    }

    fn decode(reader: &mut PacketReader<'_>, layout: WireLayout) -> Result<Self> {
        let surface_id = reader.get_u16()?;
        let flags = reader.get_u8()?;
        reader.skip(1)?;
        let host_id = reader.get_u16()?;
        if layout == WireLayout::Cigi4 {
            reader.skip(2)?;
        }
        let packet = Self {
            surface_id,
            state: if bit(flags, 0) {
                SurfaceStateField::Destroyed
            } else {
                SurfaceStateField::Active
            },
            attach_type: if bit(flags, 1) {
                SurfaceAttachType::View
            } else {
                SurfaceAttachType::Entity
            },
            billboard: bit(flags, 2),
            perspective_growth: bit(flags, 3),
            host_id,
            x_or_left: reader.get_f32()?,
            y_or_right: reader.get_f32()?,
            z_or_top: reader.get_f32()?,
            yaw_or_bottom: reader.get_f32()?,
            pitch: reader.get_f32()?,
            roll: reader.get_f32()?,
            width: reader.get_f32()?,
            height: reader.get_f32()?,
            min_u: reader.get_f32()?,
            max_u: reader.get_f32()?,
            min_v: reader.get_f32()?,
            max_v: reader.get_f32()?,
        };
        if layout == WireLayout::Cigi4 {
            reader.skip(4)?;
        }
        Ok(packet)
    }

    fn encode(&self, writer: &mut PacketWriter<'_>, layout: WireLayout) -> Result<()> {
        writer.put_u16(self.surface_id);
        writer.put_u8(
            flag(self.state == SurfaceStateField::Destroyed, 0)
                | flag(self.attach_type == SurfaceAttachType::View, 1)
                | flag(self.billboard, 2)
                | flag(self.perspective_growth, 3),
        );
        writer.put_u8(0);
        writer.put_u16(self.host_id);
        if layout == WireLayout::Cigi4 {
            writer.put_zeros(2);
        }
        for value in [
            self.x_or_left,
            self.y_or_right,
            self.z_or_top,
            self.yaw_or_bottom,
            self.pitch,
            self.roll,
            self.width,
            self.height,
            self.min_u,
            self.max_u,
            self.min_v,
            self.max_v,
        ] {
            writer.put_f32(value);
        }
        if layout == WireLayout::Cigi4 {
            writer.put_zeros(4);
        }
        Ok(())
    }
}
