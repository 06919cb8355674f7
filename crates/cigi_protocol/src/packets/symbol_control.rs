//! Symbol Control (Host -> IG, 3.3 and later)
//!
//! Changes state, attachment, layer, flash, color and transform of one symbol.

use super::{bit, bits, flag, invalid, PacketBody, PacketKind, PacketSize};
use crate::byte_order::{PacketReader, PacketWriter};
use crate::error::Result;
use crate::version::WireLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SymbolStateField {
    #[default]
    Hidden,
    Visible,
    Destroyed,
}

impl SymbolStateField {
    fn from_bits(value: u8) -> Result<Self> {
        match value {
            0 => Ok(SymbolStateField::Hidden),
            1 => Ok(SymbolStateField::Visible),
            2 => Ok(SymbolStateField::Destroyed),
            other => Err(invalid("symbol_control.symbol_state", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SymbolControl {
    pub symbol_id: u16,
    pub state: SymbolStateField,
    pub attached: bool,
    /// Restart the flash sequence from the beginning
    pub flash_reset: bool,
    pub inherit_color: bool,
    pub parent_symbol_id: u16,
    pub surface_id: u16,
    pub layer: u8,
    pub flash_duty_cycle: u8,
    pub flash_period: f32,
    pub position_u: f32,
    pub position_v: f32,
    pub rotation: f32,
    /// Red, green, blue, alpha
    pub color: [u8; 4],
    pub scale_u: f32,
    pub scale_v: f32,
}

impl PacketBody for SymbolControl {
    const KIND: PacketKind = PacketKind::SymbolControl;

    fn wire_size(layout: WireLayout) -> Option<PacketSize> {
        match layout {
            WireLayout::Cigi3 => None,
            WireLayout::Cigi3_3 => Some(PacketSize::Fixed(40)),
            WireLayout::Cigi4 => Some(PacketSize::Fixed(48)),
        }
    }

    fn decode(reader: &mut PacketReader<'_>, layout: WireLayout) -> Result<Self> {
        let symbol_id = reader.get_u16()?;
        let flags = reader.get_u8()?;
        reader.skip(1)?;
        let parent_symbol_id = reader.get_u16()?;
        let surface_id = reader.get_u16()?;
        let layer = reader.get_u8()?;
        let flash_duty_cycle = reader.get_u8()?;
        if layout == WireLayout::Cigi4 {
            reader.skip(2)?;
        }
        let flash_period = reader.get_f32()?;
        let position_u = reader.get_f32()?;
        let position_v = reader.get_f32()?;
        let rotation = reader.get_f32()?;
        let mut color = [0u8; 4];
        color.copy_from_slice(reader.get_slice(4)?);
        let scale_u = reader.get_f32()?;
        let scale_v = reader.get_f32()?;
        if layout == WireLayout::Cigi4 {
            reader.skip(4)?;
        }

        Ok(Self {
            symbol_id,
            state: SymbolStateField::from_bits(bits(flags, 0, 2))?,
            attached: bit(flags, 2),
            flash_reset: bit(flags, 3),
            inherit_color: bit(flags, 4),
            parent_symbol_id,
            surface_id,
            layer,
            flash_duty_cycle,
            flash_period,
            position_u,
            position_v,
            rotation,
            color,
            scale_u,
            scale_v,
        })
    }

    fn encode(&self, writer: &mut PacketWriter<'_>, layout: WireLayout) -> Result<()> {
        if self.flash_duty_cycle > 100 {
            return Err(invalid("symbol_control.flash_duty_cycle", self.flash_duty_cycle));
        }
        writer.put_u16(self.symbol_id);
        writer.put_u8(
            self.state as u8
                | flag(self.attached, 2)
                | flag(self.flash_reset, 3)
                | flag(self.inherit_color, 4),
        );
        writer.put_u8(0);
        writer.put_u16(self.parent_symbol_id);
        writer.put_u16(self.surface_id);
        writer.put_u8(self.layer);
        writer.put_u8(self.flash_duty_cycle);
        if layout == WireLayout::Cigi4 {
            writer.put_zeros(2);
        }
        writer.put_f32(self.flash_period);
        writer.put_f32(self.position_u);
        writer.put_f32(self.position_v);
        writer.put_f32(self.rotation);
        writer.put_slice(&self.color);
        writer.put_f32(self.scale_u);
        writer.put_f32(self.scale_v);
        if layout == WireLayout::Cigi4 {
            writer.put_zeros(4);
        }
        Ok(())
    }
}
