//! Component Control (Host -> IG)

use super::{bits, PacketBody, PacketKind, PacketSize};
use crate::byte_order::{PacketReader, PacketWriter};
use crate::error::Result;
use crate::version::WireLayout;

/// Class of object a component control addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ComponentClass {
    #[default]
    Entity,
    View,
    ViewGroup,
    Sensor,
    SymbolSurface,
    Symbol,
    /// Environmental and system classes the IG does not model
    Other(u8),
}

impl ComponentClass {
    pub fn from_bits(value: u8) -> Self {
        match value {
            0 => ComponentClass::Entity,
            1 => ComponentClass::View,
            2 => ComponentClass::ViewGroup,
            3 => ComponentClass::Sensor,
            14 => ComponentClass::SymbolSurface,
            15 => ComponentClass::Symbol,
            other => ComponentClass::Other(other),
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            ComponentClass::Entity => 0,
            ComponentClass::View => 1,
            ComponentClass::ViewGroup => 2,
            ComponentClass::Sensor => 3,
            ComponentClass::SymbolSurface => 14,
            ComponentClass::Symbol => 15,
            ComponentClass::Other(value) => value & 0x3F,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ComponentControl {
    pub component_id: u16,
    /// Id of the addressed object (entity id for the entity class)
    pub instance_id: u16,
    pub class: ComponentClass,
    pub state: u8,
    pub data: [u32; 6],
}

impl PacketBody for ComponentControl {
    const KIND: PacketKind = PacketKind::ComponentControl;

    fn wire_size(layout: WireLayout) -> Option<PacketSize> {
        Some(PacketSize::Fixed(match layout {
            WireLayout::Cigi3 | WireLayout::Cigi3_3 => 32,
            WireLayout::Cigi4 => 40,
        }))
    }

    fn decode(reader: &mut PacketReader<'_>, layout: WireLayout) -> Result<Self> {
        let component_id = reader.get_u16()?;
        let instance_id = reader.get_u16()?;
        let class = ComponentClass::from_bits(bits(reader.get_u8()?, 0, 6));
        let state = reader.get_u8()?;
        if layout == WireLayout::Cigi4 {
            reader.skip(6)?;
        }
        let mut data = [0u32; 6];
        for word in data.iter_mut() {
            *word = reader.get_u32()?;
        }
        Ok(Self {
            component_id,
            instance_id,
            class,
            state,
            data,
        })
    }

    fn encode(&self, writer: &mut PacketWriter<'_>, layout: WireLayout) -> Result<()> {
        writer.put_u16(self.component_id);
        writer.put_u16(self.instance_id);
        writer.put_u8(self.class.bits());
        writer.put_u8(self.state);
        if layout == WireLayout::Cigi4 {
            writer.put_zeros(6);
        }
        for word in self.data {
            writer.put_u32(word);
        }
        Ok(())
    }
}
