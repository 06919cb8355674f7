//! Symbol Clone (Host -> IG, 3.3 and later)

use super::{bit, flag, PacketBody, PacketKind, PacketSize};
use crate::byte_order::{PacketReader, PacketWriter};
use crate::error::Result;
use crate::version::WireLayout;

/// What the new symbol is copied from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CloneSource {
    #[default]
    Symbol,
    /// An IG-defined symbol template
    Template,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SymbolClone {
    /// Id of the symbol to create
    pub symbol_id: u16,
    pub source_type: CloneSource,
    pub source_id: u16,
}

impl PacketBody for SymbolClone {
    const KIND: PacketKind = PacketKind::SymbolClone;

    fn wire_size(layout: WireLayout) -> Option<PacketSize> {
        match layout {
            WireLayout::Cigi3 => None,
            WireLayout::Cigi3_3 => Some(PacketSize::Fixed(8)),
            WireLayout::Cigi4 => Some(PacketSize::Fixed(16)),
        }
    }

    fn decode(reader: &mut PacketReader<'_>, layout: WireLayout) -> Result<Self> {
        let symbol_id = reader.get_u16()?;
        let source = reader.get_u8()?;
        reader.skip(1)?;
        let source_id = reader.get_u16()?;
        if layout == WireLayout::Cigi4 {
            reader.skip(6)?;
        }
        Ok(Self {
            symbol_id,
            source_type: if bit(source, 0) {
                CloneSource::Template
            } else {
                CloneSource::Symbol
            },
            source_id,
        })
    }

    fn encode(&self, writer: &mut PacketWriter<'_>, layout: WireLayout) -> Result<()> {
        writer.put_u16(self.symbol_id);
        writer.put_u8(flag(self.source_type == CloneSource::Template, 0));
        writer.put_u8(0);
        writer.put_u16(self.source_id);
        if layout == WireLayout::Cigi4 {
            writer.put_zeros(6);
        }
        Ok(())
    }
}
