//! Symbol Text Definition (Host -> IG, 3.3 and later)
//!
//! Variable length: a fixed head followed by NUL-terminated UTF-8 text,
//! zero padded so the packet size is a multiple of eight.

use super::{align8, bits, invalid, PacketBody, PacketKind, PacketSize};
use crate::byte_order::{PacketReader, PacketWriter};
use crate::error::Result;
use crate::version::WireLayout;

/// Size of the fixed part, header included.
const HEAD_LEN: usize = 12;

/// Anchor point of the text relative to the symbol position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlignment {
    #[default]
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    Center,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
}

impl TextAlignment {
    const ALL: [TextAlignment; 9] = [
        TextAlignment::TopLeft,
        TextAlignment::TopCenter,
        TextAlignment::TopRight,
        TextAlignment::CenterLeft,
        TextAlignment::Center,
        TextAlignment::CenterRight,
        TextAlignment::BottomLeft,
        TextAlignment::BottomCenter,
        TextAlignment::BottomRight,
    ];

    fn from_bits(value: u8) -> Result<Self> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| invalid("symbol_text.alignment", value))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextOrientation {
    #[default]
    LeftToRight,
    TopToBottom,
    RightToLeft,
    BottomToTop,
}

impl TextOrientation {
    fn from_bits(value: u8) -> Self {
        match value & 0b11 {
            0 => TextOrientation::LeftToRight,
            1 => TextOrientation::TopToBottom,
            2 => TextOrientation::RightToLeft,
            _ => TextOrientation::BottomToTop,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SymbolTextDefinition {
    pub symbol_id: u16,
    pub alignment: TextAlignment,
    pub orientation: TextOrientation,
    pub font_id: u8,
    pub font_size: f32,
    pub text: String,
}

impl PacketBody for SymbolTextDefinition {
    const KIND: PacketKind = PacketKind::SymbolTextDefinition;

    fn wire_size(layout: WireLayout) -> Option<PacketSize> {
        match layout {
            WireLayout::Cigi3 => None,
            _ => Some(PacketSize::Variable {
                min: HEAD_LEN + 4,
                step: 8,
            }),
        }
    }

    fn decode(reader: &mut PacketReader<'_>, layout: WireLayout) -> Result<Self> {
        let symbol_id = reader.get_u16()?;
        let flags = reader.get_u8()?;
        let font_id = reader.get_u8()?;
        reader.skip(HEAD_LEN - 8 - layout.header_len())?;
        let font_size = reader.get_f32()?;
        let raw = reader.rest();
        let text_len = raw.iter().position(|byte| *byte == 0).unwrap_or(raw.len());

        Ok(Self {
            symbol_id,
            alignment: TextAlignment::from_bits(bits(flags, 0, 4))?,
            orientation: TextOrientation::from_bits(bits(flags, 4, 2)),
            font_id,
            font_size,
            text: String::from_utf8_lossy(&raw[..text_len]).into_owned(),
        })
    }

    fn encode(&self, writer: &mut PacketWriter<'_>, layout: WireLayout) -> Result<()> {
        let body_len = self.encoded_len(layout) - layout.header_len();
        writer.put_u16(self.symbol_id);
        writer.put_u8(self.alignment as u8 | ((self.orientation as u8) << 4));
        writer.put_u8(self.font_id);
        writer.put_zeros(HEAD_LEN - 8 - layout.header_len());
        writer.put_f32(self.font_size);
        writer.put_slice(self.text.as_bytes());
        writer.pad_to(body_len);
        Ok(())
    }

    fn encoded_len(&self, _layout: WireLayout) -> usize {
        align8(HEAD_LEN + self.text.len() + 1)
    }
}
