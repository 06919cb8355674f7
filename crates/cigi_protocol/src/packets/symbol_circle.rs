//! Symbol Circle Definition (Host -> IG, 3.3 and later)
//!
//! A fixed head followed by any number of 24 byte circle records.

use super::{bit, flag, PacketBody, PacketKind, PacketSize};
use crate::byte_order::{PacketReader, PacketWriter};
use crate::error::{CodecError, Result};
use crate::version::WireLayout;

const HEAD_LEN: usize = 24;
const CIRCLE_LEN: usize = 24;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawingStyle {
    #[default]
    Line,
    Fill,
}

/// One circle or arc, in surface (u, v) units and degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CircleGeometry {
    pub center_u: f32,
    pub center_v: f32,
    pub radius: f32,
    pub inner_radius: f32,
    pub start_angle: f32,
    pub end_angle: f32,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SymbolCircleDefinition {
    pub symbol_id: u16,
    pub drawing_style: DrawingStyle,
    pub stipple_pattern: u16,
    pub line_width: f32,
    pub stipple_length: f32,
    pub stipple_factor: f32,
    pub circles: Vec<CircleGeometry>,
}

impl PacketBody for SymbolCircleDefinition {
    const KIND: PacketKind = PacketKind::SymbolCircleDefinition;

    fn wire_size(layout: WireLayout) -> Option<PacketSize> {
        match layout {
            WireLayout::Cigi3 => None,
            _ => Some(PacketSize::Variable {
                min: HEAD_LEN,
                step: CIRCLE_LEN,
            }),
        }
    }

    fn decode(reader: &mut PacketReader<'_>, layout: WireLayout) -> Result<Self> {
        let symbol_id = reader.get_u16()?;
        let style = reader.get_u8()?;
        reader.skip(1)?;
        let stipple_pattern = reader.get_u16()?;
        if layout == WireLayout::Cigi4 {
            reader.skip(2)?;
        }
        let line_width = reader.get_f32()?;
        let stipple_length = reader.get_f32()?;
        let stipple_factor = reader.get_f32()?;
        if layout != WireLayout::Cigi4 {
            reader.skip(4)?;
        }

        if reader.remaining() % CIRCLE_LEN != 0 {
            return Err(CodecError::SizeMismatch {
                packet_id: Self::KIND.wire_id(),
                declared: HEAD_LEN + reader.remaining(),
                actual: HEAD_LEN + reader.remaining() / CIRCLE_LEN * CIRCLE_LEN,
            });
        }
        let mut circles = Vec::with_capacity(reader.remaining() / CIRCLE_LEN);
        while reader.remaining() > 0 {
            circles.push(CircleGeometry {
                center_u: reader.get_f32()?,
                center_v: reader.get_f32()?,
                radius: reader.get_f32()?,
                inner_radius: reader.get_f32()?,
                start_angle: reader.get_f32()?,
                end_angle: reader.get_f32()?,
            });
        }

        Ok(Self {
            symbol_id,
            drawing_style: if bit(style, 0) {
                DrawingStyle::Fill
            } else {
                DrawingStyle::Line
            },
            stipple_pattern,
            line_width,
            stipple_length,
            stipple_factor,
            circles,
        })
    }

    fn encode(&self, writer: &mut PacketWriter<'_>, layout: WireLayout) -> Result<()> {
        writer.put_u16(self.symbol_id);
        writer.put_u8(flag(self.drawing_style == DrawingStyle::Fill, 0));
        writer.put_u8(0);
        writer.put_u16(self.stipple_pattern);
        if layout == WireLayout::Cigi4 {
            writer.put_zeros(2);
        }
        writer.put_f32(self.line_width);
        writer.put_f32(self.stipple_length);
        writer.put_f32(self.stipple_factor);
        if layout != WireLayout::Cigi4 {
            writer.put_zeros(4);
        }
        for circle in &self.circles {
            for value in [
                circle.center_u,
                circle.center_v,
                circle.radius,
                circle.inner_radius,
                circle.start_angle,
                circle.end_angle,
            ] {
                writer.put_f32(value);
            }
        }
        Ok(())
    }

    fn encoded_len(&self, _layout: WireLayout) -> usize {
        HEAD_LEN + self.circles.len() * CIRCLE_LEN
    }
}
