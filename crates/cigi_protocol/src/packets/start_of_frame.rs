//! Start Of Frame (IG -> Host)
//!
//! First packet of every IG message, sent once per IG frame.

use super::{bit, bits, flag, invalid, IgMode, PacketBody, PacketKind, PacketSize};
use crate::byte_order::{PacketReader, PacketWriter, BYTE_SWAP_MAGIC};
use crate::error::Result;
use crate::version::WireLayout;

/// Earth reference model the IG uses for geodetic positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EarthModel {
    #[default]
    Wgs84,
    HostDefined,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct StartOfFrame {
    pub major_version: u8,
    pub minor_version: u8,
    pub database_number: i8,
    pub ig_status: u8,
    pub ig_mode: IgMode,
    pub timestamp_valid: bool,
    pub earth_model: EarthModel,
    pub ig_frame: u32,
    pub timestamp: u32,
    /// Last Host frame the IG received (3.3 and later)
    pub last_host_frame: u32,
}

impl PacketBody for StartOfFrame {
    const KIND: PacketKind = PacketKind::StartOfFrame;

    fn wire_size(layout: WireLayout) -> Option<PacketSize> {
        Some(PacketSize::Fixed(match layout {
            WireLayout::Cigi3 => 16,
            WireLayout::Cigi3_3 | WireLayout::Cigi4 => 24,
        }))
    }

    fn decode(reader: &mut PacketReader<'_>, layout: WireLayout) -> Result<Self> {
        let major_version = reader.get_u8()?;
        let database_number = reader.get_i8()?;
        let ig_status = reader.get_u8()?;
        let flags = reader.get_u8()?;
        let magic = reader.get_u16()?;
        if magic != BYTE_SWAP_MAGIC {
            return Err(invalid("start_of_frame.byte_swap_magic", magic));
        }
        let minor_version = match layout {
            WireLayout::Cigi4 => {
                let minor = reader.get_u8()?;
                reader.skip(1)?;
                minor
            }
            _ => bits(flags, 4, 4),
        };
        let ig_frame = reader.get_u32()?;
        let timestamp = reader.get_u32()?;
        let last_host_frame = match layout {
            WireLayout::Cigi3 => 0,
            WireLayout::Cigi3_3 => {
                let frame = reader.get_u32()?;
                reader.skip(4)?;
                frame
            }
            WireLayout::Cigi4 => reader.get_u32()?,
        };

        Ok(Self {
            major_version,
            minor_version,
            database_number,
            ig_status,
            ig_mode: IgMode::from_bits(flags),
            timestamp_valid: bit(flags, 2),
            earth_model: if bit(flags, 3) {
                EarthModel::HostDefined
            } else {
                EarthModel::Wgs84
            },
            ig_frame,
            timestamp,
            last_host_frame,
        })
    }

    fn encode(&self, writer: &mut PacketWriter<'_>, layout: WireLayout) -> Result<()> {
        let mut flags = self.ig_mode.bits()
            | flag(self.timestamp_valid, 2)
            | flag(self.earth_model == EarthModel::HostDefined, 3);
        if layout != WireLayout::Cigi4 {
            flags |= (self.minor_version & 0x0F) << 4;
        }
        writer.put_u8(self.major_version);
        writer.put_i8(self.database_number);
        writer.put_u8(self.ig_status);
        writer.put_u8(flags);
        writer.put_u16(BYTE_SWAP_MAGIC);
        if layout == WireLayout::Cigi4 {
            writer.put_u8(self.minor_version);
            writer.put_u8(0);
        }
        writer.put_u32(self.ig_frame);
        writer.put_u32(self.timestamp);
        match layout {
            WireLayout::Cigi3 => {}
            WireLayout::Cigi3_3 => {
                writer.put_u32(self.last_host_frame);
                writer.put_zeros(4);
            }
            WireLayout::Cigi4 => writer.put_u32(self.last_host_frame),
        }
        Ok(())
    }
}
