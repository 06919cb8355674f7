//! IG Control (Host -> IG)
//!
//! First packet of every Host message. Carries the byte-swap magic, the Host
//! frame counter and the IG mode the Host requests.

use super::{bit, bits, flag, invalid, PacketBody, PacketKind, PacketSize};
use crate::byte_order::{PacketReader, PacketWriter, BYTE_SWAP_MAGIC};
use crate::error::Result;
use crate::version::WireLayout;

/// Operating mode requested by the Host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IgMode {
    /// Reset/Standby: the IG drops its scene and waits
    #[default]
    Reset,
    Operate,
    Debug,
    OfflineMaintenance,
}

impl IgMode {
    pub fn from_bits(value: u8) -> Self {
        match value & 0b11 {
            0 => IgMode::Reset,
            1 => IgMode::Operate,
            2 => IgMode::Debug,
            _ => IgMode::OfflineMaintenance,
        }
    }

    pub fn bits(self) -> u8 {
        self as u8
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct IgControl {
    pub major_version: u8,
    pub minor_version: u8,
    pub database_number: i8,
    pub ig_mode: IgMode,
    pub timestamp_valid: bool,
    pub smoothing_enabled: bool,
    pub host_frame: u32,
    pub timestamp: u32,
    /// Last IG frame the Host received (3.3 and later)
    pub last_ig_frame: u32,
}

impl PacketBody for IgControl {
    const KIND: PacketKind = PacketKind::IgControl;

    fn wire_size(layout: WireLayout) -> Option<PacketSize> {
        Some(PacketSize::Fixed(match layout {
            WireLayout::Cigi3 => 16,
            WireLayout::Cigi3_3 | WireLayout::Cigi4 => 24,
        }))
    }

    fn decode(reader: &mut PacketReader<'_>, layout: WireLayout) -> Result<Self> {
        let major_version = reader.get_u8()?;
        let database_number = reader.get_i8()?;
        let flags = reader.get_u8()?;
        let minor_version = match layout {
            WireLayout::Cigi4 => reader.get_u8()?,
            _ => {
                reader.skip(1)?;
                bits(flags, 4, 4)
            }
        };
        let magic = reader.get_u16()?;
        if magic != BYTE_SWAP_MAGIC {
            return Err(invalid("ig_control.byte_swap_magic", magic));
        }
        if layout == WireLayout::Cigi4 {
            reader.skip(2)?;
        }
        let host_frame = reader.get_u32()?;
        let timestamp = reader.get_u32()?;
        let last_ig_frame = match layout {
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
            ig_mode: IgMode::from_bits(flags),
            timestamp_valid: bit(flags, 2),
            smoothing_enabled: bit(flags, 3),
            host_frame,
            timestamp,
            last_ig_frame,
        })
    }

    fn encode(&self, writer: &mut PacketWriter<'_>, layout: WireLayout) -> Result<()> {
        let mut flags = self.ig_mode.bits() | flag(self.timestamp_valid, 2) | flag(self.smoothing_enabled, 3);
        if layout != WireLayout::Cigi4 {
            flags |= (self.minor_version & 0x0F) << 4;
        }
        writer.put_u8(self.major_version);
        writer.put_i8(self.database_number);
        writer.put_u8(flags);
        match layout {
            WireLayout::Cigi4 => writer.put_u8(self.minor_version),
            _ => writer.put_u8(0),
        }
        writer.put_u16(BYTE_SWAP_MAGIC);
        if layout == WireLayout::Cigi4 {
            writer.put_u16(0);
        }
        writer.put_u32(self.host_frame);
        writer.put_u32(self.timestamp);
        match layout {
            WireLayout::Cigi3 => {}
            WireLayout::Cigi3_3 => {
                writer.put_u32(self.last_ig_frame);
                writer.put_zeros(4);
            }
            WireLayout::Cigi4 => writer.put_u32(self.last_ig_frame),
        }
        Ok(())
    }
}
