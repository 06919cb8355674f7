//! Entity Control (Host -> IG)
//!
//! Creates, moves, attaches and removes entities. Top-level entities are
//! positioned geodetically (latitude, longitude, altitude); attached entities
//! use the same three fields as x/y/z offsets from their parent.

use super::{bit, bits, flag, invalid, PacketBody, PacketKind, PacketSize};
use crate::byte_order::{PacketReader, PacketWriter};
use crate::error::Result;
use crate::version::WireLayout;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntityStateField {
    #[default]
    Inactive,
    Active,
    Destroyed,
}

impl EntityStateField {
    fn from_bits(value: u8) -> Result<Self> {
        match value {
            0 => Ok(EntityStateField::Inactive),
            1 => Ok(EntityStateField::Active),
            2 => Ok(EntityStateField::Destroyed),
            other => Err(invalid("entity_control.entity_state", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationDirection {
    #[default]
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimationStateField {
    #[default]
    Stop,
    Pause,
    Play,
    Continue,
}

impl AnimationStateField {
    fn from_bits(value: u8) -> Self {
        match value & 0b11 {
            0 => AnimationStateField::Stop,
            1 => AnimationStateField::Pause,
            2 => AnimationStateField::Play,
            _ => AnimationStateField::Continue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EntityControl {
    pub entity_id: u16,
    pub entity_state: EntityStateField,
    pub attached: bool,
    pub collision_detection: bool,
    pub inherit_alpha: bool,
    /// 0 none, 1 non-conformal, 2 conformal
    pub ground_clamp: u8,
    pub animation_direction: AnimationDirection,
    pub animation_loop: bool,
    pub animation_state: AnimationStateField,
    /// Extrapolation/interpolation (3.3 and later)
    pub smoothing_enabled: bool,
    pub alpha: u8,
    pub entity_type: u16,
    pub parent_id: u16,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub lat_or_x: f64,
    pub lon_or_y: f64,
    pub alt_or_z: f64,
}

impl PacketBody for EntityControl {
    const KIND: PacketKind = PacketKind::EntityControl;

    fn wire_size(layout: WireLayout) -> Option<PacketSize> {
        Some(PacketSize::Fixed(match layout {
            WireLayout::Cigi3 | WireLayout::Cigi3_3 => 48,
            WireLayout::Cigi4 => 56,
        }))
    }

    fn decode(reader: &mut PacketReader<'_>, layout: WireLayout) -> Result<Self> {
        let entity_id = reader.get_u16()?;
        let state_flags = reader.get_u8()?;
        let animation_flags = reader.get_u8()?;
        let alpha = reader.get_u8()?;
        reader.skip(1)?;
        let entity_type = reader.get_u16()?;
        let parent_id = reader.get_u16()?;
        if layout == WireLayout::Cigi4 {
            reader.skip(2)?;
        }
        let roll = reader.get_f32()?;
        let pitch = reader.get_f32()?;
        let yaw = reader.get_f32()?;
        if layout == WireLayout::Cigi4 {
            reader.skip(4)?;
        }

        Ok(Self {
            entity_id,
            entity_state: EntityStateField::from_bits(bits(state_flags, 0, 2))?,
            attached: bit(state_flags, 2),
            collision_detection: bit(state_flags, 3),
            inherit_alpha: bit(state_flags, 4),
            ground_clamp: bits(state_flags, 5, 2),
            animation_direction: if bit(animation_flags, 0) {
                AnimationDirection::Backward
            } else {
                AnimationDirection::Forward
            },
            animation_loop: bit(animation_flags, 1),
            animation_state: AnimationStateField::from_bits(bits(animation_flags, 2, 2)),
            smoothing_enabled: layout != WireLayout::Cigi3 && bit(animation_flags, 4),
            alpha,
            entity_type,
            parent_id,
            roll,
            pitch,
            yaw,
            lat_or_x: reader.get_f64()?,
            lon_or_y: reader.get_f64()?,
            alt_or_z: reader.get_f64()?,
        })
    }

    fn encode(&self, writer: &mut PacketWriter<'_>, layout: WireLayout) -> Result<()> {
        if self.ground_clamp > 2 {
            return Err(invalid("entity_control.ground_clamp", self.ground_clamp));
        }
        let state_flags = self.entity_state as u8
            | flag(self.attached, 2)
            | flag(self.collision_detection, 3)
            | flag(self.inherit_alpha, 4)
            | (self.ground_clamp << 5);
        let mut animation_flags = flag(self.animation_direction == AnimationDirection::Backward, 0)
            | flag(self.animation_loop, 1)
            | ((self.animation_state as u8) << 2);
        if layout != WireLayout::Cigi3 {
            animation_flags |= flag(self.smoothing_enabled, 4);
        }

        writer.put_u16(self.entity_id);
        writer.put_u8(state_flags);
        writer.put_u8(animation_flags);
        writer.put_u8(self.alpha);
        writer.put_u8(0);
        writer.put_u16(self.entity_type);
        writer.put_u16(self.parent_id);
        if layout == WireLayout::Cigi4 {
            writer.put_zeros(2);
        }
        writer.put_f32(self.roll);
        writer.put_f32(self.pitch);
        writer.put_f32(self.yaw);
        if layout == WireLayout::Cigi4 {
            writer.put_zeros(4);
        }
        writer.put_f64(self.lat_or_x);
        writer.put_f64(self.lon_or_y);
        writer.put_f64(self.alt_or_z);
        Ok(())
    }
}
