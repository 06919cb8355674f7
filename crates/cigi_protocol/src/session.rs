//! CIGI session
//!
//! A [`Session`] fixes one protocol version for its whole life and binds the
//! matching packet table to one [`Incoming`] and one [`Outgoing`] buffer.

use crate::byte_order::{host_byte_order, ByteOrder};
use crate::error::Result;
use crate::incoming::Incoming;
use crate::outgoing::Outgoing;
use crate::packets::PacketKind;
use crate::registry::PacketRegistry;
use crate::version::CigiVersion;
use std::sync::Arc;
use tracing::info;

/// Which end of the link this session serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// Receives IG Control messages, sends Start Of Frame messages
    ImageGenerator,
    /// Receives Start Of Frame messages, sends IG Control messages
    Host,
}

impl SessionRole {
    /// Packet every received message has to start with.
    pub fn incoming_first_packet(self) -> PacketKind {
        match self {
            SessionRole::ImageGenerator => PacketKind::IgControl,
            SessionRole::Host => PacketKind::StartOfFrame,
        }
    }

    /// Packet every sent message has to start with.
    pub fn outgoing_first_packet(self) -> PacketKind {
        match self {
            SessionRole::ImageGenerator => PacketKind::StartOfFrame,
            SessionRole::Host => PacketKind::IgControl,
        }
    }
}

pub struct Session {
    role: SessionRole,
    registry: Arc<PacketRegistry>,
    incoming: Incoming,
    outgoing: Outgoing,
}

impl Session {
    /// Opens a session that sends in the host's byte order.
    ///
    /// # Returns
    ///
    /// `CodecError::UnsupportedVersion` when no packet table exists for
    /// `version`; no session is created in that case.
    pub fn new(role: SessionRole, version: CigiVersion) -> Result<Self> {
        Self::with_byte_order(role, version, host_byte_order())
    }

    pub fn with_byte_order(role: SessionRole, version: CigiVersion, order: ByteOrder) -> Result<Self> {
        let registry = Arc::new(PacketRegistry::for_version(version)?);
        Ok(Self::with_registry(role, registry, order))
    }

    /// Opens a session over a prepared packet table.
    pub fn with_registry(role: SessionRole, registry: Arc<PacketRegistry>, order: ByteOrder) -> Self {
        info!(
            "🔌 CIGI {} session opened as {:?} ({} packet types, {:?} endian output)",
            registry.version(),
            role,
            registry.len(),
            order
        );
        Self {
            role,
            incoming: Incoming::new(registry.clone(), role.incoming_first_packet()),
            outgoing: Outgoing::new(registry.clone(), order),
            registry,
        }
    }

    pub fn role(&self) -> SessionRole {
        self.role
    }

    pub fn version(&self) -> CigiVersion {
        self.registry.version()
    }

    pub fn registry(&self) -> &PacketRegistry {
        &self.registry
    }

    pub fn incoming(&self) -> &Incoming {
        &self.incoming
    }

    pub fn outgoing(&self) -> &Outgoing {
        &self.outgoing
    }

    pub fn outgoing_mut(&mut self) -> &mut Outgoing {
        &mut self.outgoing
    }
}
