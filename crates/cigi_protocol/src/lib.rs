//! # CIGI Protocol
//!
//! Versioned codec for the Common Image Generator Interface: the binary
//! packet stream a simulation Host and an Image Generator exchange every
//! frame.
//!
//! ## Core Features
//!
//! - **Version Negotiation**: one [`Session`] per link, fixed to one of
//!   [`CigiVersion::SUPPORTED`]
//! - **Registration Table**: [`PacketRegistry`] maps wire ids to packet kinds
//!   and sizes for the negotiated version
//! - **Byte Order**: detected from the byte-swap magic of every received
//!   message; fields are swapped by width in [`PacketReader`]/[`PacketWriter`]
//! - **Forward Compatibility**: unknown packets are skipped by declared size
//! - **Dispatch**: [`PacketRouter`] emits decoded packets on per-kind signals
//!
//! ## Quick Start Example
//!
//! ```rust
//! use cigi_protocol::*;
//!
//! let mut host = Session::new(SessionRole::Host, CigiVersion::V3_3)?;
//! host.outgoing_mut().append(&IgControl { major_version: 3, minor_version: 3, ..Default::default() }.into())?;
//! host.outgoing_mut().append(&EntityControl { entity_id: 7, ..Default::default() }.into())?;
//! let message = host.outgoing_mut().take_buffer();
//!
//! let ig = Session::new(SessionRole::ImageGenerator, CigiVersion::V3_3)?;
//! let kinds: Vec<PacketKind> = ig
//!     .incoming()
//!     .packets(&message)
//!     .map(|packet| packet.map(|p| p.kind()))
//!     .collect::<std::result::Result<_, _>>()?;
//! assert_eq!(kinds, vec![PacketKind::IgControl, PacketKind::EntityControl]);
//! # Ok::<(), CodecError>(())
//! ```

pub mod byte_order;
pub mod error;
pub mod incoming;
pub mod outgoing;
pub mod packets;
pub mod registry;
pub mod router;
pub mod session;
pub mod version;


pub use byte_order::{host_byte_order, ByteOrder, PacketReader, PacketWriter, BYTE_SWAP_MAGIC};
pub use error::{CodecError, Result};
pub use incoming::{Incoming, IncomingStats, PacketIter};
pub use outgoing::Outgoing;
pub use packets::*;
pub use registry::{PacketCodec, PacketHeader, PacketRegistry};
pub use router::PacketRouter;
pub use session::{Session, SessionRole};
pub use version::{CigiVersion, WireLayout};
