//! # Host Link
//!
//! Connects the frame loop to the Host through a [`HostTransport`].
//!
//! ## Per-frame Sequence
//!
//! 1. Send a Start Of Frame message carrying the IG frame number, the last
//!    Host frame received and the IG mode
//! 2. Drain every message the transport received since the previous frame
//!    and dispatch its packets through the shared [`PacketRouter`]
//! 3. Apply the IG mode the Host asked for in its latest IG Control
//!
//! Managers subscribe to the router during `Initialize`, so all scene
//! changes happen synchronously inside step 2. A message that cannot be
//! parsed is dropped as a whole and counted as rejected.

use bytes::Bytes;
use cigi_protocol::{
    ByteOrder, CigiPacket, CigiVersion, IgControl, IgMode, PacketRouter, Session, SessionRole,
    StartOfFrame,
};
use ig_event_system::ReceiverId;
use plugin_system::{Plugin, PluginError, PluginState, Result, StateContext};
use serde::Serialize;
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, info, trace, warn};

use crate::keys;

/// Message exchange with the Host.
///
/// Implementations must not block: `receive` returns `None` when nothing is
/// waiting.
pub trait HostTransport {
    /// Next complete message from the Host, if one arrived.
    fn receive(&mut self) -> Option<Bytes>;

    /// Sends one complete message to the Host.
    fn send(&mut self, message: Bytes) -> std::io::Result<()>;
}

/// Link state shared with other plugins.
#[derive(Debug)]
pub struct LinkStatus {
    ig_frame: Cell<u32>,
    last_host_frame: Cell<u32>,
    database: Cell<i8>,
    ig_mode: Cell<IgMode>,
    requested_mode: Cell<Option<IgMode>>,
    messages_received: Cell<u64>,
    messages_rejected: Cell<u64>,
}

/// Serializable copy of a [`LinkStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkSnapshot {
    pub ig_frame: u32,
    pub last_host_frame: u32,
    pub database: i8,
    pub ig_mode: &'static str,
    pub messages_received: u64,
    pub messages_rejected: u64,
}

impl LinkStatus {
    fn new() -> Self {
        Self {
            ig_frame: Cell::new(0),
            last_host_frame: Cell::new(0),
            database: Cell::new(0),
            ig_mode: Cell::new(IgMode::Operate),
            requested_mode: Cell::new(None),
            messages_received: Cell::new(0),
            messages_rejected: Cell::new(0),
        }
    }

    pub fn ig_frame(&self) -> u32 {
        self.ig_frame.get()
    }

    /// Host frame number of the latest IG Control.
    pub fn last_host_frame(&self) -> u32 {
        self.last_host_frame.get()
    }

    /// Mode reported to the Host.
    pub fn ig_mode(&self) -> IgMode {
        self.ig_mode.get()
    }

    pub fn messages_received(&self) -> u64 {
        self.messages_received.get()
    }

    pub fn messages_rejected(&self) -> u64 {
        self.messages_rejected.get()
    }

    pub fn snapshot(&self) -> LinkSnapshot {
        LinkSnapshot {
            ig_frame: self.ig_frame.get(),
            last_host_frame: self.last_host_frame.get(),
            database: self.database.get(),
            ig_mode: match self.ig_mode.get() {
                IgMode::Reset => "reset",
                IgMode::Operate => "operate",
                IgMode::Debug => "debug",
                IgMode::OfflineMaintenance => "offline_maintenance",
            },
            messages_received: self.messages_received.get(),
            messages_rejected: self.messages_rejected.get(),
        }
    }

    fn record_ig_control(&self, control: &IgControl) {
        self.last_host_frame.set(control.host_frame);
        self.database.set(control.database_number);
        self.requested_mode.set(Some(control.ig_mode));
    }
}

pub struct HostLinkPlugin {
    session: Session,
    transport: Box<dyn HostTransport>,
    router: Rc<PacketRouter>,
    status: Rc<LinkStatus>,
    receiver: ReceiverId,
}

impl HostLinkPlugin {
    /// Opens an image generator session for `version`.
    ///
    /// # Arguments
    ///
    /// * `version` - CIGI version negotiated with the Host
    /// * `byte_order` - Byte order of outgoing messages
    /// * `transport` - Message exchange with the Host
    ///
    /// # Returns
    ///
    /// `CodecError::UnsupportedVersion` when the version has no packet table.
    pub fn new(
        version: CigiVersion,
        byte_order: ByteOrder,
        transport: Box<dyn HostTransport>,
    ) -> cigi_protocol::Result<Self> {
        let session = Session::with_byte_order(SessionRole::ImageGenerator, version, byte_order)?;
        Ok(Self {
            session,
            transport,
            router: Rc::new(PacketRouter::new()),
            status: Rc::new(LinkStatus::new()),
            receiver: ReceiverId::new(),
        })
    }

    pub fn router(&self) -> Rc<PacketRouter> {
        self.router.clone()
    }

    pub fn status(&self) -> Rc<LinkStatus> {
        self.status.clone()
    }

    fn send_start_of_frame(&mut self) -> Result<()> {
        let version = self.session.version();
        let start_of_frame = StartOfFrame {
            major_version: version.major,
            minor_version: version.minor,
            database_number: self.status.database.get(),
            ig_mode: self.status.ig_mode.get(),
            ig_frame: self.status.ig_frame.get(),
            last_host_frame: self.status.last_host_frame.get(),
            ..Default::default()
        };

        let outgoing = self.session.outgoing_mut();
        outgoing
            .append(&CigiPacket::from(start_of_frame))
            .map_err(|e| PluginError::Transport(e.to_string()))?;
        let message = outgoing.take_buffer();
        trace!("Sending {} byte start of frame", message.len());
        self.transport
            .send(message)
            .map_err(|e| PluginError::Transport(e.to_string()))
    }

    fn receive_all(&mut self) {
        while let Some(message) = self.transport.receive() {
            self.status
                .messages_received
                .set(self.status.messages_received.get() + 1);
            match self.session.incoming().dispatch(&message, &self.router) {
                Ok(count) => trace!("Dispatched {} packets", count),
                Err(e) => {
                    self.status
                        .messages_rejected
                        .set(self.status.messages_rejected.get() + 1);
                    warn!("⚠️ Dropped Host message of {} bytes: {}", message.len(), e);
                }
            }
        }
    }

    fn apply_requested_mode(&self, state: PluginState, context: &mut StateContext) {
        let Some(requested) = self.status.requested_mode.take() else {
            return;
        };
        if requested != self.status.ig_mode.get() {
            info!("🎛️ Host requested IG mode {:?}", requested);
        }
        match (requested, state) {
            (IgMode::Debug, PluginState::Operate) | (IgMode::Operate, PluginState::Debug) => {
                context.request_debug_toggle();
            }
            _ => {}
        }
        self.status.ig_mode.set(requested);
    }
}

impl Plugin for HostLinkPlugin {
    fn name(&self) -> &str {
        "host_link"
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn act(&mut self, state: PluginState, context: &mut StateContext) -> Result<()> {
        match state {
            PluginState::BlackboardPost => {
                let blackboard = context.blackboard_mut();
                blackboard.post(keys::PACKET_ROUTER, self.router.clone())?;
                blackboard.post(keys::LINK_STATUS, self.status.clone())?;
            }
            PluginState::Initialize => {
                let status = self.status.clone();
                self.router.on(self.receiver, move |control: &IgControl| {
                    status.record_ig_control(control);
                });
                info!(
                    "🔗 Host link ready: CIGI {} as image generator",
                    self.session.version()
                );
            }
            PluginState::Operate | PluginState::Debug => {
                let sent = self.send_start_of_frame();
                self.receive_all();
                self.apply_requested_mode(state, context);
                self.status.ig_frame.set(self.status.ig_frame.get().wrapping_add(1));
                sent?;
            }
            PluginState::Shutdown => {
                let removed = self.router.disconnect_receiver(self.receiver);
                debug!("Host link dropped {} router subscriptions", removed);
            }
            PluginState::BlackboardRetrieve | PluginState::LoadConfiguration | PluginState::Exit => {}
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cigi_protocol::EntityControl;
    use std::cell::RefCell;
    use std::collections::VecDeque;

    #[derive(Clone, Default)]
    struct MemoryTransport {
        inbound: Rc<RefCell<VecDeque<Bytes>>>,
        outbound: Rc<RefCell<Vec<Bytes>>>,
    }

    impl HostTransport for MemoryTransport {
        fn receive(&mut self) -> Option<Bytes> {
            self.inbound.borrow_mut().pop_front()
        }

        fn send(&mut self, message: Bytes) -> std::io::Result<()> {
            self.outbound.borrow_mut().push(message);
            Ok(())
        }
    }

    fn host_message(mode: IgMode, host_frame: u32) -> Bytes {
        let mut host = Session::new(SessionRole::Host, CigiVersion::V3_3).unwrap();
        let outgoing = host.outgoing_mut();
        outgoing
            .append(&CigiPacket::from(IgControl {
                major_version: 3,
                minor_version: 3,
                ig_mode: mode,
                host_frame,
                ..Default::default()
            }))
            .unwrap();
        outgoing
            .append(&CigiPacket::from(EntityControl {
                entity_id: 4,
                ..Default::default()
            }))
            .unwrap();
        outgoing.take_buffer()
    }

    fn started(transport: &MemoryTransport) -> (HostLinkPlugin, StateContext) {
        let mut plugin = HostLinkPlugin::new(
            CigiVersion::V3_3,
            ByteOrder::Big,
            Box::new(transport.clone()),
        )
        .unwrap();
        let mut context = StateContext::new();
        for state in [
            PluginState::BlackboardPost,
            PluginState::BlackboardRetrieve,
            PluginState::LoadConfiguration,
            PluginState::Initialize,
        ] {
            plugin.act(state, &mut context).unwrap();
        }
        (plugin, context)
    }

    #[test]
    fn sends_start_of_frame_and_dispatches_host_packets() {
        let transport = MemoryTransport::default();
        let (mut plugin, mut context) = started(&transport);

        let entity_packets = Rc::new(Cell::new(0));
        let sink = entity_packets.clone();
        let router = context
            .blackboard()
            .retrieve::<PacketRouter>(keys::PACKET_ROUTER)
            .unwrap();
        router.on(ReceiverId::new(), move |_: &EntityControl| sink.set(sink.get() + 1));

        transport
            .inbound
            .borrow_mut()
            .push_back(host_message(IgMode::Operate, 42));
        plugin.act(PluginState::Operate, &mut context).unwrap();

        assert_eq!(entity_packets.get(), 1);
        let status = plugin.status();
        assert_eq!(status.last_host_frame(), 42);
        assert_eq!(status.ig_frame(), 1);
        assert!(!context.debug_toggle_requested());

        let host = Session::new(SessionRole::Host, CigiVersion::V3_3).unwrap();
        let sent = transport.outbound.borrow();
        assert_eq!(sent.len(), 1);
        let packets: Vec<_> = host.incoming().packets(&sent[0]).collect();
        match packets.as_slice() {
            [Ok(CigiPacket::StartOfFrame(start))] => {
                assert_eq!(start.ig_frame, 0);
                assert_eq!(start.ig_mode, IgMode::Operate);
            }
            other => panic!("unexpected start of frame message: {other:?}"),
        }
    }

    #[test]
    fn host_mode_requests_toggle_debug() {
        let transport = MemoryTransport::default();
        let (mut plugin, mut context) = started(&transport);

        transport
            .inbound
            .borrow_mut()
            .push_back(host_message(IgMode::Debug, 1));
        plugin.act(PluginState::Operate, &mut context).unwrap();
        assert!(context.debug_toggle_requested());
        assert_eq!(plugin.status().ig_mode(), IgMode::Debug);
    }

    #[test]
    fn broken_messages_are_counted_and_dropped() {
        let transport = MemoryTransport::default();
        let (mut plugin, mut context) = started(&transport);

        let mut message = host_message(IgMode::Operate, 7).to_vec();
        message.truncate(message.len() - 4);
        transport.inbound.borrow_mut().push_back(Bytes::from(message));
        transport
            .inbound
            .borrow_mut()
            .push_back(Bytes::from_static(&[0xFF; 3]));
        plugin.act(PluginState::Operate, &mut context).unwrap();

        let status = plugin.status();
        assert_eq!(status.messages_received(), 2);
        assert_eq!(status.messages_rejected(), 2);
    }
}
