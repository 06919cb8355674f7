//! Packet routing
//!
//! [`PacketRouter`] owns one [`Signal`] per packet kind. Plugins subscribe to
//! the kinds they process; [`Incoming::dispatch`](crate::Incoming::dispatch)
//! emits every decoded packet on its kind's signal.

use crate::packets::{CigiPacket, FromPacket, PacketKind};
use ig_event_system::{ReceiverId, Signal, SlotId};

pub struct PacketRouter {
    signals: Vec<Signal<CigiPacket>>,
}

impl PacketRouter {
    pub fn new() -> Self {
        Self {
            signals: PacketKind::ALL.iter().map(|_| Signal::new()).collect(),
        }
    }

    /// Signal emitted for every decoded packet of `kind`.
    pub fn signal(&self, kind: PacketKind) -> &Signal<CigiPacket> {
        &self.signals[kind as usize]
    }

    /// Subscribes to a packet kind with the untyped packet.
    pub fn connect<F>(&self, kind: PacketKind, receiver: ReceiverId, slot: F) -> SlotId
    where
        F: Fn(&CigiPacket) + 'static,
    {
        self.signal(kind).connect(receiver, slot)
    }

    /// Subscribes to one packet type, receiving the concrete packet struct.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use cigi_protocol::{CigiPacket, EntityControl, PacketRouter};
    /// use ig_event_system::ReceiverId;
    ///
    /// let router = PacketRouter::new();
    /// router.on(ReceiverId::new(), |packet: &EntityControl| {
    ///     println!("entity {} updated", packet.entity_id);
    /// });
    /// router.route(&CigiPacket::EntityControl(EntityControl::default()));
    /// ```
    pub fn on<T, F>(&self, receiver: ReceiverId, handler: F) -> SlotId
    where
        T: FromPacket + 'static,
        F: Fn(&T) + 'static,
    {
        self.connect(T::KIND, receiver, move |packet| {
            if let Some(inner) = T::from_packet(packet) {
                handler(inner);
            }
        })
    }

    /// Drops every subscription `receiver` made, on all kinds.
    pub fn disconnect_receiver(&self, receiver: ReceiverId) -> usize {
        self.signals
            .iter()
            .map(|signal| signal.disconnect_receiver(receiver))
            .sum()
    }

    pub fn has_subscribers(&self, kind: PacketKind) -> bool {
        !self.signal(kind).is_empty()
    }

    pub fn route(&self, packet: &CigiPacket) {
        self.signal(packet.kind()).emit(packet);
    }
}

impl Default for PacketRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packets::{EntityControl, ViewControl};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn routes_by_kind() {
        let router = PacketRouter::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let receiver = ReceiverId::new();

        let sink = seen.clone();
        router.on(receiver, move |packet: &EntityControl| sink.borrow_mut().push(packet.entity_id));

        router.route(&CigiPacket::EntityControl(EntityControl {
            entity_id: 9,
            ..Default::default()
        }));
        router.route(&CigiPacket::ViewControl(ViewControl::default()));

        assert_eq!(*seen.borrow(), vec![9]);
        assert!(router.has_subscribers(PacketKind::EntityControl));
        assert!(!router.has_subscribers(PacketKind::ViewControl));
        assert_eq!(router.disconnect_receiver(receiver), 1);
        assert!(!router.has_subscribers(PacketKind::EntityControl));
    }
}
