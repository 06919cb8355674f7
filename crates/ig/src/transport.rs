//! UDP link to the Host.
//!
//! A tokio task receives datagrams and hands them to the frame thread
//! through an unbounded channel; the frame thread drains the channel
//! without blocking at the start of every frame. Sends go straight to the
//! socket.

use bytes::Bytes;
use ig_plugins::HostTransport;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Largest datagram a Host can send.
const MAX_DATAGRAM: usize = 65_536;

pub struct UdpHostTransport {
    socket: Arc<UdpSocket>,
    inbound: mpsc::UnboundedReceiver<(Bytes, SocketAddr)>,
    host: Option<SocketAddr>,
    peer: Option<SocketAddr>,
    receive_task: JoinHandle<()>,
}

impl UdpHostTransport {
    /// Binds `bind` and starts receiving.
    ///
    /// # Arguments
    ///
    /// * `bind` - Local address Host messages arrive on
    /// * `host` - Fixed reply address; `None` replies to the latest sender
    pub async fn bind(bind: SocketAddr, host: Option<SocketAddr>) -> io::Result<Self> {
        let socket = Arc::new(UdpSocket::bind(bind).await?);
        let (sender, inbound) = mpsc::unbounded_channel();
        let receive_task = tokio::spawn(receive_loop(socket.clone(), sender));
        debug!("UDP host link bound to {}", socket.local_addr()?);
        Ok(Self {
            socket,
            inbound,
            host,
            peer: None,
            receive_task,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Where the next message will be sent, if anywhere.
    pub fn destination(&self) -> Option<SocketAddr> {
        self.host.or(self.peer)
    }
}

async fn receive_loop(socket: Arc<UdpSocket>, sender: mpsc::UnboundedSender<(Bytes, SocketAddr)>) {
    let mut buf = vec![0u8; MAX_DATAGRAM];
    loop {
        match socket.recv_from(&mut buf).await {
            Ok((len, from)) => {
                trace!("Received {} bytes from {}", len, from);
                if sender.send((Bytes::copy_from_slice(&buf[..len]), from)).is_err() {
                    break;
                }
            }
            // Reported on some platforms after a send to a closed port.
            Err(e) => warn!("⚠️ UDP receive failed: {}", e),
        }
    }
}

impl HostTransport for UdpHostTransport {
    fn receive(&mut self) -> Option<Bytes> {
        let (message, from) = self.inbound.try_recv().ok()?;
        if self.peer != Some(from) {
            debug!("Host messages now arrive from {}", from);
            self.peer = Some(from);
        }
        Some(message)
    }

    fn send(&mut self, message: Bytes) -> io::Result<()> {
        let Some(destination) = self.destination() else {
            trace!("No Host address known yet; dropping {} bytes", message.len());
            return Ok(());
        };
        self.socket.try_send_to(&message, destination).map(|_| ())
    }
}

impl Drop for UdpHostTransport {
    fn drop(&mut self) {
        self.receive_task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    async fn next_message(transport: &mut UdpHostTransport) -> Bytes {
        for _ in 0..100 {
            if let Some(message) = transport.receive() {
                return message;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no datagram arrived");
    }

    #[tokio::test]
    async fn replies_go_to_the_latest_sender() {
        let mut transport = UdpHostTransport::bind("127.0.0.1:0".parse().unwrap(), None)
            .await
            .unwrap();
        assert!(transport.receive().is_none());
        assert!(transport.send(Bytes::from_static(b"lost")).is_ok());

        let host = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        host.send_to(b"frame", transport.local_addr().unwrap())
            .await
            .unwrap();
        assert_eq!(next_message(&mut transport).await, Bytes::from_static(b"frame"));
        assert_eq!(transport.destination(), Some(host.local_addr().unwrap()));

        transport.send(Bytes::from_static(b"start")).unwrap();
        let mut buf = [0u8; 16];
        let (len, _) = tokio::time::timeout(Duration::from_secs(1), host.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(&buf[..len], b"start");
    }

    #[tokio::test]
    async fn fixed_host_address_wins() {
        let host = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let other = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut transport =
            UdpHostTransport::bind("127.0.0.1:0".parse().unwrap(), Some(host.local_addr().unwrap()))
                .await
                .unwrap();

        other
            .send_to(b"hello", transport.local_addr().unwrap())
            .await
            .unwrap();
        next_message(&mut transport).await;
        assert_eq!(transport.destination(), Some(host.local_addr().unwrap()));
    }
}
