use super::Transport;
use crate::error::{KvError, Result};
use crate::ring::types::Address;

use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

const MAX_DATAGRAM: usize = 65536;

/// Datagram transport over a tokio `UdpSocket`.
///
/// Two background tasks own the socket I/O. One reads datagrams into an
/// unbounded channel that `receive` drains without waiting. The other awaits
/// each queued outbound datagram, so `send` never blocks and never loses a
/// message to a socket that is not yet writable. Peer addresses must parse as
/// `host:port`.
pub struct UdpTransport {
    socket: Arc<UdpSocket>,
    inbox: Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
    outbox: mpsc::UnboundedSender<(SocketAddr, Vec<u8>)>,
    receiver: JoinHandle<()>,
    sender: JoinHandle<()>,
}

impl UdpTransport {
    pub async fn bind(addr: SocketAddr) -> anyhow::Result<Arc<Self>> {
        let socket = Arc::new(UdpSocket::bind(addr).await?);
        let (tx, rx) = mpsc::unbounded_channel();
        let (outbox, outbound) = mpsc::unbounded_channel();

        let receiver = tokio::spawn(Self::receive_loop(socket.clone(), tx));
        let sender = tokio::spawn(Self::send_loop(socket.clone(), outbound));

        tracing::info!("UDP transport bound to {}", socket.local_addr()?);

        Ok(Arc::new(Self {
            socket,
            inbox: Mutex::new(rx),
            outbox,
            receiver,
            sender,
        }))
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.socket
            .local_addr()
            .map_err(|e| KvError::Transport(e.to_string()))
    }

    async fn receive_loop(socket: Arc<UdpSocket>, tx: mpsc::UnboundedSender<Vec<u8>>) {
        let mut buf = vec![0u8; MAX_DATAGRAM];

        loop {
            match socket.recv_from(&mut buf).await {
                Ok((len, src)) => {
                    tracing::trace!("Received {} bytes from {}", len, src);
                    if tx.send(buf[..len].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!("Failed to receive UDP packet: {}", e);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }

    async fn send_loop(
        socket: Arc<UdpSocket>,
        mut outbound: mpsc::UnboundedReceiver<(SocketAddr, Vec<u8>)>,
    ) {
        while let Some((target, datagram)) = outbound.recv().await {
            if let Err(e) = socket.send_to(&datagram, target).await {
                tracing::warn!("Failed to send UDP packet to {}: {}", target, e);
            }
        }
    }
}

impl Transport for UdpTransport {
    fn send(&self, _from: &Address, to: &Address, payload: String) -> Result<()> {
        let target: SocketAddr = to
            .as_str()
            .parse()
            .map_err(|_| KvError::UnknownPeer(to.clone()))?;

        self.outbox
            .send((target, payload.into_bytes()))
            .map_err(|_| KvError::Transport("UDP send loop has stopped".to_string()))
    }

    fn receive(&self, _local: &Address) -> Vec<Vec<u8>> {
        let mut inbox = self.inbox.lock();
        let mut received = Vec::new();
        while let Ok(datagram) = inbox.try_recv() {
            received.push(datagram);
        }
        received
    }
}

impl Drop for UdpTransport {
    fn drop(&mut self) {
        self.receiver.abort();
        self.sender.abort();
    }
}
