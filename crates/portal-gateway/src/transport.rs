use crate::error::PortalError;
use crate::registry::{CorrelationRegistry, PendingResponse};
use async_trait::async_trait;
use portal_proto::{Message, MessageError, Version};
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

/// Receiver for NAS-initiated messages that answer no outstanding request
#[async_trait]
pub trait UnsolicitedHandler: Send + Sync {
    /// `source` is the address the datagram came from, normally the NAS
    async fn handle(&self, message: Message, source: IpAddr);
}

type FallbackSlot = Arc<RwLock<Option<Arc<dyn UnsolicitedHandler>>>>;

/// UDP transport for the portal protocol
///
/// Owns the single socket used for both directions. [`PortalTransport::run`]
/// reads datagrams and routes each one, in its own task, either to the
/// request waiting on its serial number or to the registered fallback.
pub struct PortalTransport {
    socket: Arc<UdpSocket>,
    codec: Arc<dyn Version>,
    registry: Arc<CorrelationRegistry>,
    fallback: FallbackSlot,
    timeout: Duration,
}

impl PortalTransport {
    /// How long a request waits for its response by default
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);
    /// Receive buffer size; larger datagrams are truncated by the socket
    pub const RECV_BUFFER_SIZE: usize = 4096;

    /// Bind the portal socket
    pub async fn bind(
        addr: SocketAddr,
        codec: Arc<dyn Version>,
        timeout: Duration,
    ) -> Result<Self, PortalError> {
        let socket = UdpSocket::bind(addr).await?;
        info!(
            bind_addr = %addr,
            version = %codec.protocol(),
            "Portal transport listening"
        );

        Ok(PortalTransport {
            socket: Arc::new(socket),
            codec,
            registry: Arc::new(CorrelationRegistry::new()),
            fallback: Arc::new(RwLock::new(None)),
            timeout,
        })
    }

    /// Get the local address the socket is bound to
    ///
    /// This is useful for testing when binding to port 0 (OS-assigned port)
    pub fn local_addr(&self) -> Result<SocketAddr, PortalError> {
        self.socket.local_addr().map_err(PortalError::from)
    }

    pub fn codec(&self) -> &dyn Version {
        self.codec.as_ref()
    }

    pub fn registry(&self) -> &CorrelationRegistry {
        &self.registry
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Install the handler for unsolicited messages, replacing any previous one
    pub fn register_fallback(&self, handler: Arc<dyn UnsolicitedHandler>) {
        *self
            .fallback
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(handler);
    }

    /// Remove the fallback handler; unsolicited messages are dropped afterwards
    pub fn deregister_fallback(&self) -> Option<Arc<dyn UnsolicitedHandler>> {
        self.fallback
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }

    /// Receive loop
    ///
    /// Only returns if reading from the socket fails.
    pub async fn run(&self) -> Result<(), PortalError> {
        let mut buf = vec![0u8; Self::RECV_BUFFER_SIZE];

        loop {
            let (len, addr) = self.socket.recv_from(&mut buf).await?;
            let data = buf[..len].to_vec();

            let codec = Arc::clone(&self.codec);
            let registry = Arc::clone(&self.registry);
            let fallback = Arc::clone(&self.fallback);

            tokio::spawn(async move {
                Self::dispatch(data, addr, codec, registry, fallback).await;
            });
        }
    }

    /// Decode one datagram and route it
    ///
    /// Only response types are offered to the registry; everything else, and
    /// any response no request is waiting for, goes to the fallback.
    async fn dispatch(
        data: Vec<u8>,
        addr: SocketAddr,
        codec: Arc<dyn Version>,
        registry: Arc<CorrelationRegistry>,
        fallback: FallbackSlot,
    ) {
        let message = match codec.decode(&data) {
            Ok(message) => message,
            Err(e) => {
                warn!(
                    source = %addr,
                    len = data.len(),
                    error = %e,
                    "Dropped malformed portal message"
                );
                return;
            }
        };

        let message = if codec.is_response(&message) {
            match registry.deliver(message) {
                None => return,
                Some(message) => message,
            }
        } else {
            message
        };

        debug!(
            source = %addr,
            message_type = ?message.message_type(),
            serial_id = message.serial_id(),
            "Received unsolicited portal message"
        );

        let handler = fallback
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match handler {
            Some(handler) => handler.handle(message, addr.ip()).await,
            None => warn!(
                source = %addr,
                message_type = ?message.message_type(),
                "No fallback handler registered, dropping message"
            ),
        }
    }

    /// Write `message` to `dest` without waiting for an answer
    pub async fn send_async(&self, message: &Message, dest: SocketAddr) -> Result<(), PortalError> {
        let bytes = message.encode();
        self.socket.send_to(&bytes, dest).await?;

        debug!(
            dest = %dest,
            message_type = ?message.message_type(),
            serial_id = message.serial_id(),
            req_id = message.req_id(),
            "Portal message sent"
        );
        Ok(())
    }

    /// Send `message` and wait for the response carrying its serial number
    ///
    /// The response is validated against the request with `secret`.
    pub async fn send_and_await(
        &self,
        message: Message,
        dest: SocketAddr,
        secret: &str,
    ) -> Result<Message, PortalError> {
        let pending = self.registry.register(message.serial_id())?;
        self.exchange(message, pending, dest, secret).await
    }

    /// Build a request under a freshly reserved serial number, send it and
    /// wait for its validated response
    pub async fn request<F>(
        &self,
        dest: SocketAddr,
        secret: &str,
        build: F,
    ) -> Result<Message, PortalError>
    where
        F: FnOnce(u16) -> Result<Message, MessageError>,
    {
        let pending = self.registry.reserve()?;
        let message = build(pending.serial_id())?;
        self.exchange(message, pending, dest, secret).await
    }

    async fn exchange(
        &self,
        message: Message,
        pending: PendingResponse,
        dest: SocketAddr,
        secret: &str,
    ) -> Result<Message, PortalError> {
        self.send_async(&message, dest).await?;

        let response = pending.wait(self.timeout).await?;
        response.check_for(&message, secret)?;
        Ok(response)
    }
}
