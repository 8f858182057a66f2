//! Correlation registry for in-flight requests
//!
//! Maps the serial number of every outstanding request to the one-shot
//! channel its sender is waiting on. The receive loop delivers responses
//! through [`CorrelationRegistry::deliver`]; the waiter removes its own entry
//! when it is dropped, so the registry only ever holds in-flight requests.

use crate::error::PortalError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use portal_proto::Message;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time;
use tracing::debug;

/// Attempts at drawing an unused serial number before giving up
const MAX_SERIAL_ATTEMPTS: usize = 64;

struct PendingEntry {
    /// Distinguishes registrations that reuse a serial number
    token: u64,
    sender: oneshot::Sender<Message>,
}

/// Registry of in-flight requests keyed by serial number
pub struct CorrelationRegistry {
    pending: Arc<DashMap<u16, PendingEntry>>,
    next_token: AtomicU64,
    rng: Mutex<StdRng>,
}

impl CorrelationRegistry {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Registry drawing serial numbers from a caller-seeded generator
    pub fn with_rng(rng: StdRng) -> Self {
        CorrelationRegistry {
            pending: Arc::new(DashMap::new()),
            next_token: AtomicU64::new(0),
            rng: Mutex::new(rng),
        }
    }

    /// Register a waiter for `serial_id`
    ///
    /// Fails with [`PortalError::SerialInUse`] if a request with the same
    /// serial number is already in flight.
    pub fn register(&self, serial_id: u16) -> Result<PendingResponse, PortalError> {
        match self.pending.entry(serial_id) {
            Entry::Occupied(_) => Err(PortalError::SerialInUse(serial_id)),
            Entry::Vacant(slot) => {
                let (sender, receiver) = oneshot::channel();
                let token = self.next_token.fetch_add(1, Ordering::Relaxed);
                slot.insert(PendingEntry { token, sender });

                Ok(PendingResponse {
                    serial_id,
                    token,
                    receiver,
                    pending: Arc::clone(&self.pending),
                })
            }
        }
    }

    /// Register a waiter under a fresh random serial number
    ///
    /// Serial numbers already in flight are skipped and redrawn.
    pub fn reserve(&self) -> Result<PendingResponse, PortalError> {
        for _ in 0..MAX_SERIAL_ATTEMPTS {
            let serial_id = self.next_serial();
            match self.register(serial_id) {
                Ok(pending) => return Ok(pending),
                Err(PortalError::SerialInUse(_)) => {
                    debug!(serial_id = serial_id, "Serial number in flight, drawing again");
                }
                Err(e) => return Err(e),
            }
        }
        Err(PortalError::SerialExhausted(MAX_SERIAL_ATTEMPTS))
    }

    fn next_serial(&self) -> u16 {
        self.rng
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .random()
    }

    /// Hand `message` to the waiter registered under its serial number
    ///
    /// Returns the message back when nobody is waiting for it.
    pub fn deliver(&self, message: Message) -> Option<Message> {
        let serial_id = message.serial_id();
        match self.pending.remove(&serial_id) {
            Some((_, entry)) => {
                if entry.sender.send(message).is_err() {
                    debug!(serial_id = serial_id, "Response arrived after its waiter gave up");
                }
                None
            }
            None => Some(message),
        }
    }

    pub fn contains(&self, serial_id: u16) -> bool {
        self.pending.contains_key(&serial_id)
    }

    /// Number of requests in flight
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for CorrelationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A registered waiter for one response
///
/// Dropping it removes the registry entry, unless the serial number has
/// since been delivered and registered again by another request.
pub struct PendingResponse {
    serial_id: u16,
    token: u64,
    receiver: oneshot::Receiver<Message>,
    pending: Arc<DashMap<u16, PendingEntry>>,
}

impl PendingResponse {
    pub fn serial_id(&self) -> u16 {
        self.serial_id
    }

    /// Wait for the response until `timeout` elapses
    pub async fn wait(mut self, timeout: Duration) -> Result<Message, PortalError> {
        match time::timeout(timeout, &mut self.receiver).await {
            Ok(Ok(message)) => Ok(message),
            Ok(Err(_)) => Err(PortalError::ChannelClosed(self.serial_id)),
            Err(_) => Err(PortalError::Timeout {
                serial_id: self.serial_id,
                after: timeout,
            }),
        }
    }
}

impl Drop for PendingResponse {
    fn drop(&mut self) {
        let token = self.token;
        self.pending
            .remove_if(&self.serial_id, |_, entry| entry.token == token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_proto::{MessageType, ProtocolVersion};
    use std::net::Ipv4Addr;

    fn response(serial_id: u16) -> Message {
        Message::new(
            ProtocolVersion::V1,
            MessageType::AckChallenge,
            serial_id,
            1,
            Ipv4Addr::new(10, 0, 0, 1),
        )
    }

    #[tokio::test]
    async fn test_register_and_deliver() {
        let registry = CorrelationRegistry::new();
        let pending = registry.register(42).unwrap();
        assert!(registry.contains(42));

        assert!(registry.deliver(response(42)).is_none());
        assert!(!registry.contains(42));

        let message = pending.wait(Duration::from_secs(1)).await.unwrap();
        assert_eq!(message.serial_id(), 42);
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let registry = CorrelationRegistry::new();
        let _pending = registry.register(7).unwrap();

        assert!(matches!(
            registry.register(7),
            Err(PortalError::SerialInUse(7))
        ));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_unclaimed_message_returned() {
        let registry = CorrelationRegistry::new();
        let _pending = registry.register(1).unwrap();

        let returned = registry.deliver(response(2)).unwrap();
        assert_eq!(returned.serial_id(), 2);
        assert!(registry.contains(1));
    }

    #[tokio::test]
    async fn test_timeout_removes_entry() {
        let registry = CorrelationRegistry::new();
        let pending = registry.register(9).unwrap();

        let result = pending.wait(Duration::from_millis(20)).await;
        assert!(matches!(
            result,
            Err(PortalError::Timeout { serial_id: 9, .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_drop_keeps_newer_registration() {
        let registry = CorrelationRegistry::new();
        let first = registry.register(5).unwrap();

        // Delivered, then the serial is reused before the first waiter is dropped
        assert!(registry.deliver(response(5)).is_none());
        let _second = registry.register(5).unwrap();

        drop(first);
        assert!(registry.contains(5));
    }

    #[test]
    fn test_reserve_skips_in_flight_serials() {
        let registry = CorrelationRegistry::with_rng(StdRng::seed_from_u64(1));
        let mut held = Vec::new();
        for _ in 0..1000 {
            held.push(registry.reserve().unwrap());
        }

        let mut serials: Vec<u16> = held.iter().map(PendingResponse::serial_id).collect();
        serials.sort_unstable();
        serials.dedup();
        assert_eq!(serials.len(), 1000);
        assert_eq!(registry.len(), 1000);

        drop(held);
        assert!(registry.is_empty());
    }
}
