//! Protocol version codecs
//!
//! A [`Version`] decodes inbound datagrams and builds signed outbound
//! messages for one protocol generation. Exactly one codec is active in a
//! running gateway, chosen from configuration at startup.

mod v1;
mod v2;

pub use v1::V1;
pub use v2::V2;

use crate::attributes::{Attribute, AttributeType};
use crate::chap::{chap_ident, compute_chap_response};
use crate::message::{AuthMethod, Message, MessageError, MessageType};
use std::fmt;
use std::net::Ipv4Addr;
use std::sync::Arc;

/// Protocol generation, carried in the first byte of every message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ProtocolVersion {
    V1 = 0x01,
    V2 = 0x02,
}

impl ProtocolVersion {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(ProtocolVersion::V1),
            0x02 => Some(ProtocolVersion::V2),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Version 2 appends a 16 byte Authenticator to the header
    pub fn has_authenticator(self) -> bool {
        matches!(self, ProtocolVersion::V2)
    }

    /// Header (plus authenticator) length, the smallest valid frame
    pub fn min_frame_length(self) -> usize {
        if self.has_authenticator() {
            Message::HEADER_LENGTH + Message::AUTHENTICATOR_LENGTH
        } else {
            Message::HEADER_LENGTH
        }
    }

    /// The codec for this version
    pub fn codec(self) -> Arc<dyn Version> {
        match self {
            ProtocolVersion::V1 => Arc::new(V1),
            ProtocolVersion::V2 => Arc::new(V2),
        }
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.as_u8())
    }
}

/// Encoder/decoder for one protocol generation
///
/// Implementors provide decoding and sealing; the builders are shared.
/// Every builder returns a message that is ready to send.
pub trait Version: Send + Sync {
    fn protocol(&self) -> ProtocolVersion;

    fn decode(&self, data: &[u8]) -> Result<Message, MessageError>;

    /// Apply the version's signature to a locally originated message
    fn seal(&self, message: Message, secret: &str) -> Message;

    fn is_response(&self, message: &Message) -> bool {
        message.message_type().is_response()
    }

    /// REQ_CHALLENGE
    fn new_challenge(&self, user_ip: Ipv4Addr, secret: &str, serial: u16) -> Message {
        let message = Message::new(
            self.protocol(),
            MessageType::ReqChallenge,
            serial,
            0,
            user_ip,
        );
        self.seal(message, secret)
    }

    /// CHAP REQ_AUTH answering the challenge issued under `req_id`
    #[allow(clippy::too_many_arguments)]
    fn new_auth(
        &self,
        user_ip: Ipv4Addr,
        secret: &str,
        serial: u16,
        req_id: u16,
        username: &[u8],
        password: &[u8],
        challenge: &[u8],
    ) -> Result<Message, MessageError> {
        let response = compute_chap_response(chap_ident(req_id), password, challenge);

        let mut message = Message::new(self.protocol(), MessageType::ReqAuth, serial, req_id, user_ip)
            .with_auth_method(AuthMethod::Chap);
        message.add_attribute(Attribute::new(
            AttributeType::UserName as u8,
            username.to_vec(),
        )?)?;
        message.add_attribute(Attribute::new(
            AttributeType::ChapPassWord as u8,
            response.to_vec(),
        )?)?;

        Ok(self.seal(message, secret))
    }

    /// PAP REQ_AUTH, no challenge round
    fn new_pap_auth(
        &self,
        user_ip: Ipv4Addr,
        secret: &str,
        serial: u16,
        username: &[u8],
        password: &[u8],
    ) -> Result<Message, MessageError> {
        let mut message = Message::new(self.protocol(), MessageType::ReqAuth, serial, 0, user_ip)
            .with_auth_method(AuthMethod::Pap);
        message.add_attribute(Attribute::new(
            AttributeType::UserName as u8,
            username.to_vec(),
        )?)?;
        message.add_attribute(Attribute::new(
            AttributeType::PassWord as u8,
            password.to_vec(),
        )?)?;

        Ok(self.seal(message, secret))
    }

    /// AFF_ACK_AUTH confirming the ACK_AUTH identified by `serial`/`req_id`
    fn new_aff_ack_auth(&self, user_ip: Ipv4Addr, secret: &str, serial: u16, req_id: u16) -> Message {
        let message = Message::new(
            self.protocol(),
            MessageType::AffAckAuth,
            serial,
            req_id,
            user_ip,
        );
        self.seal(message, secret)
    }

    /// REQ_LOGOUT
    fn new_logout(&self, user_ip: Ipv4Addr, secret: &str, serial: u16) -> Message {
        let message = Message::new(self.protocol(), MessageType::ReqLogout, serial, 0, user_ip);
        self.seal(message, secret)
    }

    /// REQ_INFO
    fn new_req_info(&self, user_ip: Ipv4Addr, secret: &str, serial: u16) -> Message {
        let message = Message::new(self.protocol(), MessageType::ReqInfo, serial, 0, user_ip);
        self.seal(message, secret)
    }

    /// ACK_NTF_LOGOUT answering `notification`
    ///
    /// Carries the notification's serial and request ids. Unlike the other
    /// builders the result is signed against the notification's
    /// authenticator, as a response to the NAS.
    fn new_ack_ntf_logout(&self, user_ip: Ipv4Addr, secret: &str, notification: &Message) -> Message {
        let mut message = Message::new(
            self.protocol(),
            MessageType::AckNtfLogout,
            notification.serial_id(),
            notification.req_id(),
            user_ip,
        );
        message.sign(&notification.authenticator().copied().unwrap_or_default(), secret);
        message
    }
}
