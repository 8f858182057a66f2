use super::{ProtocolVersion, Version};
use crate::message::{Message, MessageError};

/// Portal protocol version 2
///
/// Adds a 16 byte MD5 Authenticator after the header, binding every message
/// to the shared secret (and, for responses, to the request they answer).
#[derive(Debug, Clone, Copy, Default)]
pub struct V2;

impl V2 {
    const ZERO_AUTHENTICATOR: [u8; 16] = [0u8; 16];
}

impl Version for V2 {
    fn protocol(&self) -> ProtocolVersion {
        ProtocolVersion::V2
    }

    fn decode(&self, data: &[u8]) -> Result<Message, MessageError> {
        Message::decode(data, ProtocolVersion::V2)
    }

    fn seal(&self, mut message: Message, secret: &str) -> Message {
        message.sign(&Self::ZERO_AUTHENTICATOR, secret);
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attributes::{Attribute, AttributeType};
    use crate::auth::verify_authenticator;
    use crate::message::MessageType;
    use std::net::Ipv4Addr;

    const SECRET: &str = "testing123";

    fn nas_reply(request: &Message, kind: MessageType, secret: &str) -> Message {
        let mut reply = Message::new(
            ProtocolVersion::V2,
            kind,
            request.serial_id(),
            0x0031,
            request.user_ip().unwrap(),
        );
        reply
            .add_attribute(Attribute::new(AttributeType::Challenge as u8, vec![0x11; 16]).unwrap())
            .unwrap();
        reply.sign(request.authenticator().unwrap(), secret);
        reply
    }

    #[test]
    fn test_sealed_request_is_signed() {
        let message = V2.new_challenge(Ipv4Addr::new(192, 168, 56, 2), SECRET, 77);
        assert_eq!(message.encode().len(), 32);
        assert_ne!(message.authenticator(), Some(&[0u8; 16]));
        assert!(verify_authenticator(&message, &[0u8; 16], SECRET.as_bytes()));
    }

    #[test]
    fn test_response_validates_against_request() {
        let request = V2.new_challenge(Ipv4Addr::new(192, 168, 56, 2), SECRET, 77);
        let reply = nas_reply(&request, MessageType::AckChallenge, SECRET);

        let decoded = V2.decode(&reply.encode()).unwrap();
        assert!(decoded.check_for(&request, SECRET).is_ok());
        assert_eq!(decoded.challenge(), Some(&[0x11u8; 16][..]));
    }

    #[test]
    fn test_response_with_wrong_secret_fails_validation() {
        let request = V2.new_challenge(Ipv4Addr::new(192, 168, 56, 2), SECRET, 77);
        let reply = nas_reply(&request, MessageType::AckChallenge, "not the secret");

        assert_eq!(
            reply.check_for(&request, SECRET),
            Err(MessageError::ValidationFailure { serial_id: 77 })
        );
    }

    #[test]
    fn test_tampered_response_fails_validation() {
        let request = V2.new_logout(Ipv4Addr::new(10, 0, 0, 9), SECRET, 5);
        let reply = nas_reply(&request, MessageType::AckLogout, SECRET);

        let mut bytes = reply.encode();
        let last = bytes.len() - 1;
        bytes[last] ^= 0x01;
        let tampered = V2.decode(&bytes).unwrap();
        assert!(matches!(
            tampered.check_for(&request, SECRET),
            Err(MessageError::ValidationFailure { .. })
        ));
    }
}
