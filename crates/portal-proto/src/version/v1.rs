use super::{ProtocolVersion, Version};
use crate::message::{Message, MessageError};

/// Portal protocol version 1
///
/// Messages are a 16 byte header followed by attributes. There is no
/// authenticator; responses are validated by type and error code only.
#[derive(Debug, Clone, Copy, Default)]
pub struct V1;

impl Version for V1 {
    fn protocol(&self) -> ProtocolVersion {
        ProtocolVersion::V1
    }

    fn decode(&self, data: &[u8]) -> Result<Message, MessageError> {
        Message::decode(data, ProtocolVersion::V1)
    }

    fn seal(&self, message: Message, _secret: &str) -> Message {
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageType;
    use std::net::Ipv4Addr;

    #[test]
    fn test_challenge_wire_form() {
        let message = V1.new_challenge(Ipv4Addr::new(192, 168, 56, 2), "it is a secret", 0xabcd);
        assert_eq!(
            message.encode(),
            vec![
                0x01, 0x01, 0x00, 0x00, 0xab, 0xcd, 0x00, 0x00, 0xc0, 0xa8, 0x38, 0x02, 0x00, 0x00,
                0x00, 0x00
            ]
        );
        assert!(message.authenticator().is_none());
    }

    #[test]
    fn test_v1_response_check_ignores_secret() {
        let ip = Ipv4Addr::new(10, 1, 1, 1);
        let request = V1.new_logout(ip, "secret", 42);
        let response = Message::new(ProtocolVersion::V1, MessageType::AckLogout, 42, 0, ip);
        assert!(response.check_for(&request, "another secret").is_ok());
    }
}
