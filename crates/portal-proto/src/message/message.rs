use super::{AuthMethod, MessageType};
use crate::attributes::{Attribute, AttributeType};
use crate::auth::{calculate_authenticator, verify_authenticator};
use crate::version::ProtocolVersion;
use std::net::Ipv4Addr;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    #[error("Truncated message: {len} bytes, need at least {min}")]
    Truncated { len: usize, min: usize },
    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },
    #[error("Unknown message type: {0:#04x}")]
    UnknownType(u8),
    #[error("Attribute {index} needs {needed} bytes, only {remaining} remaining")]
    AttributeOverrun {
        index: usize,
        needed: usize,
        remaining: usize,
    },
    #[error("Invalid attribute length: {0}")]
    InvalidAttributeLength(usize),
    #[error("Attribute value too long: {0} bytes (max 253)")]
    AttributeTooLong(usize),
    #[error("Too many attributes (max 255)")]
    TooManyAttributes,
    #[error("Unexpected response type {actual:?} to {request:?}")]
    UnexpectedType {
        request: MessageType,
        actual: MessageType,
    },
    #[error("Authenticator mismatch on message with serial {serial_id}")]
    ValidationFailure { serial_id: u16 },
    #[error("{kind:?} reports error code {code}: {reason}")]
    Rejected {
        kind: MessageType,
        code: u8,
        reason: &'static str,
        text: Option<String>,
    },
}

impl MessageError {
    /// True for errors raised while parsing bytes off the wire
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            MessageError::Truncated { .. }
                | MessageError::VersionMismatch { .. }
                | MessageError::UnknownType(_)
                | MessageError::AttributeOverrun { .. }
                | MessageError::InvalidAttributeLength(_)
        )
    }
}

/// Portal message as defined by the Huawei portal protocol
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      Ver      |     Type      |   Pap/Chap    |      Rsv      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           SerialNo            |             ReqID             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                            UserIP                             |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           UserPort            |    ErrCode    |    AttrNum    |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                 Authenticator (version 2 only)                |
/// |                           16 bytes                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Attributes ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    version: ProtocolVersion,
    kind: MessageType,
    auth_flag: u8,
    reserved: u8,
    serial_id: u16,
    req_id: u16,
    user_ip: Option<Ipv4Addr>,
    user_port: u16,
    err_code: u8,
    authenticator: Option<[u8; 16]>,
    attributes: Vec<Attribute>,
}

impl Message {
    pub const HEADER_LENGTH: usize = 16;
    pub const AUTHENTICATOR_LENGTH: usize = 16;
    pub const MAX_ATTRIBUTES: usize = 255;

    /// Create an unsigned message with no attributes
    ///
    /// `0.0.0.0` is stored as an absent user IP.
    pub fn new(
        version: ProtocolVersion,
        kind: MessageType,
        serial_id: u16,
        req_id: u16,
        user_ip: Ipv4Addr,
    ) -> Self {
        Message {
            version,
            kind,
            auth_flag: AuthMethod::Chap.as_u8(),
            reserved: 0,
            serial_id,
            req_id,
            user_ip: (!user_ip.is_unspecified()).then_some(user_ip),
            user_port: 0,
            err_code: 0,
            authenticator: version
                .has_authenticator()
                .then_some([0u8; Self::AUTHENTICATOR_LENGTH]),
            attributes: Vec::new(),
        }
    }

    pub fn with_auth_method(mut self, method: AuthMethod) -> Self {
        self.auth_flag = method.as_u8();
        self
    }

    pub fn with_error_code(mut self, code: u8) -> Self {
        self.err_code = code;
        self
    }

    pub fn with_user_port(mut self, port: u16) -> Self {
        self.user_port = port;
        self
    }

    pub fn add_attribute(&mut self, attribute: Attribute) -> Result<(), MessageError> {
        if self.attributes.len() >= Self::MAX_ATTRIBUTES {
            return Err(MessageError::TooManyAttributes);
        }
        self.attributes.push(attribute);
        Ok(())
    }

    /// Fill in the version 2 authenticator
    ///
    /// Locally originated messages sign against sixteen zero bytes; responses
    /// sign against the authenticator of the request they answer. Version 1
    /// messages carry no authenticator and are left untouched.
    pub fn sign(&mut self, request_authenticator: &[u8; 16], secret: &str) {
        if self.authenticator.is_some() {
            self.authenticator = Some(calculate_authenticator(
                self,
                request_authenticator,
                secret.as_bytes(),
            ));
        }
    }

    pub fn version(&self) -> ProtocolVersion {
        self.version
    }

    pub fn message_type(&self) -> MessageType {
        self.kind
    }

    pub fn serial_id(&self) -> u16 {
        self.serial_id
    }

    pub fn req_id(&self) -> u16 {
        self.req_id
    }

    /// The user this message concerns, absent when the NAS sent `0.0.0.0`
    pub fn user_ip(&self) -> Option<Ipv4Addr> {
        self.user_ip
    }

    pub fn user_port(&self) -> u16 {
        self.user_port
    }

    pub fn error_code(&self) -> u8 {
        self.err_code
    }

    /// Decoded Pap/Chap byte; `None` when the peer sent an unknown value
    pub fn auth_method(&self) -> Option<AuthMethod> {
        AuthMethod::from_u8(self.auth_flag)
    }

    pub fn authenticator(&self) -> Option<&[u8; 16]> {
        self.authenticator.as_ref()
    }

    pub fn attribute_len(&self) -> usize {
        self.attributes.len()
    }

    pub fn attribute(&self, index: usize) -> Option<&Attribute> {
        self.attributes.get(index)
    }

    pub fn attributes(&self) -> &[Attribute] {
        &self.attributes
    }

    pub fn find_attribute(&self, attr_type: AttributeType) -> Option<&Attribute> {
        self.attributes
            .iter()
            .find(|a| a.attr_type == attr_type.as_u8())
    }

    /// The CHAP challenge, only present on ACK_CHALLENGE
    pub fn challenge(&self) -> Option<&[u8]> {
        if self.kind != MessageType::AckChallenge {
            return None;
        }
        self.find_attribute(AttributeType::Challenge)
            .map(Attribute::value)
    }

    pub fn text_info(&self) -> Option<String> {
        self.find_attribute(AttributeType::TextInfo)
            .map(Attribute::as_string)
    }

    /// Length of the encoded message
    pub fn length(&self) -> usize {
        self.version.min_frame_length()
            + self
                .attributes
                .iter()
                .map(Attribute::encoded_length)
                .sum::<usize>()
    }

    pub(crate) fn header_bytes(&self) -> [u8; Self::HEADER_LENGTH] {
        let serial = self.serial_id.to_be_bytes();
        let req_id = self.req_id.to_be_bytes();
        let user_ip = self.user_ip.unwrap_or(Ipv4Addr::UNSPECIFIED).octets();
        let user_port = self.user_port.to_be_bytes();

        [
            self.version.as_u8(),
            self.kind.as_u8(),
            self.auth_flag,
            self.reserved,
            serial[0],
            serial[1],
            req_id[0],
            req_id[1],
            user_ip[0],
            user_ip[1],
            user_ip[2],
            user_ip[3],
            user_port[0],
            user_port[1],
            self.err_code,
            // bounded by MAX_ATTRIBUTES in add_attribute()
            self.attributes.len() as u8,
        ]
    }

    /// Wire encoding of this message
    pub fn encode(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.length());
        buffer.extend_from_slice(&self.header_bytes());
        if let Some(authenticator) = &self.authenticator {
            buffer.extend_from_slice(authenticator);
        }
        for attr in &self.attributes {
            attr.encode_into(&mut buffer);
        }
        buffer
    }

    /// Alias of [`Message::encode`]
    pub fn bytes(&self) -> Vec<u8> {
        self.encode()
    }

    /// Decode a message framed for `version`
    ///
    /// Exactly `AttrNum` attributes are read; trailing bytes are ignored.
    pub fn decode(data: &[u8], version: ProtocolVersion) -> Result<Self, MessageError> {
        let min = version.min_frame_length();
        if data.len() < min {
            return Err(MessageError::Truncated {
                len: data.len(),
                min,
            });
        }

        if data[0] != version.as_u8() {
            return Err(MessageError::VersionMismatch {
                expected: version.as_u8(),
                actual: data[0],
            });
        }

        let kind = MessageType::from_u8(data[1]).ok_or(MessageError::UnknownType(data[1]))?;
        let user_ip = Ipv4Addr::new(data[8], data[9], data[10], data[11]);
        let attr_num = data[15] as usize;

        let authenticator = if version.has_authenticator() {
            let mut authenticator = [0u8; Self::AUTHENTICATOR_LENGTH];
            authenticator.copy_from_slice(&data[Self::HEADER_LENGTH..min]);
            Some(authenticator)
        } else {
            None
        };

        let mut attributes = Vec::with_capacity(attr_num);
        let mut attr_data = &data[min..];
        for index in 0..attr_num {
            let attr = Attribute::decode(attr_data, index)?;
            attr_data = &attr_data[attr.encoded_length()..];
            attributes.push(attr);
        }

        Ok(Message {
            version,
            kind,
            auth_flag: data[2],
            reserved: data[3],
            serial_id: u16::from_be_bytes([data[4], data[5]]),
            req_id: u16::from_be_bytes([data[6], data[7]]),
            user_ip: (!user_ip.is_unspecified()).then_some(user_ip),
            user_port: u16::from_be_bytes([data[12], data[13]]),
            err_code: data[14],
            authenticator,
            attributes,
        })
    }

    /// Check that this message is an authentic answer to `request`
    ///
    /// Verifies the response type, the version 2 authenticator and finally
    /// the NAS error code.
    pub fn check_for(&self, request: &Message, secret: &str) -> Result<(), MessageError> {
        if let Some(expected) = request.kind.expected_response()
            && self.kind != expected
        {
            return Err(MessageError::UnexpectedType {
                request: request.kind,
                actual: self.kind,
            });
        }

        if self.authenticator.is_some() {
            let request_authenticator = request.authenticator.unwrap_or_default();
            if !verify_authenticator(self, &request_authenticator, secret.as_bytes()) {
                return Err(MessageError::ValidationFailure {
                    serial_id: self.serial_id,
                });
            }
        }

        self.check_error_code()
    }

    /// Map a non-zero NAS error code to [`MessageError::Rejected`]
    pub fn check_error_code(&self) -> Result<(), MessageError> {
        if self.err_code == 0 || !self.kind.carries_error_code() {
            return Ok(());
        }
        Err(MessageError::Rejected {
            kind: self.kind,
            code: self.err_code,
            reason: self.kind.rejection_reason(self.err_code),
            text: self.text_info(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: [u8; 34] = [
        0x01, 0x02, 0x00, 0x00, 0x6f, 0x3c, 0x00, 0x06, 0xc0, 0xa8, 0x0a, 0xfe, 0x00, 0x00, 0x00,
        0x01, 0x03, 0x12, 0xef, 0x47, 0x25, 0x3d, 0xc5, 0x19, 0x41, 0xb7, 0x63, 0x97, 0x35, 0x07,
        0x75, 0xe7, 0x3d, 0x95,
    ];

    #[test]
    fn test_decode_v1_fixture() {
        let message = Message::decode(&FIXTURE, ProtocolVersion::V1).unwrap();

        assert_eq!(message.version(), ProtocolVersion::V1);
        assert_eq!(message.message_type(), MessageType::AckChallenge);
        assert_eq!(message.serial_id(), 0x6f3c);
        assert_eq!(message.req_id(), 0x0006);
        assert_eq!(message.user_ip(), Some(Ipv4Addr::new(192, 168, 10, 254)));
        assert_eq!(message.auth_method(), Some(AuthMethod::Chap));
        assert_eq!(message.error_code(), 0);
        assert_eq!(message.attribute_len(), 1);

        let attr = message.attribute(0).unwrap();
        assert_eq!(attr.attr_type, AttributeType::Challenge as u8);
        assert_eq!(attr.length(), 0x12);
        assert_eq!(message.challenge(), Some(&FIXTURE[18..]));
    }

    #[test]
    fn test_fixture_reencodes_exactly() {
        let message = Message::decode(&FIXTURE, ProtocolVersion::V1).unwrap();
        assert_eq!(message.encode(), FIXTURE.to_vec());
        assert_eq!(message.length(), FIXTURE.len());
    }

    #[test]
    fn test_decode_truncated() {
        assert!(matches!(
            Message::decode(&[0x01], ProtocolVersion::V1),
            Err(MessageError::Truncated { len: 1, min: 16 })
        ));
        assert!(matches!(
            Message::decode(&FIXTURE[..20], ProtocolVersion::V2),
            Err(MessageError::Truncated { len: 20, min: 32 })
        ));
    }

    #[test]
    fn test_decode_attribute_overrun() {
        let err = Message::decode(&FIXTURE[..30], ProtocolVersion::V1).unwrap_err();
        assert!(err.is_malformed());
        assert!(matches!(
            err,
            MessageError::AttributeOverrun {
                index: 0,
                needed: 18,
                remaining: 14
            }
        ));
    }

    #[test]
    fn test_decode_missing_attribute() {
        // AttrNum says two, only one present
        let mut data = FIXTURE.to_vec();
        data[15] = 2;
        assert!(matches!(
            Message::decode(&data, ProtocolVersion::V1),
            Err(MessageError::AttributeOverrun { index: 1, .. })
        ));
    }

    #[test]
    fn test_decode_version_mismatch() {
        assert!(matches!(
            Message::decode(&FIXTURE, ProtocolVersion::V2),
            Err(MessageError::VersionMismatch {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_decode_unknown_type() {
        let mut data = FIXTURE.to_vec();
        data[1] = 0x0c;
        assert_eq!(
            Message::decode(&data, ProtocolVersion::V1),
            Err(MessageError::UnknownType(0x0c))
        );
    }

    #[test]
    fn test_unspecified_user_ip_is_absent() {
        let message = Message::new(
            ProtocolVersion::V1,
            MessageType::NtfLogout,
            7,
            9,
            Ipv4Addr::UNSPECIFIED,
        );
        assert_eq!(message.user_ip(), None);

        let decoded = Message::decode(&message.encode(), ProtocolVersion::V1).unwrap();
        assert_eq!(decoded.user_ip(), None);
    }

    #[test]
    fn test_challenge_only_on_ack_challenge() {
        let mut message = Message::new(
            ProtocolVersion::V1,
            MessageType::AckAuth,
            1,
            1,
            Ipv4Addr::new(10, 0, 0, 1),
        );
        message
            .add_attribute(Attribute::new(AttributeType::Challenge as u8, vec![1; 16]).unwrap())
            .unwrap();
        assert_eq!(message.challenge(), None);
    }

    #[test]
    fn test_error_code_rejection() {
        let mut message = Message::new(
            ProtocolVersion::V1,
            MessageType::AckAuth,
            1,
            1,
            Ipv4Addr::new(10, 0, 0, 1),
        )
        .with_error_code(1);
        message
            .add_attribute(Attribute::string(AttributeType::TextInfo as u8, "bad password").unwrap())
            .unwrap();

        match message.check_error_code() {
            Err(MessageError::Rejected {
                kind, code, text, ..
            }) => {
                assert_eq!(kind, MessageType::AckAuth);
                assert_eq!(code, 1);
                assert_eq!(text.as_deref(), Some("bad password"));
            }
            other => panic!("Expected Rejected, got {:?}", other),
        }
    }

    #[test]
    fn test_error_code_ignored_on_notifications() {
        let message = Message::new(
            ProtocolVersion::V1,
            MessageType::NtfLogout,
            1,
            1,
            Ipv4Addr::new(10, 0, 0, 1),
        )
        .with_error_code(3);
        assert!(message.check_error_code().is_ok());
    }

    #[test]
    fn test_check_for_wrong_type() {
        let ip = Ipv4Addr::new(10, 0, 0, 1);
        let request = Message::new(ProtocolVersion::V1, MessageType::ReqLogout, 5, 0, ip);
        let response = Message::new(ProtocolVersion::V1, MessageType::AckAuth, 5, 0, ip);
        assert_eq!(
            response.check_for(&request, "secret"),
            Err(MessageError::UnexpectedType {
                request: MessageType::ReqLogout,
                actual: MessageType::AckAuth,
            })
        );
    }

    #[test]
    fn test_too_many_attributes() {
        let mut message = Message::new(
            ProtocolVersion::V1,
            MessageType::AckInfo,
            1,
            1,
            Ipv4Addr::new(10, 0, 0, 1),
        );
        for _ in 0..Message::MAX_ATTRIBUTES {
            message.add_attribute(Attribute::new(5, vec![]).unwrap()).unwrap();
        }
        assert_eq!(
            message.add_attribute(Attribute::new(5, vec![]).unwrap()),
            Err(MessageError::TooManyAttributes)
        );
    }
}
