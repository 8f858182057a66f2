use std::fmt;
use std::str::FromStr;

/// Portal message types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageType {
    /// REQ_CHALLENGE (1) - portal asks the NAS for a CHAP challenge
    ReqChallenge = 0x01,
    /// ACK_CHALLENGE (2) - NAS answers with the challenge
    AckChallenge = 0x02,
    /// REQ_AUTH (3) - portal submits user credentials
    ReqAuth = 0x03,
    /// ACK_AUTH (4) - NAS authentication result
    AckAuth = 0x04,
    /// REQ_LOGOUT (5) - portal asks the NAS to log a user out
    ReqLogout = 0x05,
    /// ACK_LOGOUT (6) - NAS logout result
    AckLogout = 0x06,
    /// AFF_ACK_AUTH (7) - portal confirms it received ACK_AUTH
    AffAckAuth = 0x07,
    /// NTF_LOGOUT (8) - NAS-initiated logout notification
    NtfLogout = 0x08,
    /// REQ_INFO (9) - portal information query
    ReqInfo = 0x09,
    /// ACK_INFO (10) - NAS answer to REQ_INFO
    AckInfo = 0x0a,
    /// ACK_NTF_LOGOUT (14) - portal acknowledges NTF_LOGOUT
    AckNtfLogout = 0x0e,
}

impl MessageType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(MessageType::ReqChallenge),
            0x02 => Some(MessageType::AckChallenge),
            0x03 => Some(MessageType::ReqAuth),
            0x04 => Some(MessageType::AckAuth),
            0x05 => Some(MessageType::ReqLogout),
            0x06 => Some(MessageType::AckLogout),
            0x07 => Some(MessageType::AffAckAuth),
            0x08 => Some(MessageType::NtfLogout),
            0x09 => Some(MessageType::ReqInfo),
            0x0a => Some(MessageType::AckInfo),
            0x0e => Some(MessageType::AckNtfLogout),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether this type answers (or confirms) an earlier message
    pub fn is_response(self) -> bool {
        matches!(
            self,
            MessageType::AckChallenge
                | MessageType::AckAuth
                | MessageType::AckLogout
                | MessageType::AckInfo
                | MessageType::AffAckAuth
        )
    }

    /// The response type a NAS sends back for this request, if any
    pub fn expected_response(self) -> Option<MessageType> {
        match self {
            MessageType::ReqChallenge => Some(MessageType::AckChallenge),
            MessageType::ReqAuth => Some(MessageType::AckAuth),
            MessageType::ReqLogout => Some(MessageType::AckLogout),
            MessageType::ReqInfo => Some(MessageType::AckInfo),
            _ => None,
        }
    }

    /// Meaning of a non-zero error code carried by this type
    pub(crate) fn rejection_reason(self, code: u8) -> &'static str {
        match (self, code) {
            (MessageType::AckChallenge | MessageType::AckAuth, 1) => "request rejected",
            (MessageType::AckChallenge | MessageType::AckAuth, 2) => {
                "connection already established"
            }
            (MessageType::AckChallenge | MessageType::AckAuth, 3) => {
                "another authentication is in progress for this user"
            }
            (MessageType::AckChallenge | MessageType::AckAuth, 4) => "request failed",
            (MessageType::AckLogout, 1) => "logout rejected",
            (MessageType::AckLogout, 2) => "logout failed",
            (MessageType::AckInfo, 1) => "information request not supported",
            (MessageType::AckInfo, 2) => "information request failed",
            _ => "unknown error",
        }
    }

    /// Types whose error code reports a NAS-side failure
    pub(crate) fn carries_error_code(self) -> bool {
        matches!(
            self,
            MessageType::AckChallenge
                | MessageType::AckAuth
                | MessageType::AckLogout
                | MessageType::AckInfo
        )
    }
}

/// Value of the Pap/Chap header byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum AuthMethod {
    #[default]
    Chap = 0x00,
    Pap = 0x01,
}

impl AuthMethod {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x00 => Some(AuthMethod::Chap),
            0x01 => Some(AuthMethod::Pap),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::Chap => f.write_str("chap"),
            AuthMethod::Pap => f.write_str("pap"),
        }
    }
}

impl FromStr for AuthMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chap" => Ok(AuthMethod::Chap),
            "pap" => Ok(AuthMethod::Pap),
            other => Err(format!("unknown authentication method: {}", other)),
        }
    }
}
