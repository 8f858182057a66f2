//! Portal Protocol Implementation
//!
//! This crate implements the binary UDP protocol spoken between a captive
//! portal server and a Huawei-style Network Access Server (NAS).
//!
//! # Features
//!
//! - Message encoding and decoding for protocol versions 1 and 2
//! - Type-length-value attributes
//! - MD5 request/response authenticators (version 2)
//! - CHAP password computation and verification
//!
//! # Example
//!
//! ```rust
//! use portal_proto::{MessageType, ProtocolVersion};
//! use std::net::Ipv4Addr;
//!
//! let codec = ProtocolVersion::V2.codec();
//! let request = codec.new_challenge(Ipv4Addr::new(192, 168, 56, 2), "secret", 0x1234);
//!
//! let bytes = request.encode();
//! let decoded = codec.decode(&bytes).unwrap();
//! assert_eq!(decoded.message_type(), MessageType::ReqChallenge);
//! assert_eq!(decoded.serial_id(), 0x1234);
//! ```

pub mod attributes;
pub mod auth;
pub mod chap;
pub mod message;
pub mod version;

pub use attributes::{Attribute, AttributeType};
pub use auth::{calculate_authenticator, verify_authenticator};
pub use chap::{compute_chap_response, verify_chap};
pub use message::{AuthMethod, Message, MessageError, MessageType};
pub use version::{ProtocolVersion, V1, V2, Version};
