use crate::message::MessageError;
use std::net::Ipv4Addr;

/// Portal attribute
///
/// ```text
///  0                   1                   2
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  AttrType     |  AttrLen      |  AttrValue ...
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
///
/// `AttrLen` counts the two header bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute type (1 byte)
    pub attr_type: u8,
    value: Vec<u8>,
}

impl Attribute {
    /// Type and length fields
    pub const HEADER_LENGTH: usize = 2;
    /// Largest encodable attribute, header included
    pub const MAX_LENGTH: usize = 255;
    pub const MAX_VALUE_LENGTH: usize = Self::MAX_LENGTH - Self::HEADER_LENGTH;

    pub fn new(attr_type: u8, value: Vec<u8>) -> Result<Self, MessageError> {
        if value.len() > Self::MAX_VALUE_LENGTH {
            return Err(MessageError::AttributeTooLong(value.len()));
        }
        Ok(Attribute { attr_type, value })
    }

    pub fn string(attr_type: u8, value: impl Into<String>) -> Result<Self, MessageError> {
        Self::new(attr_type, value.into().into_bytes())
    }

    pub fn ipv4(attr_type: u8, value: Ipv4Addr) -> Result<Self, MessageError> {
        Self::new(attr_type, value.octets().to_vec())
    }

    /// Value of the length byte on the wire
    pub fn length(&self) -> u8 {
        // bounded by MAX_VALUE_LENGTH in new()
        (Self::HEADER_LENGTH + self.value.len()) as u8
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    pub fn encoded_length(&self) -> usize {
        Self::HEADER_LENGTH + self.value.len()
    }

    pub(crate) fn encode_into(&self, buffer: &mut Vec<u8>) {
        buffer.push(self.attr_type);
        buffer.push(self.length());
        buffer.extend_from_slice(&self.value);
    }

    /// Decode one attribute from the front of `data`
    ///
    /// `index` is the attribute's position in the message and only feeds
    /// error reporting.
    pub(crate) fn decode(data: &[u8], index: usize) -> Result<Self, MessageError> {
        if data.len() < Self::HEADER_LENGTH {
            return Err(MessageError::AttributeOverrun {
                index,
                needed: Self::HEADER_LENGTH,
                remaining: data.len(),
            });
        }

        let attr_type = data[0];
        let length = data[1] as usize;

        if length < Self::HEADER_LENGTH {
            return Err(MessageError::InvalidAttributeLength(length));
        }

        if data.len() < length {
            return Err(MessageError::AttributeOverrun {
                index,
                needed: length,
                remaining: data.len(),
            });
        }

        Ok(Attribute {
            attr_type,
            value: data[Self::HEADER_LENGTH..length].to_vec(),
        })
    }

    pub fn as_string(&self) -> String {
        String::from_utf8_lossy(&self.value).into_owned()
    }

    pub fn as_ipv4(&self) -> Option<Ipv4Addr> {
        let octets: [u8; 4] = self.value.as_slice().try_into().ok()?;
        Some(Ipv4Addr::from(octets))
    }
}
