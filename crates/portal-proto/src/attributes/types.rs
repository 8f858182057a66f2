/// Portal attribute types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AttributeType {
    /// UserName (1)
    UserName = 0x01,
    /// PassWord (2) - PAP password, plain text
    PassWord = 0x02,
    /// Challenge (3) - 16 byte CHAP challenge issued by the NAS
    Challenge = 0x03,
    /// ChapPassWord (4) - MD5(chap id + password + challenge)
    ChapPassWord = 0x04,
    /// TextInfo (5) - human readable NAS message
    TextInfo = 0x05,
    /// UpLinkFlux (6)
    UpLinkFlux = 0x06,
    /// DownLinkFlux (7)
    DownLinkFlux = 0x07,
    /// Port (8)
    Port = 0x08,
    /// BasIp (10) - address of the NAS
    BasIp = 0x0a,
    /// SessionId (11) - usually the user MAC address
    SessionId = 0x0b,
}

impl AttributeType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0x01 => Some(AttributeType::UserName),
            0x02 => Some(AttributeType::PassWord),
            0x03 => Some(AttributeType::Challenge),
            0x04 => Some(AttributeType::ChapPassWord),
            0x05 => Some(AttributeType::TextInfo),
            0x06 => Some(AttributeType::UpLinkFlux),
            0x07 => Some(AttributeType::DownLinkFlux),
            0x08 => Some(AttributeType::Port),
            0x0a => Some(AttributeType::BasIp),
            0x0b => Some(AttributeType::SessionId),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
