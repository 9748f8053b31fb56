//! Command definitions
//!
//! Represents commands from clients.

/// Command tags (first byte of a frame)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum CommandType {
    End = 0x00,
    Request = 0x01,
    Version = 0x02,
    Host = 0x03,
}

impl CommandType {
    /// Map a tag byte to a command type
    ///
    /// Accepts the raw byte (`0x00..=0x03`) and the ASCII digit
    /// (`b'0'..=b'3'`) sent by most skkserv clients.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x00 | b'0' => Some(CommandType::End),
            0x01 | b'1' => Some(CommandType::Request),
            0x02 | b'2' => Some(CommandType::Version),
            0x03 | b'3' => Some(CommandType::Host),
            _ => None,
        }
    }
}

/// A parsed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Close the connection without a reply
    End,

    /// Convert a reading (still in wire encoding)
    Request { reading: Vec<u8> },

    /// Report server name and version
    Version,

    /// Report the address the connection was accepted on
    Host,

    /// Tag outside the protocol; ignored
    Unknown(u8),
}

impl Command {
    /// Get the command type (`None` for unknown tags)
    pub fn command_type(&self) -> Option<CommandType> {
        match self {
            Command::End => Some(CommandType::End),
            Command::Request { .. } => Some(CommandType::Request),
            Command::Version => Some(CommandType::Version),
            Command::Host => Some(CommandType::Host),
            Command::Unknown(_) => None,
        }
    }
}
