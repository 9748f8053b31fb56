//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! ### Request (Command) Format
//! ```text
//! ┌──────────┬──────────────────────────────────────┐
//! │ Cmd (1)  │ Reading (EUC-JP) ... ' ' or '\n'     │
//! └──────────┴──────────────────────────────────────┘
//! ```
//! Only a single read of at most `MAX_FRAME_SIZE` bytes is taken per
//! connection. The reading ends at the first space or newline after the
//! tag, or at the end of what was read.
//!
//! ### Response Format
//! ```text
//! FOUND:     '1' '/' conversion '\n'
//! NOT_FOUND: '4' reading ' ' '\n'
//! ERROR:     '0' '\n'
//! VERSION:   name '/' version ' '
//! HOST:      ip ':' port ':' ' '
//! ```

use std::io::{Read, Write};

use bytes::{BufMut, BytesMut};
use encoding_rs::EUC_JP;

use crate::error::{BridgeError, Result};
use super::{Command, CommandType, Response, Status};

/// Maximum bytes read for one command frame
pub const MAX_FRAME_SIZE: usize = 512;

// =============================================================================
// Text Encoding
// =============================================================================

/// Decode EUC-JP bytes, rejecting malformed sequences
pub fn decode_text(bytes: &[u8]) -> Result<String> {
    EUC_JP
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
        .ok_or_else(|| {
            BridgeError::Encoding(format!("{} bytes are not valid EUC-JP", bytes.len()))
        })
}

/// Encode text as EUC-JP
///
/// Characters outside EUC-JP become numeric character references.
pub fn encode_text(text: &str) -> Vec<u8> {
    let (bytes, _, _) = EUC_JP.encode(text);
    bytes.into_owned()
}

// =============================================================================
// Command Encoding/Decoding
// =============================================================================

/// Decode a command frame
///
/// Fails only on an empty frame; unknown tags decode to `Command::Unknown`.
pub fn decode_command(frame: &[u8]) -> Result<Command> {
    let (&tag, rest) = frame
        .split_first()
        .ok_or_else(|| BridgeError::Protocol("empty command frame".to_string()))?;

    let command = match CommandType::from_tag(tag) {
        Some(CommandType::End) => Command::End,
        Some(CommandType::Request) => Command::Request {
            reading: extract_reading(rest).to_vec(),
        },
        Some(CommandType::Version) => Command::Version,
        Some(CommandType::Host) => Command::Host,
        None => Command::Unknown(tag),
    };

    Ok(command)
}

/// Bytes up to the first space or newline (or all of them)
fn extract_reading(payload: &[u8]) -> &[u8] {
    let end = payload
        .iter()
        .position(|&b| b == b' ' || b == b'\n')
        .unwrap_or(payload.len());
    &payload[..end]
}

/// Encode a command frame (client side)
///
/// Requests are terminated with `" \n"`, the way skkserv clients send them.
pub fn encode_command(command: &Command) -> Vec<u8> {
    match command {
        Command::End => vec![CommandType::End as u8],
        Command::Request { reading } => {
            let mut frame = Vec::with_capacity(reading.len() + 3);
            frame.push(CommandType::Request as u8);
            frame.extend_from_slice(reading);
            frame.extend_from_slice(b" \n");
            frame
        }
        Command::Version => vec![CommandType::Version as u8],
        Command::Host => vec![CommandType::Host as u8],
        Command::Unknown(tag) => vec![*tag],
    }
}

// =============================================================================
// Response Encoding
// =============================================================================

/// Encode a response to bytes
pub fn encode_response(response: &Response) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(64);

    match response {
        Response::Found(conversion) => {
            buf.put_u8(Status::Found as u8);
            buf.put_u8(b'/');
            buf.put_slice(&encode_text(conversion));
            buf.put_u8(b'\n');
        }
        Response::NotFound(reading) => {
            buf.put_u8(Status::NotFound as u8);
            buf.put_slice(&encode_text(reading));
            buf.put_slice(b" \n");
        }
        Response::Error => {
            buf.put_u8(Status::Error as u8);
            buf.put_u8(b'\n');
        }
        Response::Version(version) => {
            buf.put_slice(version.as_bytes());
            buf.put_u8(b' ');
        }
        Response::Host(addr) => {
            buf.put_slice(format!("{}:{}: ", addr.ip(), addr.port()).as_bytes());
        }
    }

    buf.to_vec()
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Read one command frame with a single read call
///
/// Returns `Ok(None)` if the peer closed without sending anything.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>> {
    let mut buf = [0u8; MAX_FRAME_SIZE];
    let n = reader.read(&mut buf)?;

    if n == 0 {
        return Ok(None);
    }
    Ok(Some(buf[..n].to_vec()))
}

/// Write a command to a stream
pub fn write_command<W: Write>(writer: &mut W, command: &Command) -> Result<()> {
    writer.write_all(&encode_command(command))?;
    writer.flush()?;
    Ok(())
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    writer.write_all(&encode_response(response))?;
    writer.flush()?;
    Ok(())
}
