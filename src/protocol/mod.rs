//! Protocol Module
//!
//! Defines the skkserv wire protocol for client-server communication.
//!
//! ## Exchange
//! One command per connection: the client sends a frame, the server sends at
//! most one reply and closes.
//!
//! ### Commands (first byte, raw or ASCII digit)
//! - 0: END      - no reply
//! - 1: REQUEST  - Payload: reading (EUC-JP) terminated by space/newline
//! - 2: VERSION  - no payload
//! - 3: HOST     - no payload
//!
//! ### Status Codes (ASCII)
//! - '1': FOUND
//! - '4': NOT_FOUND
//! - '0': ERROR

mod command;
mod response;
mod codec;

pub use command::{Command, CommandType};
pub use response::{Response, Status};
pub use codec::{
    decode_command, decode_text, encode_command, encode_response, encode_text, read_frame,
    write_command, write_response, MAX_FRAME_SIZE,
};
