// Wire-level types for the file-transfer protocol.
pub mod message;
pub mod opcode;

pub use message::FtpMessage;
pub use opcode::{FtpError, FtpOpcode};
