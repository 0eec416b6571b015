use crate::channel::ChannelError;
use crate::proto::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no response within {0:?}")]
    Timeout(std::time::Duration),
    #[error("response echoes command 0x{got:02X}, expected 0x{expected:02X}")]
    ResponsePacket { expected: u8, got: u8 },
    #[error("invalid command code 0x{0:02X}")]
    CommandInvalid(u8),
    #[error("command 0x{command:02X} failed: {code}")]
    Failed { command: u8, code: ErrorCode },
    #[error("argument error: {0}")]
    Argument(String),
    #[error("argument block of {0} bytes exceeds the 16-bit length field")]
    PayloadTooLarge(usize),
    #[error("channel: {0}")]
    Channel(#[from] ChannelError),
}

impl Error {
    /// Wire error code for this failure.
    pub fn code(&self) -> ErrorCode {
        match self {
            Error::Timeout(_) => ErrorCode::ResponseTimeout,
            Error::ResponsePacket { .. } => ErrorCode::ResponsePacketError,
            Error::CommandInvalid(_) => ErrorCode::CommandInvalid,
            Error::Failed { code, .. } => *code,
            Error::Argument(_) | Error::PayloadTooLarge(_) => ErrorCode::ArgumentError,
            Error::Channel(_) => ErrorCode::PeripheralFault,
        }
    }

    pub fn argument(msg: impl Into<String>) -> Self {
        Error::Argument(msg.into())
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
