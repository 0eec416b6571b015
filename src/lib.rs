//! Host-side driver for the Lark weather station's SCI packet protocol.

pub mod channel;
pub mod engine;
pub mod error;
pub mod frame;
pub mod port;
pub mod proto;
pub mod sensor;
pub mod station;
pub mod stats;

pub use channel::{ByteChannel, ChannelError};
pub use engine::{Engine, EngineConfig};
pub use error::{Error, Result};
pub use frame::{CommandFrame, ResponseFrame};
pub use proto::{Command, ErrorCode, Status};
pub use sensor::{Attribute, Reading};
pub use station::{RtcTime, Station};
