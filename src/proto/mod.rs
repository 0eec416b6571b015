pub mod command;

pub use command::{CMD_END, Command, ErrorCode, Status};
