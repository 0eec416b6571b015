use std::time::Duration;

/// Command codes understood by the station firmware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Command {
    // ---- Data ----
    GetData = 0x00,
    GetAllData = 0x01,
    SetTime = 0x02,
    GetTime = 0x03,
    GetUnit = 0x04,
    GetVersion = 0x05,
    ResetData = 0x06,

    // ---- Anemometer calibration ----
    Radius = 0x07,
    Speed1 = 0x08,
    Speed2 = 0x09,
    Calibrate = 0x0A,

    // ---- Uplink configuration ----
    Dtu = 0x0C,
    Wifi = 0x0D,
    Lora = 0x0E,
    Mqtt1 = 0x10,
    Mqtt2 = 0x11,
    Topic = 0x12,
}

/// Highest command code the firmware accepts.
pub const CMD_END: u8 = Command::Topic as u8;

impl Command {
    pub const ALL: [Command; 17] = [
        Command::GetData,
        Command::GetAllData,
        Command::SetTime,
        Command::GetTime,
        Command::GetUnit,
        Command::GetVersion,
        Command::ResetData,
        Command::Radius,
        Command::Speed1,
        Command::Speed2,
        Command::Calibrate,
        Command::Dtu,
        Command::Wifi,
        Command::Lora,
        Command::Mqtt1,
        Command::Mqtt2,
        Command::Topic,
    ];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Extra time the peripheral needs to act on the command before it
    /// starts answering. Added to the response deadline of the exchange.
    pub fn processing_time(self) -> Duration {
        match self {
            Command::GetData | Command::GetUnit | Command::GetVersion | Command::ResetData => {
                Duration::ZERO
            }
            Command::Radius => Duration::from_secs(2),
            Command::Speed1 | Command::Speed2 | Command::Calibrate => Duration::from_secs(10),
            _ => Duration::from_millis(100),
        }
    }
}

/// First byte of every response, plus the two out-of-band markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Status {
    Success = 0x53,
    Failed = 0x63,
    Reset = 0xD3,
    Idle = 0xFF,
}

impl Status {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x53 => Some(Status::Success),
            0x63 => Some(Status::Failed),
            0xD3 => Some(Status::Reset),
            0xFF => Some(Status::Idle),
            _ => None,
        }
    }

    /// Only these two open a response frame.
    pub fn opens_frame(self) -> bool {
        matches!(self, Status::Success | Status::Failed)
    }
}

/// Wire-level error taxonomy shared by host and peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ErrorCode {
    None = 0x00,
    CommandInvalid = 0x01,
    ResponsePacketError = 0x02,
    ControllerOutOfMemory = 0x03,
    ResponseTimeout = 0x04,
    CommandPacketError = 0x05,
    PeripheralFault = 0x06,
    ArgumentError = 0x07,
    UnsupportedSku = 0x08,
    PeripheralOutOfMemory = 0x09,
    InvalidAddress = 0x0A,
}

impl ErrorCode {
    /// Decode a device-reported code. Anything outside the table is
    /// reported as a peripheral fault.
    pub fn from_byte(b: u8) -> Self {
        match b {
            0x00 => ErrorCode::None,
            0x01 => ErrorCode::CommandInvalid,
            0x02 => ErrorCode::ResponsePacketError,
            0x03 => ErrorCode::ControllerOutOfMemory,
            0x04 => ErrorCode::ResponseTimeout,
            0x05 => ErrorCode::CommandPacketError,
            0x06 => ErrorCode::PeripheralFault,
            0x07 => ErrorCode::ArgumentError,
            0x08 => ErrorCode::UnsupportedSku,
            0x09 => ErrorCode::PeripheralOutOfMemory,
            0x0A => ErrorCode::InvalidAddress,
            _ => ErrorCode::PeripheralFault,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            ErrorCode::None => "no error",
            ErrorCode::CommandInvalid => "invalid command",
            ErrorCode::ResponsePacketError => "response packet error",
            ErrorCode::ControllerOutOfMemory => "controller out of memory",
            ErrorCode::ResponseTimeout => "response timeout",
            ErrorCode::CommandPacketError => "invalid or unmatched command packet",
            ErrorCode::PeripheralFault => "peripheral fault",
            ErrorCode::ArgumentError => "argument error",
            ErrorCode::UnsupportedSku => "unsupported sku",
            ErrorCode::PeripheralOutOfMemory => "peripheral out of memory",
            ErrorCode::InvalidAddress => "invalid address",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} (0x{:02X})", self.describe(), *self as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_codes_match_firmware_table() {
        assert_eq!(Command::GetData.code(), 0x00);
        assert_eq!(Command::GetUnit.code(), 0x04);
        assert_eq!(Command::ResetData.code(), 0x06);
        assert_eq!(Command::Calibrate.code(), 0x0A);
        assert_eq!(Command::Dtu.code(), 0x0C);
        assert_eq!(Command::Mqtt1.code(), 0x10);
        assert_eq!(CMD_END, 0x12);
    }

    #[test]
    fn from_code_rejects_gaps_and_overflow() {
        assert_eq!(Command::from_code(0x0D), Some(Command::Wifi));
        assert_eq!(Command::from_code(0x0B), None);
        assert_eq!(Command::from_code(0x0F), None);
        assert_eq!(Command::from_code(0x13), None);
        for c in Command::ALL {
            assert_eq!(Command::from_code(c.code()), Some(c));
        }
    }

    #[test]
    fn status_bytes() {
        assert_eq!(Status::from_byte(0x53), Some(Status::Success));
        assert_eq!(Status::from_byte(0xD3), Some(Status::Reset));
        assert_eq!(Status::from_byte(0x00), None);
        assert!(Status::Failed.opens_frame());
        assert!(!Status::Idle.opens_frame());
    }

    #[test]
    fn unknown_device_code_is_a_fault() {
        assert_eq!(ErrorCode::from_byte(0x07), ErrorCode::ArgumentError);
        assert_eq!(ErrorCode::from_byte(0x42), ErrorCode::PeripheralFault);
    }
}
