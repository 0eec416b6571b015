//! Byte layout of SCI request and response frames.
//!
//! Request:  `[cmd][len_lo][len_hi][args...]`
//! Response: `[status][cmd_echo][len_lo][len_hi][data...]`
//!
//! Lengths are 16-bit little-endian in both directions. Older host drivers
//! decoded the response length as `len_hi << 2 | len_lo`, which only agrees
//! with the encoder for lengths up to 255; here both sides use
//! `len_hi << 8 | len_lo`.

use crate::error::Error;
use crate::proto::Status;

pub const REQUEST_HEADER_LEN: usize = 3;
pub const RESPONSE_HEADER_LEN: usize = 4;
pub const MAX_ARGS: usize = u16::MAX as usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFrame {
    pub command: u8,
    pub args: Vec<u8>,
}

impl CommandFrame {
    pub fn new(command: u8, args: impl Into<Vec<u8>>) -> Result<Self, Error> {
        let args = args.into();
        if args.len() > MAX_ARGS {
            return Err(Error::PayloadTooLarge(args.len()));
        }
        Ok(Self { command, args })
    }

    pub fn arg_len(&self) -> u16 {
        self.args.len() as u16
    }

    pub fn encode(&self) -> Vec<u8> {
        encode(self.command, &self.args)
    }
}

/// Serialize a request. `args` must not exceed [`MAX_ARGS`]; use
/// [`CommandFrame::new`] when the length is not already known to fit.
pub fn encode(command: u8, args: &[u8]) -> Vec<u8> {
    debug_assert!(args.len() <= MAX_ARGS);
    let [lo, hi] = encode_len(args.len() as u16);
    let mut out = Vec::with_capacity(REQUEST_HEADER_LEN + args.len());
    out.push(command);
    out.push(lo);
    out.push(hi);
    out.extend_from_slice(args);
    out
}

pub fn encode_len(len: u16) -> [u8; 2] {
    [(len & 0xFF) as u8, ((len >> 8) & 0xFF) as u8]
}

pub fn decode_len(lo: u8, hi: u8) -> u16 {
    (hi as u16) << 8 | lo as u16
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseHeader {
    pub status: u8,
    pub command: u8,
    pub len: u16,
}

impl ResponseHeader {
    pub fn status(&self) -> Option<Status> {
        Status::from_byte(self.status)
    }
}

pub fn decode_header(status: u8, command: u8, len_lo: u8, len_hi: u8) -> ResponseHeader {
    ResponseHeader {
        status,
        command,
        len: decode_len(len_lo, len_hi),
    }
}

/// A complete response, assembled by the engine one byte at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseFrame {
    pub status: Status,
    pub command: u8,
    pub len_lo: u8,
    pub len_hi: u8,
    pub data: Vec<u8>,
}

impl ResponseFrame {
    pub fn len(&self) -> u16 {
        decode_len(self.len_lo, self.len_hi)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Payload as text. Firmware strings are ASCII; anything else is
    /// replaced rather than rejected.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(RESPONSE_HEADER_LEN + self.data.len());
        out.push(self.status as u8);
        out.push(self.command);
        out.push(self.len_lo);
        out.push(self.len_hi);
        out.extend_from_slice(&self.data);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_length_args_keep_length_bytes() {
        assert_eq!(encode(0x06, &[]), vec![0x06, 0x00, 0x00]);
    }

    #[test]
    fn encode_get_unit_temp() {
        assert_eq!(encode(0x04, b"Temp"), vec![0x04, 0x04, 0x00, b'T', b'e', b'm', b'p']);
    }

    #[test]
    fn header_recovers_command_and_length() {
        for len in [0usize, 1, 7, 63, 64, 255, 256, 1000, 4097, MAX_ARGS] {
            let args = vec![0xA5; len];
            let wire = encode(0x0D, &args);
            assert_eq!(wire.len(), REQUEST_HEADER_LEN + len);
            let h = decode_header(0x53, wire[0], wire[1], wire[2]);
            assert_eq!(h.command, 0x0D);
            assert_eq!(h.len as usize, len, "len {}", len);
            assert_eq!(h.status(), Some(Status::Success));
        }
    }

    #[test]
    fn high_byte_is_a_full_byte_shift() {
        // 0x0140 would decode as 0x44 under the old `<< 2` rule.
        assert_eq!(decode_len(0x40, 0x01), 0x0140);
        assert_eq!(encode_len(0x0140), [0x40, 0x01]);
    }

    #[test]
    fn oversized_frame_is_rejected() {
        let err = CommandFrame::new(0x00, vec![0u8; MAX_ARGS + 1]).unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge(n) if n == MAX_ARGS + 1));
        let ok = CommandFrame::new(0x00, b"Humi".to_vec()).unwrap();
        assert_eq!(ok.arg_len(), 4);
        assert_eq!(ok.encode(), vec![0x00, 0x04, 0x00, b'H', b'u', b'm', b'i']);
    }

    #[test]
    fn response_text_and_wire_form() {
        let r = ResponseFrame {
            status: Status::Success,
            command: 0x04,
            len_lo: 1,
            len_hi: 0,
            data: vec![0x20],
        };
        assert_eq!(r.len(), 1);
        assert_eq!(r.text(), " ");
        assert_eq!(r.encode(), vec![0x53, 0x04, 0x01, 0x00, 0x20]);
    }
}
