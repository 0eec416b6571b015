//! One-command-at-a-time request/response engine for the SCI protocol.
//!
//! An exchange writes a request frame and then walks the response through
//! four states, all bounded by one wall-clock deadline fixed when the
//! exchange starts:
//!
//! 1. await status: `0xFF` idle and unknown bytes are skipped, `0xD3` means
//!    the peripheral reset its buffers and is acknowledged with a
//!    zero-argument `RESET_DATA`, `0x53`/`0x63` open the frame;
//! 2. await command echo: a mismatch is a desync and ends the exchange;
//! 3. await the two length bytes;
//! 4. await exactly `len` payload bytes.

use std::time::{Duration, Instant};

use tracing::{debug, trace, warn};

use crate::channel::ByteChannel;
use crate::error::{Error, Result};
use crate::frame::{self, CommandFrame, ResponseFrame};
use crate::proto::{Command, ErrorCode, Status};
use crate::stats::LinkStats;

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Receive window for a response, before any per-command allowance.
    pub response_timeout: Duration,
    /// Upper bound on a single read, and the pause after an idle byte.
    pub poll_interval: Duration,
    /// Pause after acknowledging a reset notification.
    pub reset_settle: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(4),
            poll_interval: Duration::from_millis(100),
            reset_settle: Duration::from_millis(300),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Deadline {
    at: Instant,
    budget: Duration,
}

impl Deadline {
    fn after(budget: Duration) -> Self {
        Self {
            at: Instant::now() + budget,
            budget,
        }
    }

    /// Time left, or `None` once the deadline has passed.
    fn remaining(&self) -> Option<Duration> {
        let left = self.at.saturating_duration_since(Instant::now());
        if left.is_zero() { None } else { Some(left) }
    }
}

pub struct Engine<C> {
    channel: C,
    config: EngineConfig,
    stats: LinkStats,
}

impl<C: ByteChannel> Engine<C> {
    pub fn new(channel: C) -> Self {
        Self::with_config(channel, EngineConfig::default())
    }

    pub fn with_config(channel: C, config: EngineConfig) -> Self {
        Self {
            channel,
            config,
            stats: LinkStats::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stats(&self) -> &LinkStats {
        &self.stats
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Run one exchange. A response with status FAILED is still returned
    /// as `Ok`; use [`Engine::request`] to turn it into an error.
    pub fn exchange(&mut self, command: Command, args: &[u8]) -> Result<ResponseFrame> {
        let budget = self.config.response_timeout + command.processing_time();
        self.exchange_within(command.code(), args, budget)
    }

    /// Exchange for a raw command byte. Codes the firmware does not know
    /// are refused before anything is written.
    pub fn exchange_raw(&mut self, code: u8, args: &[u8]) -> Result<ResponseFrame> {
        let command = Command::from_code(code).ok_or(Error::CommandInvalid(code))?;
        self.exchange(command, args)
    }

    /// Exchange that only succeeds on status SUCCESS. On FAILED the first
    /// payload byte carries the peripheral's error code.
    pub fn request(&mut self, command: Command, args: &[u8]) -> Result<ResponseFrame> {
        let resp = self.exchange(command, args)?;
        match resp.status {
            Status::Success => Ok(resp),
            _ => {
                let code = resp
                    .data
                    .first()
                    .map(|&b| ErrorCode::from_byte(b))
                    .unwrap_or(ErrorCode::PeripheralFault);
                Err(Error::Failed {
                    command: command.code(),
                    code,
                })
            }
        }
    }

    fn exchange_within(&mut self, command: u8, args: &[u8], budget: Duration) -> Result<ResponseFrame> {
        let frame = CommandFrame::new(command, args)?;
        let deadline = Deadline::after(budget);
        self.stats.inc_exchange();
        debug!("exchange cmd=0x{:02X} args={}", command, args.len());

        self.send(&frame.encode());

        let status = self.await_status(&deadline)?;

        let echo = self.read_within(&deadline)?;
        if echo != command {
            self.stats.inc_desync();
            let dropped = self.channel.discard_input().unwrap_or_else(|e| {
                warn!("discard after desync failed: {}", e);
                0
            });
            warn!(
                "response echoes 0x{:02X}, expected 0x{:02X}; dropped {} pending bytes",
                echo, command, dropped
            );
            return Err(Error::ResponsePacket {
                expected: command,
                got: echo,
            });
        }

        let len_lo = self.read_within(&deadline)?;
        let len_hi = self.read_within(&deadline)?;
        let header = frame::decode_header(status as u8, echo, len_lo, len_hi);

        let mut data = Vec::with_capacity(header.len as usize);
        for _ in 0..header.len {
            data.push(self.read_within(&deadline)?);
        }

        match status {
            Status::Success => self.stats.inc_ok(),
            _ => self.stats.inc_failed(),
        }
        debug!("response cmd=0x{:02X} status={:?} len={}", command, status, header.len);
        Ok(ResponseFrame {
            status,
            command: echo,
            len_lo,
            len_hi,
            data,
        })
    }

    fn await_status(&mut self, deadline: &Deadline) -> Result<Status> {
        loop {
            let Some(left) = deadline.remaining() else {
                return Err(self.timed_out(deadline));
            };
            let Some(b) = self.poll_byte(left.min(self.config.poll_interval)) else {
                continue;
            };
            match Status::from_byte(b) {
                Some(s) if s.opens_frame() => return Ok(s),
                Some(Status::Reset) => {
                    warn!("peripheral reset, acknowledging");
                    self.stats.inc_reset();
                    self.send(&frame::encode(Command::ResetData.code(), &[]));
                    sleep_within(self.config.reset_settle, deadline);
                }
                _ => {
                    trace!("skip 0x{:02X}", b);
                    sleep_within(self.config.poll_interval, deadline);
                }
            }
        }
    }

    /// Next byte of a frame already in flight.
    fn read_within(&mut self, deadline: &Deadline) -> Result<u8> {
        loop {
            let Some(left) = deadline.remaining() else {
                return Err(self.timed_out(deadline));
            };
            if let Some(b) = self.poll_byte(left.min(self.config.poll_interval)) {
                return Ok(b);
            }
        }
    }

    /// Single read attempt. Faults are logged and reported as no data.
    fn poll_byte(&mut self, timeout: Duration) -> Option<u8> {
        match self.channel.read_byte(timeout) {
            Ok(Some(b)) => {
                self.stats.inc_rx();
                trace!("rx 0x{:02X}", b);
                Some(b)
            }
            Ok(None) => None,
            Err(e) => {
                self.stats.inc_fault();
                warn!("read: {}", e);
                std::thread::sleep(timeout);
                None
            }
        }
    }

    /// Best-effort write; a failure surfaces later as a timeout.
    fn send(&mut self, bytes: &[u8]) {
        trace!("tx {:02X?}", bytes);
        match self.channel.write(bytes) {
            Ok(()) => self.stats.add_tx(bytes.len()),
            Err(e) => {
                self.stats.inc_fault();
                warn!("write: {}", e);
            }
        }
    }

    fn timed_out(&mut self, deadline: &Deadline) -> Error {
        self.stats.inc_timeout();
        debug!("timed out after {:?}", deadline.budget);
        Error::Timeout(deadline.budget)
    }
}

fn sleep_within(d: Duration, deadline: &Deadline) {
    if let Some(left) = deadline.remaining() {
        std::thread::sleep(d.min(left));
    }
}
