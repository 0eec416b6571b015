use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::debug;

use crate::channel::{ByteChannel, ChannelError};

pub const DEFAULT_DEV: &str = "/dev/ttyAMA0";
pub const DEFAULT_BAUD: u32 = 115_200;

/// Open the station's UART at 8N1.
pub fn open_port(dev: &str, baud: u32, rtscts: bool) -> Result<Box<dyn SerialPort>, ChannelError> {
    let builder = serialport::new(dev, baud)
        .timeout(Duration::from_millis(100))
        .data_bits(DataBits::Eight)
        .parity(Parity::None)
        .stop_bits(StopBits::One)
        .flow_control(if rtscts {
            FlowControl::Hardware
        } else {
            FlowControl::None
        });

    let port = builder.open().map_err(io::Error::from)?;
    debug!("opened {} at {} baud", dev, baud);
    Ok(port)
}

/// [`ByteChannel`] over a serial port.
pub struct SerialChannel {
    port: Box<dyn SerialPort>,
    timeout: Duration,
}

impl SerialChannel {
    pub fn new(port: Box<dyn SerialPort>) -> Self {
        let timeout = port.timeout();
        Self { port, timeout }
    }

    pub fn open(dev: &str, baud: u32, rtscts: bool) -> Result<Self, ChannelError> {
        open_port(dev, baud, rtscts).map(Self::new)
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), ChannelError> {
        if timeout != self.timeout {
            self.port.set_timeout(timeout).map_err(io::Error::from)?;
            self.timeout = timeout;
        }
        Ok(())
    }
}

impl ByteChannel for SerialChannel {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>, ChannelError> {
        if timeout.is_zero() && self.port.bytes_to_read().map_err(io::Error::from)? == 0 {
            return Ok(None);
        }
        self.set_timeout(timeout.max(Duration::from_millis(1)))?;
        let mut buf = [0u8; 1];
        match self.port.read(&mut buf) {
            Ok(1) => Ok(Some(buf[0])),
            Ok(_) => Ok(None),
            Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                Ok(None)
            }
            Err(e) if e.kind() == io::ErrorKind::BrokenPipe => Err(ChannelError::Closed),
            Err(e) => Err(e.into()),
        }
    }

    fn discard_input(&mut self) -> Result<usize, ChannelError> {
        let pending = self.port.bytes_to_read().map_err(io::Error::from)? as usize;
        self.port
            .clear(ClearBuffer::Input)
            .map_err(io::Error::from)?;
        Ok(pending)
    }
}
