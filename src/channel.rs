use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
    #[error("channel closed")]
    Closed,
}

/// Duplex byte transport underneath the protocol engine.
///
/// `read_byte` returns `Ok(None)` when nothing arrived within `timeout`;
/// `Err` is reserved for hard transport faults. The engine owns the
/// policy for both.
pub trait ByteChannel {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ChannelError>;

    fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>, ChannelError>;

    /// Drop whatever is pending on the receive side.
    fn discard_input(&mut self) -> Result<usize, ChannelError> {
        let mut n = 0;
        while self.read_byte(Duration::ZERO)?.is_some() {
            n += 1;
        }
        Ok(n)
    }
}

impl<C: ByteChannel + ?Sized> ByteChannel for &mut C {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        (**self).write(bytes)
    }
    fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>, ChannelError> {
        (**self).read_byte(timeout)
    }
    fn discard_input(&mut self) -> Result<usize, ChannelError> {
        (**self).discard_input()
    }
}

impl<C: ByteChannel + ?Sized> ByteChannel for Box<C> {
    fn write(&mut self, bytes: &[u8]) -> Result<(), ChannelError> {
        (**self).write(bytes)
    }
    fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>, ChannelError> {
        (**self).read_byte(timeout)
    }
    fn discard_input(&mut self) -> Result<usize, ChannelError> {
        (**self).discard_input()
    }
}
