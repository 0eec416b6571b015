use std::time::{Duration, Instant};

use tracing::debug;

/// Link counters kept by the engine across exchanges.
#[derive(Debug, Clone)]
pub struct LinkStats {
    pub exchanges: u64,
    pub ok: u64,
    pub failed: u64,
    pub timeouts: u64,
    pub desyncs: u64,
    pub resets: u64,
    pub channel_faults: u64,
    pub bytes_tx: u64,
    pub bytes_rx: u64,
    t0: Instant,
}

impl Default for LinkStats {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkStats {
    pub fn new() -> Self {
        Self {
            exchanges: 0,
            ok: 0,
            failed: 0,
            timeouts: 0,
            desyncs: 0,
            resets: 0,
            channel_faults: 0,
            bytes_tx: 0,
            bytes_rx: 0,
            t0: Instant::now(),
        }
    }
    pub fn add_tx(&mut self, n: usize) {
        self.bytes_tx += n as u64;
    }
    pub fn inc_rx(&mut self) {
        self.bytes_rx += 1;
    }
    pub fn inc_exchange(&mut self) {
        self.exchanges += 1;
    }
    pub fn inc_ok(&mut self) {
        self.ok += 1;
    }
    pub fn inc_failed(&mut self) {
        self.failed += 1;
    }
    pub fn inc_timeout(&mut self) {
        self.timeouts += 1;
    }
    pub fn inc_desync(&mut self) {
        self.desyncs += 1;
    }
    pub fn inc_reset(&mut self) {
        self.resets += 1;
    }
    pub fn inc_fault(&mut self) {
        self.channel_faults += 1;
    }

    pub fn uptime(&self) -> Duration {
        self.t0.elapsed()
    }

    pub fn log(&self) {
        debug!(
            exchanges = self.exchanges,
            ok = self.ok,
            failed = self.failed,
            timeouts = self.timeouts,
            desyncs = self.desyncs,
            resets = self.resets,
            faults = self.channel_faults,
            tx = self.bytes_tx,
            rx = self.bytes_rx,
            "link stats over {:.1}s",
            self.uptime().as_secs_f64()
        );
    }
}
