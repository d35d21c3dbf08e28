//! Host/device clock-drift estimation.
//!
//! Every accepted result contributes a `(host_ms, device_ticks)` pair. Once
//! five pairs are held, the first and last are compared and the ratio of the
//! elapsed host time to elapsed device time becomes the scale factor applied
//! to distances, provided it is plausible.

use crate::constants::{CLOCK_SYNC_WINDOW, DEVICE_TICK_MS, SCALE_FACTOR_MAX, SCALE_FACTOR_MIN};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct ClockSync {
    host_ms: [u32; CLOCK_SYNC_WINDOW],
    device_ticks: [u32; CLOCK_SYNC_WINDOW],
    len: usize,
    scale_factor: f64,
}

impl Default for ClockSync {
    fn default() -> Self {
        Self::new()
    }
}

impl ClockSync {
    pub fn new() -> Self {
        Self {
            host_ms: [0; CLOCK_SYNC_WINDOW],
            device_ticks: [0; CLOCK_SYNC_WINDOW],
            len: 0,
            scale_factor: 1.0,
        }
    }

    /// Number of samples currently held
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Record a sample. Returns the ratio if this sample produced an
    /// accepted scale-factor update.
    pub fn push(&mut self, host_ms: u32, device_ticks: u32) -> Option<f64> {
        let last = CLOCK_SYNC_WINDOW - 1;
        if self.len < last {
            self.host_ms[self.len] = host_ms;
            self.device_ticks[self.len] = device_ticks;
            self.len += 1;
            return None;
        }

        self.host_ms[last] = host_ms;
        self.device_ticks[last] = device_ticks;
        let accepted = self.evaluate();

        self.host_ms.copy_within(1.., 0);
        self.device_ticks.copy_within(1.., 0);
        self.len = last;
        accepted
    }

    fn evaluate(&mut self) -> Option<f64> {
        let last = CLOCK_SYNC_WINDOW - 1;
        let (host_first, host_last) = (self.host_ms[0], self.host_ms[last]);
        let (dev_first, dev_last) = (self.device_ticks[0], self.device_ticks[last]);

        if dev_last <= dev_first || host_last < host_first {
            debug!(host_first, host_last, dev_first, dev_last, "Clock samples not monotonic, keeping scale factor");
            return None;
        }

        let host_delta = f64::from(host_last - host_first) * 10.0;
        let device_delta = f64::from(dev_last - dev_first) * DEVICE_TICK_MS * 10.0;
        let ratio = host_delta / device_delta;

        if (SCALE_FACTOR_MIN..=SCALE_FACTOR_MAX).contains(&ratio) {
            debug!(ratio, previous = self.scale_factor, "Scale factor updated");
            self.scale_factor = ratio;
            Some(ratio)
        } else {
            warn!(ratio, kept = self.scale_factor, "Clock ratio out of bounds, rejected");
            None
        }
    }

    /// Forget every sample and return to a scale factor of 1.0
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
