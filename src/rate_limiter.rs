use std::time::Duration;

use tracing::debug;

use crate::config::PacingConfig;

/// Blocks the calling thread; swapped out in tests
pub trait Sleeper {
    fn sleep(&mut self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Fixed-size batch pacing.
///
/// Request `n` (1-based, counted from the start of the run) is preceded by a
/// pause whenever `n` is a multiple of the batch size, so with the default of
/// 50 requests 1..=49 go out immediately and request 50 waits.
#[derive(Debug)]
pub struct Pacer<S: Sleeper> {
    batch_size: u64,
    pause: Duration,
    issued: u64,
    sleeper: S,
}

impl<S: Sleeper> Pacer<S> {
    pub fn new(batch_size: u64, pause: Duration, sleeper: S) -> Self {
        Self {
            batch_size: batch_size.max(1),
            pause,
            issued: 0,
            sleeper,
        }
    }

    pub fn from_config(config: &PacingConfig, sleeper: S) -> Self {
        Self::new(config.batch_size, config.pause(), sleeper)
    }

    /// Call right before each outbound request. Returns whether it paused.
    pub fn before_request(&mut self) -> bool {
        self.issued += 1;
        if self.issued % self.batch_size == 0 {
            debug!(
                request = self.issued,
                pause_ms = self.pause.as_millis() as u64,
                "Pausing for rate limit"
            );
            self.sleeper.sleep(self.pause);
            return true;
        }
        false
    }

    /// Requests issued so far
    pub fn issued(&self) -> u64 {
        self.issued
    }

    pub fn sleeper(&self) -> &S {
        &self.sleeper
    }
}
