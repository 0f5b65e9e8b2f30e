use std::future;
use std::pin::Pin;
use std::time::Duration;
use tokio::time::{self, Instant, Sleep};

/// Single-slot debounce timer bound to one session
///
/// The first fragment that arrives while idle arms the timer; later fragments
/// ride the same timer. Arm and cancel are the only ways to change it.
pub struct BatchScheduler {
    delay: Duration,
    timer: Option<Pin<Box<Sleep>>>,
}

impl BatchScheduler {
    pub fn new(delay: Duration) -> Self {
        Self { delay, timer: None }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }

    /// Arm unless already armed or a batch is in flight
    ///
    /// Returns whether this call armed the timer.
    pub fn on_fragment_arrived(&mut self, in_flight: bool) -> bool {
        if self.timer.is_some() || in_flight {
            return false;
        }
        self.arm();
        true
    }

    /// Re-arm after a batch completed if fragments arrived while it ran
    pub fn rearm_after_batch(&mut self, pending_non_empty: bool) -> bool {
        if pending_non_empty && self.timer.is_none() {
            self.arm();
            return true;
        }
        false
    }

    pub fn cancel(&mut self) {
        self.timer = None;
    }

    /// Resolve when the armed timer fires, disarming it
    ///
    /// Never resolves while disarmed, which makes it safe to use as a
    /// `tokio::select!` branch unconditionally.
    pub async fn expired(&mut self) {
        match self.timer.as_mut() {
            Some(timer) => {
                timer.await;
                self.timer = None;
            }
            None => future::pending::<()>().await,
        }
    }

    fn arm(&mut self) {
        self.timer = Some(Box::pin(time::sleep_until(Instant::now() + self.delay)));
    }
}
