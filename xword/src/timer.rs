use std::time::{Duration, Instant};

/// Where a session reads the current time from.
pub trait Clock {
  fn now(&self) -> Instant;
}

/// The system's monotonic clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> Instant {
    Instant::now()
  }
}

/// A stopwatch for solving time. While running, time accumulates from the moment it
/// was started; stopping folds that interval into the stored total.
///
/// Reading the elapsed time never changes the timer, so it can be polled as often
/// as a display wants.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Timer {
  /// When the current interval began. `None` while stopped.
  started: Option<Instant>,
  /// Time accumulated by intervals that have ended.
  elapsed: Duration,
}

impl Timer {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_running(&self) -> bool {
    self.started.is_some()
  }

  /// Starts a new interval at `now`. Does nothing if already running.
  pub fn start(&mut self, now: Instant) {
    if self.started.is_none() {
      self.started = Some(now);
    }
  }

  /// Ends the current interval at `now`. Does nothing if already stopped.
  pub fn stop(&mut self, now: Instant) {
    if let Some(started) = self.started.take() {
      self.elapsed += now.saturating_duration_since(started);
    }
  }

  /// Total solving time as of `now`, including the running interval if any.
  pub fn elapsed(&self, now: Instant) -> Duration {
    match self.started {
      Some(started) => self.elapsed + now.saturating_duration_since(started),
      None => self.elapsed,
    }
  }

  /// Time accumulated by finished intervals only.
  pub fn accumulated(&self) -> Duration {
    self.elapsed
  }

  /// Replaces the accumulated time, e.g. with the time from a saved session.
  pub fn set_elapsed(&mut self, elapsed: Duration) {
    self.elapsed = elapsed;
  }

  /// Zeroes the timer. A running timer keeps running, counting from `now`.
  pub fn reset(&mut self, now: Instant) {
    self.elapsed = Duration::ZERO;
    if self.started.is_some() {
      self.started = Some(now);
    }
  }
}

/// Formats a solving time as `m:ss`, or `h:mm:ss` once it reaches an hour.
pub fn format_elapsed(elapsed: Duration) -> String {
  let secs = elapsed.as_secs();
  let (hours, minutes, seconds) = (secs / 3600, secs % 3600 / 60, secs % 60);
  if hours > 0 {
    format!("{hours}:{minutes:02}:{seconds:02}")
  } else {
    format!("{minutes}:{seconds:02}")
  }
}
