//! Frame clock for driving [`Swarm::update`](crate::Swarm::update).
//!
//! The swarm takes elapsed time in milliseconds and frame delta in seconds.
//! [`FrameClock`] produces both from `std::time::Instant`, with pause and
//! time scale for hosts that slow the game down.
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//! loop {
//!     let tick = clock.tick();
//!     swarm.update(x, y, tick.time_ms, tick.dt, combo);
//! }
//! ```

use std::time::{Duration, Instant};

/// Timing values for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Tick {
    /// Scaled milliseconds since the clock started, excluding pauses.
    pub time_ms: f64,
    /// Scaled seconds since the previous tick.
    pub dt: f32,
    /// Frames ticked so far, including this one.
    pub frame: u64,
}

/// Accumulating frame clock.
///
/// Elapsed time is the sum of scaled deltas, so changing the time scale or
/// pausing never makes elapsed time jump.
#[derive(Debug)]
pub struct FrameClock {
    last_frame: Instant,
    elapsed_ms: f64,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
    fixed_delta: Option<f32>,
    time_scale: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            elapsed_ms: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
        }
    }

    /// Advance the clock. Call once per frame.
    pub fn tick(&mut self) -> Tick {
        let now = Instant::now();
        let raw_delta = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        if self.paused {
            self.delta_secs = 0.0;
            return self.current();
        }

        self.delta_secs = self.fixed_delta.unwrap_or(raw_delta) * self.time_scale;
        self.elapsed_ms += self.delta_secs as f64 * 1000.0;
        self.frame_count += 1;

        let fps_elapsed = now.duration_since(self.fps_update_time);
        if fps_elapsed >= self.fps_update_interval {
            let frames_since = self.frame_count - self.fps_frame_count;
            self.fps = frames_since as f32 / fps_elapsed.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        self.current()
    }

    /// Values from the most recent tick.
    pub fn current(&self) -> Tick {
        Tick {
            time_ms: self.elapsed_ms,
            dt: self.delta_secs,
            frame: self.frame_count,
        }
    }

    #[inline]
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed_ms
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Use a constant delta instead of wall-clock time. `None` restores
    /// real timing.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta;
    }

    /// Negative scales clamp to zero.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}
