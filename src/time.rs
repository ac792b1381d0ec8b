//! The animation clock.
//!
//! Phase progress is measured in milliseconds of animation time. [`Clock`]
//! turns wall-clock time into that: it can be paused (time stops, so phases
//! stop advancing), and it counts frames for the FPS readout.
//!
//! # Example
//!
//! ```ignore
//! use clusterglow::time::Clock;
//!
//! let mut clock = Clock::new();
//!
//! // Once per frame:
//! let now = clock.tick();
//! animation.frame(now, Some(&mut canvas));
//!
//! println!("FPS: {:.1}", clock.fps());
//! ```

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Clock {
    /// Wall-clock instant of the last tick.
    last_tick: Instant,
    /// Animation milliseconds accumulated so far.
    now_ms: f64,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
}

impl Clock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_tick: now,
            now_ms: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
        }
    }

    /// Advance to the current wall-clock time. Call once per frame.
    ///
    /// Returns the animation time in milliseconds.
    pub fn tick(&mut self) -> f64 {
        self.tick_at(Instant::now())
    }

    /// Advance as if the frame happened at `instant`.
    pub fn tick_at(&mut self, instant: Instant) -> f64 {
        let wall = instant.saturating_duration_since(self.last_tick);
        self.last_tick = instant;

        if !self.paused {
            self.now_ms += wall.as_secs_f64() * 1000.0;
        }

        self.frame_count += 1;
        let since = instant.saturating_duration_since(self.fps_update_time);
        if since >= self.fps_update_interval {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / since.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = instant;
        }

        self.now_ms
    }

    /// Animation time in milliseconds as of the last tick.
    #[inline]
    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Stop animation time. Frames still count.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_new() {
        let clock = Clock::new();
        assert_eq!(clock.frame(), 0);
        assert_eq!(clock.now_ms(), 0.0);
        assert!(!clock.is_paused());
    }

    #[test]
    fn test_tick_accumulates_milliseconds() {
        let mut clock = Clock::new();
        let start = clock.last_tick;
        clock.tick_at(start + Duration::from_millis(16));
        let now = clock.tick_at(start + Duration::from_millis(40));
        assert!((now - 40.0).abs() < 1e-6);
        assert_eq!(clock.frame(), 2);
    }

    #[test]
    fn test_pause_freezes_time() {
        let mut clock = Clock::new();
        let start = clock.last_tick;
        clock.tick_at(start + Duration::from_millis(100));

        clock.pause();
        let paused = clock.tick_at(start + Duration::from_millis(5000));
        assert!((paused - 100.0).abs() < 1e-6);

        clock.resume();
        let resumed = clock.tick_at(start + Duration::from_millis(5010));
        assert!((resumed - 110.0).abs() < 1e-6);
    }

    #[test]
    fn test_fps_measured() {
        let mut clock = Clock::new();
        let start = clock.last_tick;
        for i in 1..=30 {
            clock.tick_at(start + Duration::from_millis(i * 20));
        }
        // 25 frames in the first 500ms window.
        assert!((clock.fps() - 50.0).abs() < 0.5);
    }

    #[test]
    fn test_instant_in_the_past_does_not_rewind() {
        let mut clock = Clock::new();
        let start = clock.last_tick;
        clock.tick_at(start + Duration::from_millis(100));
        let now = clock.tick_at(start);
        assert!((now - 100.0).abs() < 1e-6);
    }
}
