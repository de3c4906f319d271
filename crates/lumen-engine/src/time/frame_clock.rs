use std::time::{Duration, Instant};

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Time elapsed since the previous tick, in seconds (clamped).
    pub dt: f32,

    /// Time since the clock started (unclamped).
    pub elapsed: Duration,

    /// Monotonic timestamp taken at the tick.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// Frame clock producing `FrameTime` snapshots.
///
/// Delta time is clamped so a stalled or minimized window does not report a
/// huge step; `elapsed` is not, so schedules keyed on wall time stay exact.
#[derive(Debug, Clone)]
pub struct FrameClock {
    start: Instant,
    last: Instant,
    frame_index: u64,
    dt_min: Duration,
    dt_max: Duration,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::with_clamps(Duration::from_micros(100), Duration::from_millis(250))
    }

    /// Creates a clock with custom delta-time clamps.
    pub fn with_clamps(dt_min: Duration, dt_max: Duration) -> Self {
        debug_assert!(dt_min <= dt_max);
        let now = Instant::now();
        Self {
            start: now,
            last: now,
            frame_index: 0,
            dt_min,
            dt_max,
        }
    }

    /// Advances the clock and returns a new `FrameTime`.
    pub fn tick(&mut self) -> FrameTime {
        self.tick_at(Instant::now())
    }

    fn tick_at(&mut self, now: Instant) -> FrameTime {
        let dt = now
            .saturating_duration_since(self.last)
            .clamp(self.dt_min, self.dt_max);
        self.last = now;

        let ft = FrameTime {
            dt: dt.as_secs_f32(),
            elapsed: now.saturating_duration_since(self.start),
            now,
            frame_index: self.frame_index,
        };

        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dt_is_clamped_but_elapsed_is_not() {
        let mut clock = FrameClock::with_clamps(Duration::from_millis(1), Duration::from_millis(100));
        let start = clock.start;

        let first = clock.tick_at(start + Duration::from_secs(3));
        assert_eq!(first.frame_index, 0);
        assert!((first.dt - 0.1).abs() < 1e-6);
        assert_eq!(first.elapsed, Duration::from_secs(3));

        let second = clock.tick_at(start + Duration::from_secs(3));
        assert_eq!(second.frame_index, 1);
        assert!((second.dt - 0.001).abs() < 1e-6);
    }
}
