use std::time::Duration;

use crate::config::ScheduleConfig;

/// Decides which ticks draw a frame.
///
/// Nothing renders before `initial_delay`. After that, a one-shot schedule
/// renders again only when invalidated (resize, texture arrival); a repeating
/// one renders every tick.
#[derive(Debug, Clone)]
pub struct RenderSchedule {
    initial_delay: Duration,
    repeat: bool,
    dirty: bool,
}

impl RenderSchedule {
    pub fn new(config: &ScheduleConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            repeat: config.repeat,
            dirty: true,
        }
    }

    pub fn should_render(&self, elapsed: Duration) -> bool {
        elapsed >= self.initial_delay && (self.repeat || self.dirty)
    }

    pub fn mark_rendered(&mut self) {
        self.dirty = false;
    }

    pub fn invalidate(&mut self) {
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schedule(delay_ms: u64, repeat: bool) -> RenderSchedule {
        RenderSchedule::new(&ScheduleConfig {
            initial_delay_ms: delay_ms,
            repeat,
        })
    }

    #[test]
    fn waits_for_initial_delay() {
        let s = schedule(2000, false);
        assert!(!s.should_render(Duration::from_millis(1999)));
        assert!(s.should_render(Duration::from_millis(2000)));
    }

    #[test]
    fn one_shot_renders_once_until_invalidated() {
        let mut s = schedule(0, false);
        assert!(s.should_render(Duration::ZERO));
        s.mark_rendered();
        assert!(!s.should_render(Duration::from_secs(10)));

        s.invalidate();
        assert!(s.should_render(Duration::from_secs(10)));
    }

    #[test]
    fn repeating_renders_every_tick() {
        let mut s = schedule(5, true);
        assert!(!s.should_render(Duration::from_millis(1)));
        s.mark_rendered();
        assert!(s.should_render(Duration::from_millis(5)));
        s.mark_rendered();
        assert!(s.should_render(Duration::from_millis(6)));
    }

    #[test]
    fn invalidation_before_delay_does_not_render_early() {
        let mut s = schedule(100, false);
        s.invalidate();
        assert!(!s.should_render(Duration::from_millis(50)));
    }
}
