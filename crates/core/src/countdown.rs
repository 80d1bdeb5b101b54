use serde::{Deserialize, Serialize};

/// Countdown for a timed session, with pause bookkeeping.
///
/// Invariant: `0 <= remaining <= total`. Time only drains while not paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClock {
    total_seconds: u32,
    remaining_seconds: u32,
    paused: bool,
    pause_count: u32,
}

impl SessionClock {
    #[must_use]
    pub fn new(total_seconds: u32) -> Self {
        Self {
            total_seconds,
            remaining_seconds: total_seconds,
            paused: false,
            pause_count: 0,
        }
    }

    #[must_use]
    pub fn total_seconds(&self) -> u32 {
        self.total_seconds
    }

    #[must_use]
    pub fn remaining_seconds(&self) -> u32 {
        self.remaining_seconds
    }

    #[must_use]
    pub fn elapsed_seconds(&self) -> u32 {
        self.total_seconds - self.remaining_seconds
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn pause_count(&self) -> u32 {
        self.pause_count
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining_seconds == 0
    }

    /// Drain up to `delta_seconds`, flooring at zero.
    ///
    /// Returns the number of seconds actually consumed; always 0 while paused.
    pub fn advance(&mut self, delta_seconds: u32) -> u32 {
        if self.paused {
            return 0;
        }
        let consumed = delta_seconds.min(self.remaining_seconds);
        self.remaining_seconds -= consumed;
        consumed
    }

    /// Flip the paused flag and return the new value.
    ///
    /// Entering the paused state bumps `pause_count`; resuming does not.
    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        if self.paused {
            self.pause_count = self.pause_count.saturating_add(1);
        }
        self.paused
    }
}

/// Render seconds as `m:ss`; minutes are not wrapped into hours.
#[must_use]
pub fn format_countdown(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_floors_at_zero() {
        let mut clock = SessionClock::new(5);
        assert_eq!(clock.advance(3), 3);
        assert_eq!(clock.advance(10), 2);
        assert_eq!(clock.remaining_seconds(), 0);
        assert!(clock.is_expired());
        assert_eq!(clock.elapsed_seconds(), 5);
    }

    #[test]
    fn paused_clock_does_not_drain() {
        let mut clock = SessionClock::new(100);
        clock.advance(10);
        assert!(clock.toggle_pause());
        for _ in 0..10 {
            assert_eq!(clock.advance(1), 0);
        }
        assert_eq!(clock.remaining_seconds(), 90);
        assert!(!clock.toggle_pause());
        clock.advance(1);
        assert_eq!(clock.remaining_seconds(), 89);
    }

    #[test]
    fn pause_count_only_counts_entries_into_pause() {
        let mut clock = SessionClock::new(60);
        for _ in 0..3 {
            clock.toggle_pause();
            clock.toggle_pause();
        }
        assert_eq!(clock.pause_count(), 3);
        clock.toggle_pause();
        assert_eq!(clock.pause_count(), 4);
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_countdown(4500), "75:00");
        assert_eq!(format_countdown(61), "1:01");
        assert_eq!(format_countdown(9), "0:09");
    }
}
