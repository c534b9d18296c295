use std::{cmp::max, time::Duration};

/// Shortens the tick interval by a fixed step per captured food, so that the
/// floor is reached at three quarters of the winning score.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DifficultyRamp {
    start: Duration,
    min: Duration,
    decrement: Duration,
}

impl DifficultyRamp {
    pub fn new(start: Duration, min: Duration, win_score: u32) -> Self {
        let min = min.min(start);
        let steps = max(1, 3 * win_score / 4);
        let decrement = (start - min) / steps;
        DifficultyRamp { start, min, decrement }
    }

    pub fn start(&self) -> Duration {
        self.start
    }

    pub fn step(&self, current: Duration) -> Duration {
        current.saturating_sub(self.decrement).clamp(self.min, self.start)
    }
}
