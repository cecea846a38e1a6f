use std::time::Duration;

/// Transport state of the timeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum PlaybackState {
    /// Not playing.
    #[default]
    Stopped,
    /// Advancing on every tick.
    Playing,
    /// Holding the current frame.
    Paused,
}

/// Direction of travel during playback.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    /// Increasing frame indices.
    #[default]
    Forward,
    /// Decreasing frame indices (ping-pong return leg).
    Backward,
}

/// End-of-range behaviour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopMode {
    /// Wrap to frame 0 after the last frame.
    pub looping: bool,
    /// Reverse direction at either end; takes precedence over `looping`.
    pub ping_pong: bool,
}

/// Result of advancing one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Step {
    /// Frame to show next.
    pub frame: u32,
    /// Direction for the following tick.
    pub direction: Direction,
    /// Playback reached the end and must stop.
    pub stop: bool,
}

/// Advance `current` by one frame in `direction`.
pub fn step(current: u32, frame_count: u32, direction: Direction, mode: LoopMode) -> Step {
    let last = frame_count.saturating_sub(1);
    let current = current.min(last);
    let go = |frame, direction| Step {
        frame,
        direction,
        stop: false,
    };
    match direction {
        Direction::Forward if current < last => go(current + 1, Direction::Forward),
        Direction::Backward if current > 0 => go(current - 1, Direction::Backward),
        Direction::Forward => {
            if mode.ping_pong {
                go(last.saturating_sub(1), Direction::Backward)
            } else if mode.looping {
                go(0, Direction::Forward)
            } else {
                Step {
                    frame: last,
                    direction,
                    stop: true,
                }
            }
        }
        Direction::Backward => {
            if mode.ping_pong {
                go(1.min(last), Direction::Forward)
            } else if mode.looping {
                go(last, Direction::Backward)
            } else {
                Step {
                    frame: 0,
                    direction,
                    stop: true,
                }
            }
        }
    }
}

/// Scheduler period for `fps`: `1000 / fps` milliseconds.
pub fn tick_interval(fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(fps.max(1)))
}

/// Turns elapsed wall time into whole ticks.
///
/// Remaining time carries over to the next call; [`Self::reset`] drops it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PlaybackClock {
    pending: Duration,
}

impl PlaybackClock {
    /// Add `elapsed` and return how many ticks are due at `fps`.
    pub fn advance(&mut self, elapsed: Duration, fps: u32) -> u32 {
        let interval = tick_interval(fps);
        self.pending += elapsed;
        let mut ticks = 0u32;
        while self.pending >= interval {
            self.pending -= interval;
            ticks = ticks.saturating_add(1);
        }
        ticks
    }

    /// Forget accumulated time.
    pub fn reset(&mut self) {
        self.pending = Duration::ZERO;
    }

    /// Time accumulated toward the next tick.
    pub fn pending(&self) -> Duration {
        self.pending
    }
}

#[cfg(test)]
#[path = "../../tests/unit/state/playback.rs"]
mod tests;
