use std::time::{Duration, Instant};

pub fn debug_time<R>(f: impl FnOnce() -> R) -> (Duration, R) {
    let start = Instant::now();
    let result = f();
    (start.elapsed(), result)
}

/// Keeps a running average of frame times for the title bar and trace logs.
#[derive(Debug, Clone)]
pub struct FrameTimer {
    last: Instant,
    average: f32,
}

impl Default for FrameTimer {
    fn default() -> Self {
        Self {
            last: Instant::now(),
            average: 0.0,
        }
    }
}

impl FrameTimer {
    /// Seconds since the previous tick.
    pub fn tick(&mut self) -> f32 {
        let now = Instant::now();
        let delta = now.duration_since(self.last).as_secs_f32();
        self.last = now;
        self.average = if self.average == 0.0 {
            delta
        } else {
            self.average * 0.9 + delta * 0.1
        };
        delta
    }

    pub fn fps(&self) -> f32 {
        if self.average > 0.0 {
            1.0 / self.average
        } else {
            0.0
        }
    }
}
