//! Motion smoother: bounded fingertip history plus an exponentially
//! weighted velocity estimate that suppresses frame-to-frame jitter.

use std::collections::VecDeque;

use crate::config::EmaPolicy;

pub struct MotionSmoother {
    window: usize,
    alpha: f32,
    policy: EmaPolicy,
    history: VecDeque<(f32, f32)>,
    ema_dx: f32,
    ema_dy: f32,
}

impl MotionSmoother {
    pub fn new(window: usize, alpha: f32, policy: EmaPolicy) -> Self {
        Self {
            window: window.max(1),
            alpha,
            policy,
            history: VecDeque::with_capacity(window.max(1)),
            ema_dx: 0.0,
            ema_dy: 0.0,
        }
    }

    /// Push a fingertip sample and return the updated velocity estimate.
    ///
    /// The raw displacement spans the retained window (oldest to newest,
    /// zero with fewer than two samples) and is blended into the EMA pair.
    pub fn update(&mut self, sample: (f32, f32)) -> (f32, f32) {
        self.history.push_back(sample);
        while self.history.len() > self.window {
            self.history.pop_front();
        }

        let (dx, dy) = match (self.history.front(), self.history.back()) {
            (Some(oldest), Some(newest)) if self.history.len() >= 2 => {
                (newest.0 - oldest.0, newest.1 - oldest.1)
            }
            _ => (0.0, 0.0),
        };

        self.ema_dx = self.alpha * dx + (1.0 - self.alpha) * self.ema_dx;
        self.ema_dy = self.alpha * dy + (1.0 - self.alpha) * self.ema_dy;
        (self.ema_dx, self.ema_dy)
    }

    /// Hand lost: discard the windowed samples. Whether the EMA estimate
    /// survives is the configured policy.
    pub fn reset(&mut self) {
        self.history.clear();
        if self.policy == EmaPolicy::Reset {
            self.ema_dx = 0.0;
            self.ema_dy = 0.0;
        }
    }

    #[allow(dead_code)]
    pub fn velocity(&self) -> (f32, f32) {
        (self.ema_dx, self.ema_dy)
    }
}
