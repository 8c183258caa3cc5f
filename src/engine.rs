//! Gesture engine: the per-frame decision policy that turns smoothed hand
//! features into debounced intent events.
//!
//! Each gesture family keeps its own state — a shared cooldown clock for the
//! motion gestures (scroll/tab), an independent cooldown for screenshots,
//! and an explicit hold state per hold gesture (fist → copy, open palm →
//! paste). The copy→paste handoff is one-shot: a confirmed copy arms
//! exactly one paste, and the confirmation survives hand loss.

use std::time::{Duration, Instant};

use crate::{
    config::GestureConfig,
    motion::MotionSmoother,
    types::{GestureEvent, HandFeatures},
};

/// Hold progress for one hold-gesture family.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum HoldState {
    Idle,
    Holding(Instant),
}

impl HoldState {
    /// Advance one frame. Returns `true` once the qualifying configuration
    /// has been held continuously for `required`. Any frame without the
    /// configuration drops straight back to `Idle` — no partial credit.
    fn advance(&mut self, engaged: bool, now: Instant, required: Duration) -> bool {
        if !engaged {
            *self = HoldState::Idle;
            return false;
        }
        match *self {
            HoldState::Idle => {
                *self = HoldState::Holding(now);
                false
            }
            HoldState::Holding(since) => now.duration_since(since) >= required,
        }
    }

    fn reset(&mut self) {
        *self = HoldState::Idle;
    }
}

pub struct GestureEngine {
    config: GestureConfig,
    smoother: MotionSmoother,
    fist: HoldState,
    palm: HoldState,
    /// Set by a fired copy, consumed by the next paste.
    copy_pending: bool,
    last_motion: Option<Instant>,
    last_screenshot: Option<Instant>,
}

impl GestureEngine {
    pub fn new(config: GestureConfig) -> Self {
        let smoother = MotionSmoother::new(
            config.smoothing_window,
            config.ema_alpha,
            config.ema_policy,
        );
        Self {
            config,
            smoother,
            fist: HoldState::Idle,
            palm: HoldState::Idle,
            copy_pending: false,
            last_motion: None,
            last_screenshot: None,
        }
    }

    #[allow(dead_code)]
    pub fn copy_pending(&self) -> bool {
        self.copy_pending
    }

    /// Consume one frame's features and emit at most one event.
    ///
    /// Priority order: motion (scroll/tab), copy hold, paste hold,
    /// screenshot pinch. Hold states track the finger configuration every
    /// frame regardless of which family fires, so a motion event cannot
    /// stall an in-progress hold.
    pub fn advance(
        &mut self,
        features: Option<&HandFeatures>,
        now: Instant,
    ) -> Option<GestureEvent> {
        let Some(hand) = features else {
            // Hand lost: drop windowed motion, restart both holds. A
            // pending copy confirmation survives so the user can re-present
            // an open palm later to complete the paste.
            self.smoother.reset();
            self.fist.reset();
            self.palm.reset();
            return None;
        };

        let (vx, vy) = self.smoother.update(hand.index_tip);

        let all_closed = hand.fingers.iter().all(|extended| !extended);
        let all_open = hand.fingers.iter().all(|extended| *extended);
        let fist_ready = self
            .fist
            .advance(all_closed, now, self.config.gesture_hold());
        let palm_ready = self
            .palm
            .advance(all_open, now, self.config.gesture_hold());

        if let Some(event) = self.check_motion(vx, vy, now) {
            self.last_motion = Some(now);
            return Some(event);
        }

        if fist_ready && !self.copy_pending {
            self.copy_pending = true;
            // Re-arming requires the fist to break and re-form.
            self.fist.reset();
            return Some(GestureEvent::Copy);
        }

        if palm_ready && self.copy_pending {
            self.copy_pending = false;
            self.palm.reset();
            return Some(GestureEvent::Paste);
        }

        if self.check_screenshot(hand, now) {
            self.last_screenshot = Some(now);
            return Some(GestureEvent::Screenshot);
        }

        None
    }

    fn check_motion(&self, vx: f32, vy: f32, now: Instant) -> Option<GestureEvent> {
        if let Some(last) = self.last_motion {
            if now.duration_since(last) < self.config.motion_cooldown() {
                return None;
            }
        }

        let (abs_dx, abs_dy) = (vx.abs(), vy.abs());

        // Strict axis dominance: exact ties fire neither.
        if abs_dy > self.config.scroll_threshold && abs_dy > abs_dx {
            return Some(if vy < 0.0 {
                GestureEvent::ScrollUp
            } else {
                GestureEvent::ScrollDown
            });
        }
        if abs_dx > self.config.tab_threshold && abs_dx > abs_dy {
            return Some(if vx > 0.0 {
                GestureEvent::NextTab
            } else {
                GestureEvent::PrevTab
            });
        }
        None
    }

    fn check_screenshot(&self, hand: &HandFeatures, now: Instant) -> bool {
        let [thumb, index, middle, ring, pinky] = hand.fingers;
        if !(thumb && index && !middle && !ring && !pinky) {
            return false;
        }
        if hand.pinch_distance() >= self.config.pinch_threshold {
            return false;
        }
        match self.last_screenshot {
            Some(last) => now.duration_since(last) >= self.config.screenshot_cooldown(),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmaPolicy;

    const FRAME: Duration = Duration::from_millis(33);

    fn engine() -> GestureEngine {
        GestureEngine::new(GestureConfig::default())
    }

    fn features(fingers: [bool; 5], index_tip: (f32, f32), thumb_tip: (f32, f32)) -> HandFeatures {
        HandFeatures {
            fingers,
            index_tip,
            thumb_tip,
        }
    }

    /// Pointing hand drifting by `step` per frame — drives motion without
    /// qualifying for any hold or pinch.
    fn drift(fingers: [bool; 5], start: (f32, f32), step: (f32, f32), frame: u32) -> HandFeatures {
        let tip = (
            start.0 + step.0 * frame as f32,
            start.1 + step.1 * frame as f32,
        );
        // Thumb far away so no pinch can register.
        features(fingers, tip, (tip.0 + 0.5, tip.1))
    }

    /// Run `frames` frames through the engine and collect fired events.
    fn run<F: FnMut(u32) -> Option<HandFeatures>>(
        engine: &mut GestureEngine,
        start: Instant,
        frames: u32,
        mut nth: F,
    ) -> Vec<(u32, GestureEvent)> {
        let mut fired = Vec::new();
        for frame in 0..frames {
            let now = start + FRAME * frame;
            let hand = nth(frame);
            if let Some(event) = engine.advance(hand.as_ref(), now) {
                fired.push((frame, event));
            }
        }
        fired
    }

    const POINTING: [bool; 5] = [false, true, false, false, false];
    const FIST: [bool; 5] = [false; 5];
    const PALM: [bool; 5] = [true; 5];
    const PINCH_POSE: [bool; 5] = [true, true, false, false, false];

    #[test]
    fn sustained_upward_motion_scrolls_once_then_cools_down() {
        let mut engine = engine();
        let start = Instant::now();
        // dy = -0.10 per frame, sustained well past the smoothing window;
        // 0.9 s cooldown spans ~27 frames at 33 ms.
        let fired = run(&mut engine, start, 25, |frame| {
            Some(drift(POINTING, (0.5, 0.9), (0.0, -0.1), frame))
        });
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].1, GestureEvent::ScrollUp);
    }

    #[test]
    fn scroll_fires_again_after_cooldown() {
        let mut engine = engine();
        let start = Instant::now();
        let fired = run(&mut engine, start, 40, |frame| {
            Some(drift(POINTING, (0.5, 2.0), (0.0, -0.05), frame))
        });
        assert!(fired.len() >= 2);
        assert!(fired.iter().all(|(_, event)| *event == GestureEvent::ScrollUp));
        let gap = FRAME * (fired[1].0 - fired[0].0);
        assert!(gap >= Duration::from_millis(900));
    }

    #[test]
    fn downward_motion_scrolls_down() {
        let mut engine = engine();
        let fired = run(&mut engine, Instant::now(), 10, |frame| {
            Some(drift(POINTING, (0.5, 0.1), (0.0, 0.1), frame))
        });
        assert_eq!(fired.first().map(|(_, event)| *event), Some(GestureEvent::ScrollDown));
    }

    #[test]
    fn horizontal_dominance_fires_tab_not_scroll() {
        let mut engine = engine();
        // |dx| = 0.12 per frame against |dy| = 0.02: tab wins.
        let fired = run(&mut engine, Instant::now(), 10, |frame| {
            Some(drift(POINTING, (0.0, 0.5), (0.12, 0.02), frame))
        });
        assert_eq!(fired.first().map(|(_, event)| *event), Some(GestureEvent::NextTab));
    }

    #[test]
    fn leftward_motion_fires_previous_tab() {
        let mut engine = engine();
        let fired = run(&mut engine, Instant::now(), 10, |frame| {
            Some(drift(POINTING, (2.0, 0.5), (-0.12, 0.0), frame))
        });
        assert_eq!(fired.first().map(|(_, event)| *event), Some(GestureEvent::PrevTab));
    }

    #[test]
    fn exact_axis_tie_fires_nothing() {
        let mut engine = engine();
        let fired = run(&mut engine, Instant::now(), 15, |frame| {
            Some(drift(POINTING, (0.0, 0.0), (0.1, 0.1), frame))
        });
        assert!(fired.is_empty());
    }

    #[test]
    fn fist_hold_fires_copy_exactly_once() {
        let mut engine = engine();
        let still = features(FIST, (0.5, 0.5), (0.45, 0.5));
        // 30 frames ≈ 1 s of continuous fist, twice the hold window.
        let fired = run(&mut engine, Instant::now(), 30, |_| Some(still));
        assert_eq!(
            fired.iter().map(|(_, event)| *event).collect::<Vec<_>>(),
            vec![GestureEvent::Copy]
        );
        assert!(engine.copy_pending());
    }

    #[test]
    fn fist_below_hold_time_does_not_fire() {
        let mut engine = engine();
        let still = features(FIST, (0.5, 0.5), (0.45, 0.5));
        // 10 frames ≈ 330 ms, under the 450 ms hold.
        let fired = run(&mut engine, Instant::now(), 10, |_| Some(still));
        assert!(fired.is_empty());
        assert!(!engine.copy_pending());
    }

    #[test]
    fn breaking_the_fist_resets_the_hold() {
        let mut engine = engine();
        let fist = features(FIST, (0.5, 0.5), (0.45, 0.5));
        let open = features(PALM, (0.5, 0.5), (0.45, 0.5));
        // 10 fist frames, one open frame, 10 more fist frames: neither run
        // alone reaches the hold time, so nothing may fire.
        let fired = run(&mut engine, Instant::now(), 21, |frame| {
            Some(if frame == 10 { open } else { fist })
        });
        assert!(fired.is_empty());
    }

    #[test]
    fn paste_requires_a_pending_copy() {
        let mut engine = engine();
        let open = features(PALM, (0.5, 0.5), (0.45, 0.5));
        let fired = run(&mut engine, Instant::now(), 30, |_| Some(open));
        assert!(fired.is_empty());
    }

    #[test]
    fn copy_then_paste_consumes_the_confirmation() {
        let mut engine = engine();
        let fist = features(FIST, (0.5, 0.5), (0.45, 0.5));
        let open = features(PALM, (0.5, 0.5), (0.45, 0.5));
        // Fist for 1 s, palm for 2 s, palm again after a gap: the second
        // palm hold must not paste again without a fresh copy.
        let fired = run(&mut engine, Instant::now(), 120, |frame| {
            Some(if frame < 30 { fist } else { open })
        });
        assert_eq!(
            fired.iter().map(|(_, event)| *event).collect::<Vec<_>>(),
            vec![GestureEvent::Copy, GestureEvent::Paste]
        );
        assert!(!engine.copy_pending());
    }

    #[test]
    fn held_fist_does_not_refire_until_reopened_and_pasted() {
        let mut engine = engine();
        let fist = features(FIST, (0.5, 0.5), (0.45, 0.5));
        let open = features(PALM, (0.5, 0.5), (0.45, 0.5));
        // Long fist, reopen into paste, then a second fist hold: exactly
        // one more copy.
        let fired = run(&mut engine, Instant::now(), 150, |frame| {
            Some(match frame {
                0..=59 => fist,
                60..=99 => open,
                _ => fist,
            })
        });
        assert_eq!(
            fired.iter().map(|(_, event)| *event).collect::<Vec<_>>(),
            vec![GestureEvent::Copy, GestureEvent::Paste, GestureEvent::Copy]
        );
    }

    #[test]
    fn copy_confirmation_survives_hand_loss() {
        let mut engine = engine();
        let fist = features(FIST, (0.5, 0.5), (0.45, 0.5));
        let open = features(PALM, (0.5, 0.5), (0.45, 0.5));
        let fired = run(&mut engine, Instant::now(), 90, |frame| match frame {
            0..=29 => Some(fist),
            30..=44 => None,
            _ => Some(open),
        });
        assert_eq!(
            fired.iter().map(|(_, event)| *event).collect::<Vec<_>>(),
            vec![GestureEvent::Copy, GestureEvent::Paste]
        );
    }

    #[test]
    fn hand_loss_resets_hold_progress() {
        let mut engine = engine();
        let fist = features(FIST, (0.5, 0.5), (0.45, 0.5));
        // Two sub-threshold fist runs separated by hand loss: the hold may
        // not accumulate across the gap.
        let fired = run(&mut engine, Instant::now(), 25, |frame| match frame {
            0..=9 => Some(fist),
            10..=14 => None,
            _ => Some(fist),
        });
        assert!(fired.is_empty());
    }

    #[test]
    fn pinch_fires_screenshot_with_its_own_cooldown() {
        let mut engine = engine();
        // Thumb and index tips 0.03 apart, other fingers closed.
        let pinch = features(PINCH_POSE, (0.50, 0.50), (0.53, 0.50));
        // 2.5 s cooldown ≈ 76 frames; 100 frames allow exactly two shots.
        let fired = run(&mut engine, Instant::now(), 100, |_| Some(pinch));
        assert_eq!(fired.len(), 2);
        assert!(fired.iter().all(|(_, event)| *event == GestureEvent::Screenshot));
        let gap = FRAME * (fired[1].0 - fired[0].0);
        assert!(gap >= Duration::from_millis(2500));
    }

    #[test]
    fn wide_pinch_does_not_fire() {
        let mut engine = engine();
        let apart = features(PINCH_POSE, (0.50, 0.50), (0.60, 0.50));
        let fired = run(&mut engine, Instant::now(), 30, |_| Some(apart));
        assert!(fired.is_empty());
    }

    #[test]
    fn pinch_with_extra_finger_does_not_fire() {
        let mut engine = engine();
        let three = features([true, true, true, false, false], (0.50, 0.50), (0.53, 0.50));
        let fired = run(&mut engine, Instant::now(), 30, |_| Some(three));
        assert!(fired.is_empty());
    }

    #[test]
    fn screenshot_cooldown_is_independent_of_motion_cooldown() {
        let mut engine = engine();
        let start = Instant::now();
        // Scroll first, then pinch immediately: the motion cooldown must
        // not suppress the screenshot.
        let mut fired = run(&mut engine, start, 10, |frame| {
            Some(drift(POINTING, (0.5, 2.0), (0.0, -0.1), frame))
        });
        let pinch = features(PINCH_POSE, (0.50, 0.50), (0.53, 0.50));
        fired.extend(run(&mut engine, start + FRAME * 10, 3, |_| Some(pinch)));
        let events: Vec<_> = fired.iter().map(|(_, event)| *event).collect();
        assert!(events.contains(&GestureEvent::ScrollUp));
        assert!(events.contains(&GestureEvent::Screenshot));
    }

    #[test]
    fn at_most_one_event_per_frame() {
        // A frame that qualifies for both a motion gesture and a copy hold
        // resolves to the higher-priority motion event.
        let mut config = GestureConfig::default();
        config.ema_policy = EmaPolicy::Persist;
        let mut engine = GestureEngine::new(config);
        let start = Instant::now();
        // Drifting fist: builds hold progress and motion simultaneously.
        let fired = run(&mut engine, start, 30, |frame| {
            let tip = (0.5, 2.0 - 0.1 * frame as f32);
            Some(features(FIST, tip, (tip.0 + 0.5, tip.1)))
        });
        // Never two events on the same frame index.
        let mut frames: Vec<u32> = fired.iter().map(|(frame, _)| *frame).collect();
        frames.dedup();
        assert_eq!(frames.len(), fired.len());
        // The first firing frame is the motion gesture, not the copy.
        assert_eq!(fired.first().map(|(_, event)| *event), Some(GestureEvent::ScrollUp));
    }

    #[test]
    fn hold_progress_is_not_stalled_by_a_motion_event() {
        let mut engine = engine();
        let start = Instant::now();
        // A drifting fist long enough for both: scroll fires early, copy
        // fires once the hold matures, despite the scroll in between.
        let fired = run(&mut engine, start, 30, |frame| {
            let tip = (0.5, 2.0 - 0.1 * frame as f32);
            Some(features(FIST, tip, (tip.0 + 0.5, tip.1)))
        });
        let events: Vec<_> = fired.iter().map(|(_, event)| *event).collect();
        assert!(events.contains(&GestureEvent::ScrollUp));
        assert!(events.contains(&GestureEvent::Copy));
    }
}
