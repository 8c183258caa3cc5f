use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};

/// What happens to the EMA velocity estimate when the hand disappears.
///
/// `Persist` keeps the estimate across hand loss so motion gestures respond
/// immediately after reacquisition; `Reset` zeroes it together with the
/// position history so reacquisition starts cold.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmaPolicy {
    Persist,
    Reset,
}

/// Tuning for the gesture engine: smoothing, thresholds and timing windows.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Number of recent fingertip samples retained for displacement.
    pub smoothing_window: usize,
    /// Exponential moving average weight for dx/dy smoothing.
    pub ema_alpha: f32,
    /// Vertical motion threshold (lower = more sensitive).
    pub scroll_threshold: f32,
    /// Horizontal motion threshold.
    pub tab_threshold: f32,
    /// Minimum spacing between recognized motion gestures.
    pub motion_cooldown_secs: f32,
    /// How long a fist/open palm must hold to confirm copy/paste.
    pub gesture_hold_secs: f32,
    /// Minimum spacing between screenshots.
    pub screenshot_cooldown_secs: f32,
    /// Thumb-to-index distance below which a pinch registers.
    pub pinch_threshold: f32,
    pub ema_policy: EmaPolicy,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 6,
            ema_alpha: 0.25,
            scroll_threshold: 0.06,
            tab_threshold: 0.09,
            motion_cooldown_secs: 0.9,
            gesture_hold_secs: 0.45,
            screenshot_cooldown_secs: 2.5,
            pinch_threshold: 0.05,
            ema_policy: EmaPolicy::Persist,
        }
    }
}

impl GestureConfig {
    pub fn motion_cooldown(&self) -> Duration {
        Duration::from_secs_f32(self.motion_cooldown_secs)
    }

    pub fn gesture_hold(&self) -> Duration {
        Duration::from_secs_f32(self.gesture_hold_secs)
    }

    pub fn screenshot_cooldown(&self) -> Duration {
        Duration::from_secs_f32(self.screenshot_cooldown_secs)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub camera_index: u32,
    /// Mirror landmark x-coordinates so gestures match a front camera.
    pub mirror_camera: bool,
    /// Minimum detector confidence to accept a hand for the frame.
    pub min_confidence: f32,
    /// Scroll magnitude (lines) per scroll gesture.
    pub scroll_amount: i32,
    /// Wait after injecting the copy combo before reading the OS clipboard.
    pub copy_settle_ms: u64,
    pub screenshot_dir: PathBuf,
    pub server_port: u16,
    /// Expose `POST /upload_clipboard` on the query interface.
    pub allow_remote_write: bool,
    pub gesture: GestureConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera_index: 0,
            mirror_camera: true,
            min_confidence: 0.5,
            scroll_amount: 5,
            copy_settle_ms: 180,
            screenshot_dir: PathBuf::from("screenshots"),
            server_port: 5000,
            allow_remote_write: false,
            gesture: GestureConfig::default(),
        }
    }
}

impl Config {
    pub fn copy_settle(&self) -> Duration {
        Duration::from_millis(self.copy_settle_ms)
    }

    /// Load configuration from a JSON file, falling back to defaults when
    /// the file is missing or unreadable.
    pub fn load_or_default(path: &Path) -> Config {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    log::info!("loaded configuration from {}", path.display());
                    config
                }
                Err(err) => {
                    log::warn!(
                        "failed to parse {}: {err}, using defaults",
                        path.display()
                    );
                    Config::default()
                }
            },
            Err(_) => {
                log::info!("no configuration at {}, using defaults", path.display());
                Config::default()
            }
        }
    }
}
