//! Action dispatcher: maps each fired gesture event to exactly one external
//! effect and/or a shared-clipboard update. Every backend failure is logged
//! and absorbed here — nothing propagates back into the frame loop.

use std::{
    fs,
    path::PathBuf,
    thread,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};

use crate::{
    actions::ActionBackend,
    clipboard::{ClipboardKind, SharedClipboard},
    config::Config,
    types::{GestureEvent, KeyCombo},
};

pub struct ActionDispatcher {
    backend: Box<dyn ActionBackend>,
    clipboard: SharedClipboard,
    screenshot_dir: PathBuf,
    scroll_amount: i32,
    copy_settle: Duration,
}

impl ActionDispatcher {
    pub fn new(
        backend: Box<dyn ActionBackend>,
        clipboard: SharedClipboard,
        config: &Config,
    ) -> Self {
        Self {
            backend,
            clipboard,
            screenshot_dir: config.screenshot_dir.clone(),
            scroll_amount: config.scroll_amount,
            copy_settle: config.copy_settle(),
        }
    }

    /// Execute the effect for one event. Infallible from the caller's
    /// perspective: failures are logged and the frame loop moves on.
    pub fn dispatch(&mut self, event: GestureEvent) {
        log::info!("gesture fired: {}", event.label());
        let result = match event {
            GestureEvent::ScrollUp => self.backend.scroll(self.scroll_amount),
            GestureEvent::ScrollDown => self.backend.scroll(-self.scroll_amount),
            GestureEvent::NextTab => self.backend.key_combo(KeyCombo::NextTab),
            GestureEvent::PrevTab => self.backend.key_combo(KeyCombo::PrevTab),
            GestureEvent::Copy => self.perform_copy(),
            GestureEvent::Paste => self.perform_paste(),
            GestureEvent::Screenshot => self.perform_screenshot(),
        };
        if let Err(err) = result {
            log::warn!("{} action failed: {err:?}", event.label());
        }
    }

    /// Inject the copy combo, give the OS clipboard a moment to settle,
    /// then pull the copied text into the shared slot. An empty clipboard
    /// leaves the slot untouched.
    fn perform_copy(&mut self) -> Result<()> {
        self.backend.key_combo(KeyCombo::Copy)?;
        if !self.copy_settle.is_zero() {
            thread::sleep(self.copy_settle);
        }
        let text = self.backend.read_clipboard_text()?;
        if text.is_empty() {
            log::info!("copy gesture fired but the system clipboard has no text");
        } else {
            log::info!("copied {} bytes into the shared clipboard", text.len());
            self.clipboard.write(ClipboardKind::Text, text);
        }
        Ok(())
    }

    /// Stage the shared text in the OS clipboard, then inject the paste
    /// combo. A failed staging write still pastes whatever the OS holds.
    fn perform_paste(&mut self) -> Result<()> {
        let snapshot = self.clipboard.read();
        if snapshot.kind == ClipboardKind::Text && !snapshot.value.is_empty() {
            if let Err(err) = self.backend.write_clipboard_text(&snapshot.value) {
                log::warn!("failed to stage shared text in the system clipboard: {err:?}");
            }
        }
        self.backend.key_combo(KeyCombo::Paste)
    }

    fn perform_screenshot(&mut self) -> Result<()> {
        let png = self.backend.capture_screen()?;

        let stamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_secs())
            .unwrap_or(0);
        let path = self.screenshot_dir.join(format!("screenshot_{stamp}.png"));
        fs::write(&path, &png)
            .with_context(|| format!("failed to save screenshot to {}", path.display()))?;

        self.clipboard.write(ClipboardKind::Image, BASE64.encode(&png));
        log::info!("screenshot saved and synced: {}", path.display());
        Ok(())
    }
}
