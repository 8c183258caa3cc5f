//! Action backend: the OS-side capabilities the dispatcher drives —
//! scroll/key injection, screen capture and the system clipboard.

use std::io::Cursor;

use anyhow::{Context, Result, anyhow};
use enigo::{Axis, Direction, Enigo, Key, Keyboard, Mouse, Settings};
use image::ImageFormat;

use crate::types::KeyCombo;

/// Everything the dispatcher needs from the host. Each call may fail;
/// callers treat failures as non-fatal.
pub trait ActionBackend: Send {
    /// Scroll by `amount` lines; positive scrolls up.
    fn scroll(&mut self, amount: i32) -> Result<()>;
    fn key_combo(&mut self, combo: KeyCombo) -> Result<()>;
    /// Capture the primary screen, PNG-encoded.
    fn capture_screen(&mut self) -> Result<Vec<u8>>;
    /// Current system clipboard text; empty string when there is none.
    fn read_clipboard_text(&mut self) -> Result<String>;
    fn write_clipboard_text(&mut self, text: &str) -> Result<()>;
}

pub struct DesktopBackend {
    enigo: Enigo,
    clipboard: arboard::Clipboard,
}

impl DesktopBackend {
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())
            .map_err(|err| anyhow!("failed to initialize input injection: {err}"))?;
        let clipboard = arboard::Clipboard::new()
            .map_err(|err| anyhow!("failed to open the system clipboard: {err}"))?;
        Ok(Self { enigo, clipboard })
    }

    fn chord(&mut self, modifiers: &[Key], key: Key) -> Result<()> {
        for &modifier in modifiers {
            self.enigo.key(modifier, Direction::Press)?;
        }
        let result = self.enigo.key(key, Direction::Click);
        for &modifier in modifiers.iter().rev() {
            self.enigo.key(modifier, Direction::Release)?;
        }
        result?;
        Ok(())
    }
}

impl ActionBackend for DesktopBackend {
    fn scroll(&mut self, amount: i32) -> Result<()> {
        // enigo counts positive scroll as downward.
        self.enigo
            .scroll(-amount, Axis::Vertical)
            .context("scroll injection failed")
    }

    fn key_combo(&mut self, combo: KeyCombo) -> Result<()> {
        match combo {
            KeyCombo::Copy => self.chord(&[Key::Control], Key::Unicode('c')),
            KeyCombo::Paste => self.chord(&[Key::Control], Key::Unicode('v')),
            KeyCombo::NextTab => self.chord(&[Key::Control], Key::Tab),
            KeyCombo::PrevTab => self.chord(&[Key::Control, Key::Shift], Key::Tab),
        }
        .with_context(|| format!("key combo injection failed: {combo:?}"))
    }

    fn capture_screen(&mut self) -> Result<Vec<u8>> {
        let monitors = xcap::Monitor::all().context("failed to enumerate monitors")?;
        let monitor = monitors
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("no monitor available for capture"))?;
        let capture = monitor
            .capture_image()
            .context("screen capture failed")?;

        let mut png = Vec::new();
        capture
            .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
            .context("failed to encode screenshot as png")?;
        Ok(png)
    }

    fn read_clipboard_text(&mut self) -> Result<String> {
        match self.clipboard.get_text() {
            Ok(text) => Ok(text),
            // Nothing (or a non-text value) on the clipboard is a normal
            // outcome, not an error.
            Err(arboard::Error::ContentNotAvailable) => Ok(String::new()),
            Err(err) => Err(anyhow!("clipboard read failed: {err}")),
        }
    }

    fn write_clipboard_text(&mut self, text: &str) -> Result<()> {
        self.clipboard
            .set_text(text.to_string())
            .map_err(|err| anyhow!("clipboard write failed: {err}"))
    }
}
