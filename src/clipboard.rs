//! Shared clipboard slot: one logical value bridging the gesture pipeline
//! (single writer) and the query server (concurrent readers).

use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipboardKind {
    Empty,
    Text,
    Image,
}

/// The slot's current value. `value` holds UTF-8 text for `Text` and
/// base64-encoded bytes for `Image`. Serializes as `{"type": ..., "value": ...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClipboardPayload {
    #[serde(rename = "type")]
    pub kind: ClipboardKind,
    pub value: String,
}

impl Default for ClipboardPayload {
    fn default() -> Self {
        Self {
            kind: ClipboardKind::Empty,
            value: String::new(),
        }
    }
}

/// Cheaply clonable handle to the slot. Writes replace kind and value
/// together under one guard; reads copy out a full snapshot so readers
/// never observe a torn value and never hold the lock beyond the copy.
#[derive(Clone, Default)]
pub struct SharedClipboard {
    inner: Arc<Mutex<ClipboardPayload>>,
}

impl SharedClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic full replacement, last-write-wins.
    pub fn write(&self, kind: ClipboardKind, value: String) {
        let mut slot = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        slot.kind = kind;
        slot.value = value;
    }

    /// Snapshot of the current value.
    pub fn read(&self) -> ClipboardPayload {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
