//! Host capability traits.
//!
//! The core consumes the embedding platform through these narrow seams:
//! clipboard, a single-line prompt, a file picker, a durable key-value
//! store, and the system color-scheme signal. Each has an in-memory
//! double so command logic is fully testable without a host. Host
//! failures are recoverable by contract - callers log and abandon the
//! operation, leaving the document untouched.

use std::collections::HashMap;

/// Error from a host capability call.
#[derive(Debug, Clone, thiserror::Error)]
pub enum HostError {
    #[error("clipboard unavailable: {0}")]
    Clipboard(String),
    #[error("storage unavailable: {0}")]
    Storage(String),
}

/// Plain-text clipboard access.
pub trait Clipboard {
    fn read_text(&mut self) -> Result<String, HostError>;
    fn write_text(&mut self, text: &str) -> Result<(), HostError>;
}

/// Single-line text prompt (link URLs). `None` means cancelled.
pub trait LinkPrompt {
    fn prompt_url(&mut self) -> Option<String>;
}

/// File picking is a two-phase boundary: the core requests a pick and the
/// host later hands the file's bytes back through
/// `Editor::insert_image_from_file`.
pub trait FilePicker {
    fn request_image(&mut self);
}

/// Durable string storage, namespaced by key.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, HostError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), HostError>;
}

/// The system's current color-scheme preference. Change notifications
/// arrive by the host calling `ThemeStore::on_system_change`.
pub trait ColorSchemeSignal {
    fn prefers_dark(&self) -> bool;
}

// Shared handles make a capability observable from outside the editor
// that owns it (hosts keep a handle, the editor gets the other).
impl<T: Clipboard> Clipboard for std::rc::Rc<std::cell::RefCell<T>> {
    fn read_text(&mut self) -> Result<String, HostError> {
        self.borrow_mut().read_text()
    }

    fn write_text(&mut self, text: &str) -> Result<(), HostError> {
        self.borrow_mut().write_text(text)
    }
}

impl<T: LinkPrompt> LinkPrompt for std::rc::Rc<std::cell::RefCell<T>> {
    fn prompt_url(&mut self) -> Option<String> {
        self.borrow_mut().prompt_url()
    }
}

impl<T: FilePicker> FilePicker for std::rc::Rc<std::cell::RefCell<T>> {
    fn request_image(&mut self) {
        self.borrow_mut().request_image()
    }
}

impl<T: KeyValueStore> KeyValueStore for std::rc::Rc<std::cell::RefCell<T>> {
    fn get(&self, key: &str) -> Result<Option<String>, HostError> {
        self.borrow().get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), HostError> {
        self.borrow_mut().set(key, value)
    }
}

// === In-memory doubles ===

/// Clipboard holding one string, with switchable failure injection.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
    pub fail_reads: bool,
    pub fail_writes: bool,
}

impl Clipboard for MemoryClipboard {
    fn read_text(&mut self) -> Result<String, HostError> {
        if self.fail_reads {
            return Err(HostError::Clipboard("read rejected".into()));
        }
        Ok(self.contents.clone().unwrap_or_default())
    }

    fn write_text(&mut self, text: &str) -> Result<(), HostError> {
        if self.fail_writes {
            return Err(HostError::Clipboard("write rejected".into()));
        }
        self.contents = Some(text.to_string());
        Ok(())
    }
}

/// Prompt answering with a fixed value (or cancellation).
#[derive(Debug, Default)]
pub struct StaticPrompt {
    pub answer: Option<String>,
}

impl StaticPrompt {
    pub fn answering(url: &str) -> Self {
        Self {
            answer: Some(url.to_string()),
        }
    }
}

impl LinkPrompt for StaticPrompt {
    fn prompt_url(&mut self) -> Option<String> {
        self.answer.clone()
    }
}

/// Picker that only counts requests; tests complete the insert manually.
#[derive(Debug, Default)]
pub struct RecordingPicker {
    pub requests: usize,
}

impl FilePicker for RecordingPicker {
    fn request_image(&mut self) {
        self.requests += 1;
    }
}

/// HashMap-backed store with switchable failure injection.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub entries: HashMap<String, String>,
    pub fail: bool,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, HostError> {
        if self.fail {
            return Err(HostError::Storage("get rejected".into()));
        }
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), HostError> {
        if self.fail {
            return Err(HostError::Storage("set rejected".into()));
        }
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Fixed system preference.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedScheme(pub bool);

impl ColorSchemeSignal for FixedScheme {
    fn prefers_dark(&self) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_clipboard_round_trip() {
        let mut clipboard = MemoryClipboard::default();
        clipboard.write_text("hello").unwrap();
        assert_eq!(clipboard.read_text().unwrap(), "hello");
    }

    #[test]
    fn test_memory_clipboard_failure_injection() {
        let mut clipboard = MemoryClipboard {
            fail_writes: true,
            ..Default::default()
        };
        assert!(clipboard.write_text("x").is_err());
        assert!(clipboard.contents.is_none());
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::default();
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        assert_eq!(store.get("missing").unwrap(), None);

        store.fail = true;
        assert!(store.get("k").is_err());
    }
}
