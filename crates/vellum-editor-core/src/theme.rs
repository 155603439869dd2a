//! Light/dark theme preference, shared across editor instances.
//!
//! One process-wide storage key holds the user's explicit choice. Until a
//! choice is persisted the system color-scheme signal decides, and system
//! changes keep flowing through; once the user toggles, the explicit
//! choice wins and system changes are ignored.

use crate::host::{ColorSchemeSignal, KeyValueStore};

/// Storage key shared by every editor instance in the process.
pub const GLOBAL_THEME_KEY: &str = "rte-global-theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn from_str(s: &str) -> Option<Theme> {
        match s {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    fn from_system(prefers_dark: bool) -> Theme {
        if prefers_dark { Theme::Dark } else { Theme::Light }
    }
}

/// Theme state over an injected store and color-scheme signal.
pub struct ThemeStore<S: KeyValueStore> {
    store: S,
    current: Theme,
    explicit: bool,
}

impl<S: KeyValueStore> ThemeStore<S> {
    /// Load the persisted choice, falling back to the system preference.
    pub fn load(store: S, scheme: &dyn ColorSchemeSignal) -> Self {
        let stored = match store.get(GLOBAL_THEME_KEY) {
            Ok(value) => value.as_deref().and_then(Theme::from_str),
            Err(err) => {
                tracing::warn!(error = %err, "reading theme preference failed");
                None
            }
        };
        match stored {
            Some(theme) => Self {
                store,
                current: theme,
                explicit: true,
            },
            None => Self {
                store,
                current: Theme::from_system(scheme.prefers_dark()),
                explicit: false,
            },
        }
    }

    pub fn current(&self) -> Theme {
        self.current
    }

    pub fn toggle(&mut self) -> Theme {
        let next = match self.current {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        };
        self.set(next);
        next
    }

    /// Persist an explicit choice. Storage failures are logged and the
    /// in-memory theme still switches.
    pub fn set(&mut self, theme: Theme) {
        self.current = theme;
        self.explicit = true;
        if let Err(err) = self.store.set(GLOBAL_THEME_KEY, theme.as_str()) {
            tracing::warn!(error = %err, "persisting theme preference failed");
        }
    }

    /// System preference changed. Only applies while the user has not
    /// made an explicit choice.
    pub fn on_system_change(&mut self, prefers_dark: bool) {
        if !self.explicit {
            self.current = Theme::from_system(prefers_dark);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{FixedScheme, MemoryStore};

    #[test]
    fn test_falls_back_to_system_preference() {
        let themes = ThemeStore::load(MemoryStore::default(), &FixedScheme(true));
        assert_eq!(themes.current(), Theme::Dark);

        let themes = ThemeStore::load(MemoryStore::default(), &FixedScheme(false));
        assert_eq!(themes.current(), Theme::Light);
    }

    #[test]
    fn test_stored_choice_wins_over_system() {
        let mut store = MemoryStore::default();
        store.set(GLOBAL_THEME_KEY, "light").unwrap();
        let themes = ThemeStore::load(store, &FixedScheme(true));
        assert_eq!(themes.current(), Theme::Light);
    }

    #[test]
    fn test_toggle_persists() {
        let mut themes = ThemeStore::load(MemoryStore::default(), &FixedScheme(false));
        assert_eq!(themes.toggle(), Theme::Dark);
        assert_eq!(
            themes.store.get(GLOBAL_THEME_KEY).unwrap().as_deref(),
            Some("dark")
        );
    }

    #[test]
    fn test_system_change_respects_explicit_choice() {
        let mut themes = ThemeStore::load(MemoryStore::default(), &FixedScheme(false));
        themes.on_system_change(true);
        assert_eq!(themes.current(), Theme::Dark);

        themes.set(Theme::Light);
        themes.on_system_change(true);
        assert_eq!(themes.current(), Theme::Light);
    }

    #[test]
    fn test_storage_failure_still_switches() {
        let store = MemoryStore {
            fail: true,
            ..Default::default()
        };
        let mut themes = ThemeStore::load(store, &FixedScheme(false));
        assert_eq!(themes.toggle(), Theme::Dark);
        assert_eq!(themes.current(), Theme::Dark);
    }
}
