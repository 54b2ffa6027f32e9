//! Light/dark/system theme selection.
//!
//! The preference is a tri-state persisted in a small key/value store (the
//! browser's local storage in the shipped page, [`MemoryStore`] in tests).
//! The applied mode is derived: `light` and `dark` are fixed, `system`
//! follows the OS color-scheme preference, including changes that arrive
//! after the selection. Once the user picks `light` or `dark`, preference
//! change notifications no longer affect the applied mode.
//!
//! The embedded `static/theme.js` mirrors [`ThemeController`] in the
//! browser; both use [`STORAGE_KEY`] and [`DARK_CLASS`]. Rendered pages
//! start from a first-visit controller (empty store, light system scheme)
//! for the selected option and root class; the script then restores the
//! visitor's own state.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Local-storage key holding the preference.
pub const STORAGE_KEY: &str = "theme";

/// Class put on the root element while dark mode is applied.
pub const DARK_CLASS: &str = "dark-mode";

/// What the user picked in the theme selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    Light,
    Dark,
    #[default]
    System,
}

impl ThemePreference {
    pub const ALL: [ThemePreference; 3] = [
        ThemePreference::Light,
        ThemePreference::Dark,
        ThemePreference::System,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::System => "system",
        }
    }

    /// Selector label.
    pub fn label(self) -> &'static str {
        match self {
            ThemePreference::Light => "Claro",
            ThemePreference::Dark => "Escuro",
            ThemePreference::System => "Sistema",
        }
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThemePreference {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ThemePreference::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or(())
    }
}

/// The mode actually applied to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeMode {
    Light,
    Dark,
}

impl ThemeMode {
    /// Root element class for this mode, if any.
    pub fn root_class(self) -> Option<&'static str> {
        match self {
            ThemeMode::Dark => Some(DARK_CLASS),
            ThemeMode::Light => None,
        }
    }
}

/// Client-local key/value persistence.
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
}

/// In-memory store, for headless use and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }
}

/// Owns the preference, the last known system setting, and the store.
#[derive(Debug)]
pub struct ThemeController<S: PreferenceStore> {
    store: S,
    preference: ThemePreference,
    system_prefers_dark: bool,
}

impl<S: PreferenceStore> ThemeController<S> {
    /// Restore the saved preference; missing or unrecognized values mean
    /// `system`.
    pub fn load(store: S, system_prefers_dark: bool) -> Self {
        let preference = store
            .get(STORAGE_KEY)
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        Self {
            store,
            preference,
            system_prefers_dark,
        }
    }

    pub fn preference(&self) -> ThemePreference {
        self.preference
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Whether preference-change notifications currently matter.
    pub fn follows_system(&self) -> bool {
        self.preference == ThemePreference::System
    }

    pub fn mode(&self) -> ThemeMode {
        match self.preference {
            ThemePreference::Light => ThemeMode::Light,
            ThemePreference::Dark => ThemeMode::Dark,
            ThemePreference::System if self.system_prefers_dark => ThemeMode::Dark,
            ThemePreference::System => ThemeMode::Light,
        }
    }

    /// User picked a preference: persist it and return the mode to apply.
    pub fn select(&mut self, preference: ThemePreference) -> ThemeMode {
        self.preference = preference;
        self.store.set(STORAGE_KEY, preference.as_str());
        self.mode()
    }

    /// The OS preference changed. Returns the mode to apply when the page
    /// follows the system, `None` when the notification is ignored.
    pub fn system_changed(&mut self, prefers_dark: bool) -> Option<ThemeMode> {
        self.system_prefers_dark = prefers_dark;
        self.follows_system().then(|| self.mode())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_preference_defaults_to_system() {
        let theme = ThemeController::load(MemoryStore::default(), true);
        assert_eq!(theme.preference(), ThemePreference::System);
        assert_eq!(theme.mode(), ThemeMode::Dark);
    }

    #[test]
    fn garbage_preference_defaults_to_system() {
        let mut store = MemoryStore::default();
        store.set(STORAGE_KEY, "sepia");
        let theme = ThemeController::load(store, false);
        assert_eq!(theme.preference(), ThemePreference::System);
        assert_eq!(theme.mode(), ThemeMode::Light);
    }

    #[test]
    fn saved_preference_is_restored() {
        let mut store = MemoryStore::default();
        store.set(STORAGE_KEY, "dark");
        let theme = ThemeController::load(store, false);
        assert_eq!(theme.mode(), ThemeMode::Dark);
    }

    #[test]
    fn select_persists() {
        let mut theme = ThemeController::load(MemoryStore::default(), false);
        assert_eq!(theme.select(ThemePreference::Dark), ThemeMode::Dark);
        assert_eq!(theme.store().get(STORAGE_KEY).as_deref(), Some("dark"));

        let reloaded = ThemeController::load(theme.into_store(), false);
        assert_eq!(reloaded.preference(), ThemePreference::Dark);
        assert_eq!(reloaded.mode(), ThemeMode::Dark);
    }

    #[test]
    fn system_tracks_later_changes() {
        let mut theme = ThemeController::load(MemoryStore::default(), false);
        theme.select(ThemePreference::System);
        assert_eq!(theme.system_changed(true), Some(ThemeMode::Dark));
        assert_eq!(theme.system_changed(false), Some(ThemeMode::Light));
    }

    #[test]
    fn explicit_choice_ignores_system_changes() {
        let mut theme = ThemeController::load(MemoryStore::default(), false);
        theme.select(ThemePreference::Light);
        assert!(!theme.follows_system());
        assert_eq!(theme.system_changed(true), None);
        assert_eq!(theme.mode(), ThemeMode::Light);
    }

    #[test]
    fn returning_to_system_uses_latest_os_setting() {
        let mut theme = ThemeController::load(MemoryStore::default(), false);
        theme.select(ThemePreference::Light);
        theme.system_changed(true);
        assert_eq!(theme.select(ThemePreference::System), ThemeMode::Dark);
    }

    #[test]
    fn root_class_only_in_dark_mode() {
        assert_eq!(ThemeMode::Dark.root_class(), Some("dark-mode"));
        assert_eq!(ThemeMode::Light.root_class(), None);
    }
}
