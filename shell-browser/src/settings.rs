//! Browser settings and the string-keyed property contract they persist to.

use indexmap::IndexMap;

use crate::error::{BrowserError, BrowserResult};
use crate::host::{FolderFlags, ViewMode, ViewSettings};

/// Property keys used by [`BrowserSettings`] and
/// [`ShellBrowser::save_state`](crate::ShellBrowser::save_state).
pub mod keys {
    /// Text shown for an empty folder.
    pub const EMPTY_FOLDER_TEXT: &str = "ShellBrowser.EmptyFolderText";
    /// Text shown when device access was declined.
    pub const CANCELLED_TEXT: &str = "ShellBrowser.CancelledText";
    /// Initial view mode.
    pub const VIEW_MODE: &str = "ShellBrowser.ViewMode";
    /// View option bits, hex.
    pub const FOLDER_FLAGS: &str = "ShellBrowser.FolderFlags";
    /// Last committed folder, hex-encoded identifier.
    pub const LAST_FOLDER: &str = "ShellBrowser.LastFolder";
}

/// String-keyed property persistence owned by the host application.
pub trait PropertyStore {
    /// Read a property.
    fn property(&self, key: &str) -> Option<String>;

    /// Write a property.
    fn set_property(&mut self, key: &str, value: String);

    /// Read a property, storing and returning `default` when it is missing.
    fn sync_property(&mut self, key: &str, default: &str) -> String {
        match self.property(key) {
            Some(value) => value,
            None => {
                self.set_property(key, default.to_string());
                default.to_string()
            }
        }
    }
}

/// In-memory [`PropertyStore`] that keeps insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MemoryPropertyStore {
    values: IndexMap<String, String>,
}

impl MemoryPropertyStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored properties.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Remove a property.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.values.shift_remove(key)
    }
}

impl PropertyStore for MemoryPropertyStore {
    fn property(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set_property(&mut self, key: &str, value: String) {
        self.values.insert(key.to_string(), value);
    }
}

/// Browser configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BrowserSettings {
    /// Text shown by the host view for an empty folder.
    pub empty_folder_text: String,
    /// Placeholder shown instead of a view window when device access was
    /// declined.
    pub cancelled_text: String,
    /// Settings handed to the host when a view window is created.
    pub view: ViewSettings,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            empty_folder_text: "This folder\nis empty.".to_string(),
            cancelled_text: "Cancelled by the user.".to_string(),
            view: ViewSettings::default(),
        }
    }
}

impl BrowserSettings {
    /// Set the empty-folder text.
    pub fn with_empty_folder_text(mut self, text: impl Into<String>) -> Self {
        self.empty_folder_text = text.into();
        self
    }

    /// Set the cancelled-access placeholder text.
    pub fn with_cancelled_text(mut self, text: impl Into<String>) -> Self {
        self.cancelled_text = text.into();
        self
    }

    /// Set the initial view mode.
    pub fn with_view_mode(mut self, mode: ViewMode) -> Self {
        self.view.view_mode = mode;
        self
    }

    /// Set the view option bits.
    pub fn with_folder_flags(mut self, flags: FolderFlags) -> Self {
        self.view.flags = flags;
        self
    }

    /// Load settings, writing defaults for missing keys.
    pub fn load(store: &mut dyn PropertyStore) -> BrowserResult<Self> {
        let defaults = Self::default();
        let empty_folder_text = store.sync_property(keys::EMPTY_FOLDER_TEXT, &defaults.empty_folder_text);
        let cancelled_text = store.sync_property(keys::CANCELLED_TEXT, &defaults.cancelled_text);

        let mode = store.sync_property(keys::VIEW_MODE, defaults.view.view_mode.as_str());
        let view_mode = mode
            .parse::<ViewMode>()
            .map_err(|reason| BrowserError::settings(keys::VIEW_MODE, reason))?;

        let flags = store.sync_property(
            keys::FOLDER_FLAGS,
            &format!("{:08x}", defaults.view.flags.bits()),
        );
        let bits = u32::from_str_radix(flags.trim(), 16)
            .map_err(|err| BrowserError::settings(keys::FOLDER_FLAGS, err.to_string()))?;

        Ok(Self {
            empty_folder_text,
            cancelled_text,
            view: ViewSettings {
                view_mode,
                flags: FolderFlags::from_bits_retain(bits),
            },
        })
    }

    /// Persist every setting.
    pub fn save(&self, store: &mut dyn PropertyStore) {
        store.set_property(keys::EMPTY_FOLDER_TEXT, self.empty_folder_text.clone());
        store.set_property(keys::CANCELLED_TEXT, self.cancelled_text.clone());
        store.set_property(keys::VIEW_MODE, self.view.view_mode.as_str().to_string());
        store.set_property(keys::FOLDER_FLAGS, format!("{:08x}", self.view.flags.bits()));
    }
}
