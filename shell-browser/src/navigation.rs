//! Navigation requests and their resolution to absolute identifiers.

use bitflags::bitflags;

use crate::error::{BrowserError, BrowserResult};
use crate::item_id::{ItemIdList, ItemIdRef, ItemIdentifier};
use crate::namespace::NamespaceProvider;

bitflags! {
    /// Browse flags (`SBSP_*` values).
    ///
    /// Only [`RELATIVE`](Self::RELATIVE) and [`PARENT`](Self::PARENT) change
    /// how a target is resolved; the remaining bits are accepted and ignored.
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct NavigationFlags: u32 {
        /// Navigate in this browser.
        const SAME_BROWSER = 0x0000_0001;
        /// Open a new browser window.
        const NEW_BROWSER = 0x0000_0002;
        /// Open mode.
        const OPEN_MODE = 0x0000_0010;
        /// Explore mode.
        const EXPLORE_MODE = 0x0000_0020;
        /// Help mode.
        const HELP_MODE = 0x0000_0040;
        /// Do not transfer the browse history.
        const NO_TRANSFER_HISTORY = 0x0000_0080;
        /// The identifier is relative to the current folder.
        const RELATIVE = 0x0000_1000;
        /// Navigate to the parent of the current folder.
        const PARENT = 0x0000_2000;
        /// Go back in history.
        const NAVIGATE_BACK = 0x0000_4000;
        /// Go forward in history.
        const NAVIGATE_FORWARD = 0x0000_8000;
        /// Allow navigation to a different browser.
        const ALLOW_AUTONAVIGATE = 0x0001_0000;
        /// Keep the current view's state.
        const KEEP_SAME_TEMPLATE = 0x0002_0000;
        /// Keep word wheel text.
        const KEEP_WORD_WHEEL_TEXT = 0x0004_0000;
        /// Activate without taking focus.
        const ACTIVATE_NO_FOCUS = 0x0008_0000;
        /// Do not select an item in the new view.
        const NO_AUTO_SELECT = 0x0400_0000;
        /// Write no history entry.
        const WRITE_NO_HISTORY = 0x0800_0000;
        /// Redirect the navigation.
        const REDIRECT = 0x4000_0000;
        /// Initiated by a hyperlink frame.
        const INITIATED_BY_HLINK_FRAME = 0x8000_0000;
    }
}

/// What a navigation points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NavigationTarget<'a> {
    /// An identifier from the namespace root.
    Absolute(ItemIdentifier<'a>),
    /// An identifier below the current folder.
    Relative(ItemIdentifier<'a>),
    /// The parent of the current folder.
    Parent,
}

/// One navigation request; not retained past its navigation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationRequest<'a> {
    /// Target.
    pub target: NavigationTarget<'a>,
    /// Requesting flags.
    pub flags: NavigationFlags,
}

impl<'a> NavigationRequest<'a> {
    /// Navigate to an absolute identifier.
    pub fn absolute(id: impl Into<ItemIdentifier<'a>>) -> Self {
        Self {
            target: NavigationTarget::Absolute(id.into()),
            flags: NavigationFlags::SAME_BROWSER,
        }
    }

    /// Navigate to an identifier relative to the current folder.
    pub fn relative(id: impl Into<ItemIdentifier<'a>>) -> Self {
        Self {
            target: NavigationTarget::Relative(id.into()),
            flags: NavigationFlags::SAME_BROWSER | NavigationFlags::RELATIVE,
        }
    }

    /// Navigate to the parent of the current folder.
    pub fn parent() -> Self {
        Self {
            target: NavigationTarget::Parent,
            flags: NavigationFlags::SAME_BROWSER | NavigationFlags::PARENT,
        }
    }

    /// Decode a host request the way the host's browse flags read.
    ///
    /// The root identifier is always absolute; otherwise `PARENT` wins over
    /// `RELATIVE`, and everything else is absolute.
    pub fn from_flags(id: impl Into<ItemIdentifier<'a>>, flags: NavigationFlags) -> Self {
        let id = id.into();
        let target = if id.as_id().is_root() {
            NavigationTarget::Absolute(id)
        } else if flags.contains(NavigationFlags::PARENT) {
            NavigationTarget::Parent
        } else if flags.contains(NavigationFlags::RELATIVE) {
            NavigationTarget::Relative(id)
        } else {
            NavigationTarget::Absolute(id)
        };
        Self { target, flags }
    }

    /// Replace the requesting flags.
    pub fn with_flags(mut self, flags: NavigationFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Copy any borrowed identifier so the request can cross threads.
    pub fn into_owned(self) -> NavigationRequest<'static> {
        let target = match self.target {
            NavigationTarget::Absolute(id) => NavigationTarget::Absolute(id.into_static()),
            NavigationTarget::Relative(id) => NavigationTarget::Relative(id.into_static()),
            NavigationTarget::Parent => NavigationTarget::Parent,
        };
        NavigationRequest {
            target,
            flags: self.flags,
        }
    }
}

/// Result of a navigation that did not fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// A new folder and view were committed.
    Committed,
    /// A new folder was committed; the view shows placeholder text because
    /// device access was declined.
    CommittedWithPlaceholder,
    /// The target is the current folder; nothing changed.
    SameTarget,
    /// The request was queued on the owning thread.
    Queued,
}

/// Navigation state of a browser.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ControllerState {
    /// No navigation in flight.
    #[default]
    Idle,
    /// Resolving and binding the target.
    Resolving,
    /// Replacing the view.
    Committing,
}

/// Resolve `target` to an absolute identifier.
pub(crate) fn resolve(
    target: NavigationTarget<'_>,
    current: Option<ItemIdRef<'_>>,
    provider: &dyn NamespaceProvider,
) -> BrowserResult<ItemIdList> {
    match target {
        NavigationTarget::Absolute(id) => {
            if id.as_id().is_root() {
                browser_trace!("navigating to the namespace root");
                return Ok(ItemIdList::root());
            }
            Ok(id.into_owned())
        }
        NavigationTarget::Parent => {
            let current = current.ok_or(BrowserError::NoCurrentFolder)?;
            browser_trace!(from = ?current, "resolving parent");
            Ok(provider.parent_of(current))
        }
        NavigationTarget::Relative(id) => {
            if id.as_id().is_root() {
                return Ok(ItemIdList::root());
            }
            let Some(current) = current else {
                return Err(BrowserError::unsupported_relative(
                    "no current folder to resolve against",
                ));
            };
            browser_trace!(base = ?current, relative = ?id.as_id(), "resolving relative");
            provider
                .combine(current, id.as_id())
                .map_err(|err| BrowserError::unsupported_relative(err.to_string()))
        }
    }
}
