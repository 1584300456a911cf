//! Callback contracts the host view calls back into.
//!
//! The host negotiates capabilities by identifier. Only two are offered, the
//! browser contract ([`ShellBrowserCallbacks`]) and the message hook
//! ([`FolderViewCallback`]); both are served by one [`CallbackSurface`] and
//! selected by [`ServiceProvider::query_service`]. Everything the surface does
//! not implement answers [`CallbackError::NotImplemented`] explicitly.
//!
//! Callbacks arrive on the owning thread while the browser may be in the
//! middle of a navigation, so they only read state shared through the surface
//! and queue work; they never reenter the browser.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::dispatch::BrowserHandle;
use crate::error::{CallbackError, CallbackResult};
use crate::events::{BrowserEvent, EventQueue};
use crate::host::{ViewId, WindowHandle};
use crate::item_id::ItemIdRef;
use crate::navigation::{NavigationFlags, NavigationRequest};

/// 128-bit capability identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Guid(u128);

impl Guid {
    /// Build from the big-endian textual value.
    pub const fn from_u128(value: u128) -> Self {
        Self(value)
    }

    /// The big-endian value.
    pub const fn as_u128(self) -> u128 {
        self.0
    }

    /// Parse `XXXXXXXX-XXXX-XXXX-XXXX-XXXXXXXXXXXX`, with or without braces.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let text = text
            .strip_prefix('{')
            .and_then(|t| t.strip_suffix('}'))
            .unwrap_or(text);
        if text.len() != 36 {
            return None;
        }
        let bytes = text.as_bytes();
        if [8, 13, 18, 23].iter().any(|&i| bytes[i] != b'-') {
            return None;
        }
        let digits: String = text.chars().filter(|&c| c != '-').collect();
        if digits.len() != 32 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        u128::from_str_radix(&digits, 16).ok().map(Self)
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let v = self.0;
        write!(
            f,
            "{:08X}-{:04X}-{:04X}-{:04X}-{:012X}",
            (v >> 96) as u32,
            (v >> 80) as u16,
            (v >> 64) as u16,
            (v >> 48) as u16,
            v & 0xFFFF_FFFF_FFFF
        )
    }
}

impl fmt::Debug for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{self}}}")
    }
}

/// The browser capability (`IShellBrowser`).
pub const IID_SHELL_BROWSER: Guid = Guid::from_u128(0x000214E2_0000_0000_C000_000000000046);

/// The view message-hook capability (`IShellFolderViewCB`).
pub const IID_SHELL_FOLDER_VIEW_CB: Guid =
    Guid::from_u128(0x2047E320_F2A9_11CE_AE65_08002B2E1262);

/// Message codes recognised by [`FolderViewCallback::message`].
pub mod sfvm {
    /// The selection in the view changed.
    pub const SELECTION_CHANGED: u32 = 8;
    /// The view finished refreshing its item list.
    pub const LIST_REFRESHED: u32 = 17;
}

/// Frame controls the host may ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlWindow {
    /// Toolbar.
    Toolbar,
    /// Status bar.
    StatusBar,
    /// Tree pane.
    Tree,
    /// Progress bar.
    Progress,
}

/// An opaque host message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HostMessage {
    /// Message code.
    pub message: u32,
    /// First parameter.
    pub wparam: usize,
    /// Second parameter.
    pub lparam: isize,
}

/// The browser contract a host view queries its site for.
///
/// Only [`get_window`](Self::get_window), [`browse_object`](Self::browse_object)
/// and [`query_active_shell_view`](Self::query_active_shell_view) do anything;
/// menus, toolbars and modeless negotiation are not hosted.
pub trait ShellBrowserCallbacks {
    /// Handle of the embedding control.
    fn get_window(&self) -> CallbackResult<WindowHandle>;

    /// Enter or leave context-sensitive help mode.
    fn context_sensitive_help(&self, _enter: bool) -> CallbackResult<()> {
        Err(CallbackError::NotImplemented)
    }

    /// Contribute menus to a shared menu.
    fn insert_menus(&self, _menu: usize) -> CallbackResult<()> {
        Err(CallbackError::NotImplemented)
    }

    /// Install a composite menu.
    fn set_menu(&self, _menu: usize, _window: Option<WindowHandle>) -> CallbackResult<()> {
        Err(CallbackError::NotImplemented)
    }

    /// Remove contributed menus.
    fn remove_menus(&self, _menu: usize) -> CallbackResult<()> {
        Err(CallbackError::NotImplemented)
    }

    /// Show status text.
    fn set_status_text(&self, _text: &str) -> CallbackResult<()> {
        Err(CallbackError::NotImplemented)
    }

    /// Enable or disable modeless dialogs.
    fn enable_modeless(&self, _enable: bool) -> CallbackResult<()> {
        Err(CallbackError::NotImplemented)
    }

    /// Offer a keystroke to the frame's accelerators.
    fn translate_accelerator(&self, _message: HostMessage) -> CallbackResult<()> {
        Err(CallbackError::NotImplemented)
    }

    /// Navigate to another folder at the view's request.
    fn browse_object(&self, id: ItemIdRef<'_>, flags: NavigationFlags) -> CallbackResult<()>;

    /// Stream for persisting view state.
    fn get_view_state_stream(&self, _mode: u32) -> CallbackResult<()> {
        Err(CallbackError::NotImplemented)
    }

    /// Handle of a frame control.
    fn get_control_window(&self, _control: ControlWindow) -> CallbackResult<WindowHandle> {
        Err(CallbackError::NotImplemented)
    }

    /// Send a message to a frame control.
    fn send_control_msg(
        &self,
        _control: ControlWindow,
        _message: HostMessage,
    ) -> CallbackResult<isize> {
        Err(CallbackError::NotImplemented)
    }

    /// The currently live view.
    fn query_active_shell_view(&self) -> CallbackResult<ViewId>;

    /// A view window became active.
    fn on_view_window_active(&self, _view: ViewId) -> CallbackResult<()> {
        Err(CallbackError::NotImplemented)
    }

    /// Add toolbar buttons.
    fn set_toolbar_items(&self, _buttons: &[u32], _flags: u32) -> CallbackResult<()> {
        Err(CallbackError::NotImplemented)
    }
}

/// The view's message hook.
pub trait FolderViewCallback {
    /// Handle a host-defined message code.
    ///
    /// Unrecognised codes answer [`CallbackError::NotImplemented`].
    fn message(&self, code: u32, wparam: usize, lparam: isize) -> CallbackResult<isize>;
}

/// A capability handed out by [`ServiceProvider::query_service`].
#[derive(Clone, Copy)]
pub enum Capability<'a> {
    /// The browser contract.
    Browser(&'a dyn ShellBrowserCallbacks),
    /// The view message hook.
    ViewCallback(&'a dyn FolderViewCallback),
}

impl fmt::Debug for Capability<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Browser(_) => f.write_str("Capability::Browser"),
            Capability::ViewCallback(_) => f.write_str("Capability::ViewCallback"),
        }
    }
}

/// Capability lookup by identifier.
pub trait ServiceProvider {
    /// Look up the capability `iid`. The service identifier is not consulted.
    fn query_service(&self, service: Guid, iid: Guid) -> CallbackResult<Capability<'_>>;
}

/// The object the host view holds as its site.
///
/// Created once per browser and shared with every view the browser creates.
pub struct CallbackSurface {
    control: WindowHandle,
    active_view: Cell<Option<ViewId>>,
    events: Rc<EventQueue>,
    handle: BrowserHandle,
}

impl CallbackSurface {
    pub(crate) fn new(control: WindowHandle, events: Rc<EventQueue>, handle: BrowserHandle) -> Self {
        Self {
            control,
            active_view: Cell::new(None),
            events,
            handle,
        }
    }

    pub(crate) fn set_active_view(&self, view: Option<ViewId>) {
        self.active_view.set(view);
    }

    /// The live view, if any.
    pub fn active_view(&self) -> Option<ViewId> {
        self.active_view.get()
    }

    /// Handle of the embedding control.
    pub fn control(&self) -> WindowHandle {
        self.control
    }
}

impl ShellBrowserCallbacks for CallbackSurface {
    fn get_window(&self) -> CallbackResult<WindowHandle> {
        Ok(self.control)
    }

    fn browse_object(&self, id: ItemIdRef<'_>, flags: NavigationFlags) -> CallbackResult<()> {
        let request = NavigationRequest::from_flags(id, flags).into_owned();
        browser_debug!(?flags, "host requested navigation");
        self.handle
            .post(move |browser| {
                if let Err(_err) = browser.navigate(request) {
                    browser_warn!("host navigation failed: {}", _err);
                }
            })
            .map_err(|_| CallbackError::Failed)
    }

    fn query_active_shell_view(&self) -> CallbackResult<ViewId> {
        self.active_view.get().ok_or(CallbackError::Failed)
    }
}

impl FolderViewCallback for CallbackSurface {
    fn message(&self, code: u32, _wparam: usize, _lparam: isize) -> CallbackResult<isize> {
        match code {
            sfvm::SELECTION_CHANGED => {
                browser_debug!("SFVM_SELECTIONCHANGED");
                self.events.push(BrowserEvent::SelectionChanged);
                Ok(0)
            }
            sfvm::LIST_REFRESHED => {
                browser_debug!("SFVM_LISTREFRESHED");
                self.events.push(BrowserEvent::ListRefreshed);
                Ok(0)
            }
            _ => Err(CallbackError::NotImplemented),
        }
    }
}

impl ServiceProvider for CallbackSurface {
    fn query_service(&self, _service: Guid, iid: Guid) -> CallbackResult<Capability<'_>> {
        match iid {
            IID_SHELL_BROWSER => Ok(Capability::Browser(self)),
            IID_SHELL_FOLDER_VIEW_CB => Ok(Capability::ViewCallback(self)),
            _ => {
                browser_trace!(%iid, "capability not offered");
                Err(CallbackError::NoInterface)
            }
        }
    }
}

impl fmt::Debug for CallbackSurface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackSurface")
            .field("control", &self.control)
            .field("active_view", &self.active_view.get())
            .finish_non_exhaustive()
    }
}
