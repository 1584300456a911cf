//! The live native view and its rehosted window.
//!
//! A [`ViewSession`] owns at most one view instance. The instance and its
//! window are held together by `LiveView`, whose destructor tears them down
//! in reverse order: destroy the window, deactivate, release. Construction
//! builds a `LiveView` step by step and simply drops it when a step fails,
//! so a partially built view never outlives the failed call.

use std::fmt;
use std::rc::Rc;

use crate::error::{HostError, ViewCreationFault, ViewStage};
use crate::host::{ActivationState, HostView, ViewFactory, ViewId, ViewportRect, WindowHandle};
use crate::interop::CallbackSurface;
use crate::namespace::FolderHandle;
use crate::settings::BrowserSettings;

/// Lifecycle state of a [`ViewSession`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No view.
    #[default]
    Empty,
    /// A view is being built.
    Creating,
    /// A view is alive.
    Live,
    /// The view is being torn down.
    Destroying,
}

/// How a successfully created view is presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ViewOutcome {
    /// The view window is rehosted in the control.
    Windowed(WindowHandle),
    /// Device access was declined; placeholder text is shown instead of a
    /// window.
    Placeholder,
}

/// Everything a session needs from the embedding control to build a view.
pub(crate) struct ViewHostBinding {
    pub(crate) control: WindowHandle,
    pub(crate) viewport: ViewportRect,
    pub(crate) settings: BrowserSettings,
    pub(crate) factory: Box<dyn ViewFactory>,
    pub(crate) surface: Rc<CallbackSurface>,
}

struct LiveView {
    id: ViewId,
    view: Box<dyn HostView>,
    window: Option<WindowHandle>,
    activated: bool,
    empty_text: Option<String>,
}

impl LiveView {
    fn show_text(&mut self, text: &str) -> Result<(), HostError> {
        self.empty_text = Some(text.to_string());
        match self.view.folder_view() {
            Some(folder_view) => folder_view.set_empty_text(text),
            None => Ok(()),
        }
    }
}

impl Drop for LiveView {
    fn drop(&mut self) {
        if let Some(window) = self.window.take() {
            browser_trace!(view = self.id.0, %window, "destroying view window");
            self.view.destroy_window(window);
        }
        if self.activated
            && let Err(_err) = self.view.ui_activate(ActivationState::Deactivate)
        {
            browser_debug!("view deactivation failed: {}", _err);
        }
        browser_trace!(view = self.id.0, "releasing view");
    }
}

/// Owner of the one live native view of a browser.
#[derive(Default)]
pub struct ViewSession {
    state: SessionState,
    live: Option<LiveView>,
    last_id: u64,
    transitions: u64,
}

impl ViewSession {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Whether a view is alive.
    pub fn is_live(&self) -> bool {
        self.state == SessionState::Live
    }

    /// The rehosted view window, if the view has one.
    pub fn window(&self) -> Option<WindowHandle> {
        self.live.as_ref().and_then(|live| live.window)
    }

    /// Token of the live view.
    pub fn view_id(&self) -> Option<ViewId> {
        self.live.as_ref().map(|live| live.id)
    }

    /// Text the live view shows when it has nothing else to show.
    pub fn placeholder_text(&self) -> Option<&str> {
        self.live.as_ref().and_then(|live| live.empty_text.as_deref())
    }

    /// Number of state transitions since the session was created.
    pub fn transitions(&self) -> u64 {
        self.transitions
    }

    fn enter(&mut self, state: SessionState) {
        browser_trace!(from = ?self.state, to = ?state, "view session transition");
        self.state = state;
        self.transitions += 1;
    }

    fn fault(&mut self, stage: ViewStage, source: HostError) -> ViewCreationFault {
        self.enter(SessionState::Empty);
        ViewCreationFault::new(stage, source)
    }

    /// Replace the live view with one bound to `folder`.
    ///
    /// The previous view is torn down before the new one is built. On a fault
    /// the partially built view is torn down as well and the session is left
    /// `Empty`.
    pub(crate) fn recreate(
        &mut self,
        folder: &FolderHandle,
        host: &ViewHostBinding,
    ) -> Result<ViewOutcome, ViewCreationFault> {
        self.enter(SessionState::Creating);
        drop(self.live.take());

        self.last_id += 1;
        let id = ViewId(self.last_id);
        let view = match host.factory.create_view(folder, &host.surface) {
            Ok(view) => view,
            Err(err) => return Err(self.fault(ViewStage::View, err)),
        };
        browser_trace!(view = id.0, folder = ?folder.id(), "created view instance");

        let mut live = LiveView {
            id,
            view,
            window: None,
            activated: false,
            empty_text: None,
        };
        if let Err(_err) = live.show_text(&host.settings.empty_folder_text) {
            browser_debug!("could not set empty-folder text: {}", _err);
        }
        if let Some(folder_view) = live.view.folder_view() {
            match folder_view.current_view_mode() {
                Ok(_mode) => {
                    browser_debug!(mode = %_mode, "host view mode");
                }
                Err(_err) => {
                    browser_debug!("host view mode unavailable: {}", _err);
                }
            }
        }

        let created = live.view.create_window(
            host.control,
            &host.settings.view,
            host.viewport,
            &host.surface,
        );
        match created {
            Ok(window) => live.window = Some(window),
            Err(err) if err.is_cancelled() => {
                browser_info!(folder = ?folder.id(), "device access declined, showing placeholder");
                if let Err(_err) = live.show_text(&host.settings.cancelled_text) {
                    browser_debug!("could not set placeholder text: {}", _err);
                }
            }
            Err(err) => {
                drop(live);
                return Err(self.fault(ViewStage::Window, err));
            }
        }

        if let Err(err) = live.view.ui_activate(ActivationState::ActivateNoFocus) {
            drop(live);
            return Err(self.fault(ViewStage::Activation, err));
        }
        live.activated = true;

        let outcome = match live.window {
            Some(window) => ViewOutcome::Windowed(window),
            None => ViewOutcome::Placeholder,
        };
        self.live = Some(live);
        self.enter(SessionState::Live);
        Ok(outcome)
    }

    /// Keep the window sized to the control's client area.
    ///
    /// Applies only while `Live` with a real window.
    pub(crate) fn resize_viewport(&mut self, bounds: ViewportRect) -> bool {
        if self.state != SessionState::Live {
            return false;
        }
        match self.live.as_mut() {
            Some(LiveView {
                view,
                window: Some(window),
                ..
            }) => {
                view.move_window(*window, bounds);
                true
            }
            _ => false,
        }
    }

    /// Change the text the live view shows when empty. Applies only while
    /// `Live`.
    pub(crate) fn set_placeholder_text(&mut self, text: &str) -> bool {
        if self.state != SessionState::Live {
            return false;
        }
        let Some(live) = self.live.as_mut() else {
            return false;
        };
        if let Err(_err) = live.show_text(text) {
            browser_debug!("could not set placeholder text: {}", _err);
        }
        true
    }

    /// Tear the live view down. Safe to call repeatedly.
    pub(crate) fn destroy(&mut self) {
        if self.live.is_none() && self.state == SessionState::Empty {
            return;
        }
        self.enter(SessionState::Destroying);
        drop(self.live.take());
        self.enter(SessionState::Empty);
    }
}

impl fmt::Debug for ViewSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewSession")
            .field("state", &self.state)
            .field("view", &self.view_id())
            .field("window", &self.window())
            .field("transitions", &self.transitions)
            .finish()
    }
}
