//! In-memory collaborators for running without a native shell.
//!
//! [`MemoryNamespace`] is a namespace of named folders and
//! [`HeadlessViewFactory`] creates views that only record what a native host
//! would have done. Both are cheap handles over shared state, so a test can
//! keep one clone while the browser owns another and inspect the
//! [`HostLedger`] afterwards.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use crate::error::{BindError, HostError, NameError, hresult};
use crate::host::{
    ActivationState, FolderView, HostView, ViewFactory, ViewMode, ViewSettings, ViewportRect,
    WindowHandle,
};
use crate::interop::{CallbackSurface, ShellBrowserCallbacks};
use crate::item_id::{ItemIdError, ItemIdList, ItemIdRef};
use crate::namespace::{BoundFolder, DisplayNameStyle, FolderHandle, NamespaceProvider};

#[derive(Debug, Default)]
struct NamespaceState {
    root_name: String,
    folders: RefCell<HashSet<ItemIdList>>,
    denied: RefCell<HashSet<ItemIdList>>,
    revoked: RefCell<HashSet<ItemIdList>>,
    live: Rc<Cell<usize>>,
}

/// A namespace of folders held in memory.
#[derive(Clone, Debug)]
pub struct MemoryNamespace {
    state: Rc<NamespaceState>,
}

impl MemoryNamespace {
    /// Create a namespace whose root displays as `root_name`.
    pub fn new(root_name: impl Into<String>) -> Self {
        Self {
            state: Rc::new(NamespaceState {
                root_name: root_name.into(),
                ..NamespaceState::default()
            }),
        }
    }

    /// Add a folder by `/`-separated path, creating missing ancestors.
    pub fn add_folder(&self, path: &str) -> Result<ItemIdList, ItemIdError> {
        let mut id = ItemIdList::root();
        let mut folders = self.state.folders.borrow_mut();
        for name in path.split('/').filter(|s| !s.is_empty()) {
            id.push_segment(name.as_bytes())?;
            folders.insert(id.clone());
        }
        Ok(id)
    }

    /// Whether `id` names a folder.
    pub fn contains(&self, id: ItemIdRef<'_>) -> bool {
        id.is_root() || self.state.folders.borrow().contains(&id.to_owned_list())
    }

    /// Make binds of `id` fail with [`BindError::AccessDenied`].
    pub fn deny(&self, id: &ItemIdList) {
        self.state.denied.borrow_mut().insert(id.clone());
    }

    /// Make binds of `id` fail with [`BindError::Unavailable`], as for a
    /// removed device.
    pub fn revoke(&self, id: &ItemIdList) {
        self.state.revoked.borrow_mut().insert(id.clone());
    }

    /// Undo [`deny`](Self::deny) and [`revoke`](Self::revoke).
    pub fn restore(&self, id: &ItemIdList) {
        self.state.denied.borrow_mut().remove(id);
        self.state.revoked.borrow_mut().remove(id);
    }

    /// Number of bound folder objects still alive.
    pub fn live_folders(&self) -> usize {
        self.state.live.get()
    }

    fn name_of(&self, id: ItemIdRef<'_>) -> String {
        match id.last_segment() {
            Some(segment) => String::from_utf8_lossy(segment).into_owned(),
            None => self.state.root_name.clone(),
        }
    }

    fn absolute_name(&self, id: ItemIdRef<'_>) -> String {
        let mut name = self.state.root_name.clone();
        for segment in id.segments() {
            name.push('/');
            name.push_str(&String::from_utf8_lossy(segment));
        }
        name
    }
}

impl NamespaceProvider for MemoryNamespace {
    fn bind(&self, id: ItemIdRef<'_>) -> Result<Rc<dyn BoundFolder>, BindError> {
        let owned = id.to_owned_list();
        if self.state.denied.borrow().contains(&owned) {
            return Err(BindError::AccessDenied(self.absolute_name(id)));
        }
        if self.state.revoked.borrow().contains(&owned) {
            return Err(BindError::Unavailable(self.absolute_name(id)));
        }
        if !self.contains(id) {
            return Err(BindError::NotFound(self.absolute_name(id)));
        }
        Ok(Rc::new(MemoryFolder::new(
            owned,
            self.name_of(id),
            self.absolute_name(id),
            Rc::clone(&self.state.live),
        )))
    }
}

/// Folder bound by [`MemoryNamespace`].
#[derive(Debug)]
pub struct MemoryFolder {
    id: ItemIdList,
    name: String,
    absolute: String,
    live: Rc<Cell<usize>>,
}

impl MemoryFolder {
    fn new(id: ItemIdList, name: String, absolute: String, live: Rc<Cell<usize>>) -> Self {
        live.set(live.get() + 1);
        Self {
            id,
            name,
            absolute,
            live,
        }
    }

    /// Identifier the folder was bound for.
    pub fn id(&self) -> &ItemIdList {
        &self.id
    }
}

impl Drop for MemoryFolder {
    fn drop(&mut self) {
        self.live.set(self.live.get().saturating_sub(1));
    }
}

impl BoundFolder for MemoryFolder {
    fn display_name(&self, style: DisplayNameStyle) -> Result<String, NameError> {
        Ok(match style {
            DisplayNameStyle::Normal
            | DisplayNameStyle::InFolder
            | DisplayNameStyle::ForParsing
            | DisplayNameStyle::ForEditing => self.name.clone(),
            DisplayNameStyle::DesktopAbsoluteParsing
            | DisplayNameStyle::DesktopAbsoluteEditing => self.absolute.clone(),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// What the headless host has been asked to do.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HostLedger {
    /// View instances not yet released.
    pub live_views: usize,
    /// View instances ever created.
    pub views_created: usize,
    /// Windows not yet destroyed.
    pub live_windows: usize,
    /// Windows ever created.
    pub windows_created: usize,
    /// Activation calls.
    pub activations: usize,
    /// Deactivation calls.
    pub deactivations: usize,
    /// Last empty text set on any view.
    pub empty_text: Option<String>,
    /// Last bounds a window was created or moved with.
    pub last_bounds: Option<ViewportRect>,
    /// Settings of the last window created.
    pub last_settings: Option<ViewSettings>,
    /// Parent of the last window created.
    pub parent: Option<WindowHandle>,
    /// Windows not yet destroyed.
    pub windows: Vec<WindowHandle>,
    /// Folders of the views not yet released.
    pub folders: Vec<ItemIdList>,
}

#[derive(Debug)]
struct HostState {
    ledger: HostLedger,
    next_window: usize,
    fail_view: Option<HostError>,
    fail_window: Option<HostError>,
    fail_activation: Option<HostError>,
    no_folder_view: bool,
}

impl Default for HostState {
    fn default() -> Self {
        Self {
            ledger: HostLedger::default(),
            next_window: 0x1000,
            fail_view: None,
            fail_window: None,
            fail_activation: None,
            no_folder_view: false,
        }
    }
}

/// [`ViewFactory`] whose views only record what they were asked to do.
#[derive(Clone, Debug, Default)]
pub struct HeadlessViewFactory {
    state: Rc<RefCell<HostState>>,
}

impl HeadlessViewFactory {
    /// Create a factory with an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Views created from now on do not offer the folder-view capability.
    pub fn without_folder_view(self) -> Self {
        self.state.borrow_mut().no_folder_view = true;
        self
    }

    /// Snapshot of the ledger.
    pub fn ledger(&self) -> HostLedger {
        self.state.borrow().ledger.clone()
    }

    /// Fail the next view creation with `error`.
    pub fn fail_next_view(&self, error: HostError) {
        self.state.borrow_mut().fail_view = Some(error);
    }

    /// Fail the next window creation with `error`.
    pub fn fail_next_window(&self, error: HostError) {
        self.state.borrow_mut().fail_window = Some(error);
    }

    /// Fail the next activation with `error`.
    pub fn fail_next_activation(&self, error: HostError) {
        self.state.borrow_mut().fail_activation = Some(error);
    }
}

impl ViewFactory for HeadlessViewFactory {
    fn create_view(
        &self,
        folder: &FolderHandle,
        _surface: &Rc<CallbackSurface>,
    ) -> Result<Box<dyn HostView>, HostError> {
        let mut state = self.state.borrow_mut();
        if let Some(err) = state.fail_view.take() {
            return Err(err);
        }
        let id = folder.id().to_owned_list();
        state.ledger.live_views += 1;
        state.ledger.views_created += 1;
        state.ledger.folders.push(id.clone());
        Ok(Box::new(HeadlessView {
            state: Rc::clone(&self.state),
            folder_id: id,
            _folder: Rc::clone(folder.bound()),
            window: None,
            mode: ViewMode::Auto,
            folder_view: !state.no_folder_view,
        }))
    }
}

struct HeadlessView {
    state: Rc<RefCell<HostState>>,
    folder_id: ItemIdList,
    _folder: Rc<dyn BoundFolder>,
    window: Option<WindowHandle>,
    mode: ViewMode,
    folder_view: bool,
}

impl HostView for HeadlessView {
    fn create_window(
        &mut self,
        parent: WindowHandle,
        settings: &ViewSettings,
        bounds: ViewportRect,
        surface: &Rc<CallbackSurface>,
    ) -> Result<WindowHandle, HostError> {
        // A native view asks its site for the frame window first.
        let site = surface
            .get_window()
            .map_err(|err| HostError::new(err.hresult(), "site has no window"))?;
        if site != parent {
            return Err(HostError::new(
                hresult::E_INVALIDARG,
                "parent is not the site window",
            ));
        }

        let mut state = self.state.borrow_mut();
        if let Some(err) = state.fail_window.take() {
            return Err(err);
        }
        let window = WindowHandle::from_raw(state.next_window)
            .ok_or_else(|| HostError::failed("window handles exhausted"))?;
        state.next_window += 4;
        state.ledger.live_windows += 1;
        state.ledger.windows_created += 1;
        state.ledger.windows.push(window);
        state.ledger.last_bounds = Some(bounds);
        state.ledger.last_settings = Some(*settings);
        state.ledger.parent = Some(parent);
        self.window = Some(window);
        self.mode = settings.view_mode;
        Ok(window)
    }

    fn destroy_window(&mut self, window: WindowHandle) {
        let mut state = self.state.borrow_mut();
        let before = state.ledger.windows.len();
        state.ledger.windows.retain(|w| *w != window);
        if state.ledger.windows.len() != before {
            state.ledger.live_windows -= 1;
        }
        if self.window == Some(window) {
            self.window = None;
        }
    }

    fn move_window(&mut self, _window: WindowHandle, bounds: ViewportRect) {
        self.state.borrow_mut().ledger.last_bounds = Some(bounds);
    }

    fn ui_activate(&mut self, activation: ActivationState) -> Result<(), HostError> {
        let mut state = self.state.borrow_mut();
        if activation != ActivationState::Deactivate
            && let Some(err) = state.fail_activation.take()
        {
            return Err(err);
        }
        match activation {
            ActivationState::Deactivate => state.ledger.deactivations += 1,
            ActivationState::ActivateNoFocus | ActivationState::ActivateFocus => {
                state.ledger.activations += 1
            }
        }
        Ok(())
    }

    fn folder_view(&mut self) -> Option<&mut dyn FolderView> {
        if self.folder_view { Some(self) } else { None }
    }
}

impl FolderView for HeadlessView {
    fn set_empty_text(&mut self, text: &str) -> Result<(), HostError> {
        self.state.borrow_mut().ledger.empty_text = Some(text.to_string());
        Ok(())
    }

    fn current_view_mode(&self) -> Result<ViewMode, HostError> {
        Ok(match self.mode {
            ViewMode::Auto => ViewMode::Details,
            mode => mode,
        })
    }
}

impl Drop for HeadlessView {
    fn drop(&mut self) {
        let mut state = self.state.borrow_mut();
        state.ledger.live_views -= 1;
        if let Some(pos) = state.ledger.folders.iter().position(|f| *f == self.folder_id) {
            state.ledger.folders.remove(pos);
        }
    }
}
