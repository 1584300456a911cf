//! The embedding control and its navigation state machine.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

use crate::dispatch::{BrowserHandle, Dispatcher};
use crate::error::{BrowserError, BrowserResult};
use crate::events::{BrowserEvent, EventQueue, ListenerId, NavigationListeners};
use crate::host::{ViewFactory, ViewportRect, WindowHandle};
use crate::interop::CallbackSurface;
use crate::item_id::ItemIdList;
use crate::namespace::{DisplayNameStyle, FolderHandle, NamespaceProvider};
use crate::navigation::{ControllerState, NavigationOutcome, NavigationRequest, resolve};
use crate::session::{ViewHostBinding, ViewOutcome, ViewSession};
use crate::settings::{BrowserSettings, PropertyStore, keys};

/// A native folder view hosted in an application window.
///
/// The browser holds the current folder, the one live view and the callback
/// surface the view talks to. It is not `Send`: every state change happens on
/// the thread that created it. Use [`handle`](Self::handle) to reach it from
/// other threads, and call [`pump`](Self::pump) (or
/// [`wait_and_pump`](Self::wait_and_pump)) from the owning thread's message
/// loop to run their requests.
///
/// # Example
///
/// ```
/// use shell_browser::headless::{HeadlessViewFactory, MemoryNamespace};
/// use shell_browser::{ItemIdList, NavigationRequest, ShellBrowser, WindowHandle};
///
/// let ns = MemoryNamespace::new("Desktop");
/// let docs = ns.add_folder("Documents").unwrap();
/// let control = WindowHandle::from_raw(0x10).unwrap();
/// let mut browser = ShellBrowser::new(control, ns, HeadlessViewFactory::new());
///
/// browser.navigate(NavigationRequest::absolute(ItemIdList::root())).unwrap();
/// browser.navigate(NavigationRequest::absolute(&docs)).unwrap();
/// assert_eq!(browser.current_folder().unwrap().id(), docs.as_id());
/// ```
pub struct ShellBrowser {
    namespace: Box<dyn NamespaceProvider>,
    host: ViewHostBinding,
    session: ViewSession,
    current: Option<FolderHandle>,
    state: ControllerState,
    listeners: NavigationListeners,
    events: Rc<EventQueue>,
    dispatcher: Arc<Dispatcher>,
    pumping: bool,
    closed: bool,
}

impl ShellBrowser {
    /// Create a browser embedded in `control`, owned by the calling thread.
    ///
    /// No view exists until the first navigation.
    pub fn new(
        control: WindowHandle,
        namespace: impl NamespaceProvider + 'static,
        factory: impl ViewFactory + 'static,
    ) -> Self {
        let dispatcher = Arc::new(Dispatcher::for_current_thread());
        let events = Rc::new(EventQueue::default());
        let surface = Rc::new(CallbackSurface::new(
            control,
            Rc::clone(&events),
            BrowserHandle::new(Arc::clone(&dispatcher)),
        ));
        browser_debug!(%control, "shell browser created");
        Self {
            namespace: Box::new(namespace),
            host: ViewHostBinding {
                control,
                viewport: ViewportRect::default(),
                settings: BrowserSettings::default(),
                factory: Box::new(factory),
                surface,
            },
            session: ViewSession::new(),
            current: None,
            state: ControllerState::Idle,
            listeners: NavigationListeners::default(),
            events,
            dispatcher,
            pumping: false,
            closed: false,
        }
    }

    /// Use `settings` for views created from now on.
    pub fn with_settings(mut self, settings: BrowserSettings) -> Self {
        self.host.settings = settings;
        self
    }

    /// Initial client area of the control.
    pub fn with_viewport(mut self, width: u32, height: u32) -> Self {
        self.host.viewport = ViewportRect::from_size(width, height);
        self
    }

    /// Navigate inline on the owning thread.
    ///
    /// Requests that arrived from other threads or from the host view while
    /// this one was in flight run afterwards, in arrival order.
    pub fn navigate(&mut self, request: NavigationRequest<'_>) -> BrowserResult<NavigationOutcome> {
        if self.closed {
            return Err(BrowserError::ContextClosed);
        }
        browser_debug!(target = ?request.target, flags = ?request.flags, "navigate");
        let result = self.navigate_now(request);
        if !self.pumping {
            self.pump();
        }
        result
    }

    fn navigate_now(&mut self, request: NavigationRequest<'_>) -> BrowserResult<NavigationOutcome> {
        self.state = ControllerState::Resolving;
        let current = self.current.as_ref().map(FolderHandle::id);
        let target = match resolve(request.target, current, &*self.namespace) {
            Ok(target) => target,
            Err(err) => return self.fail(err),
        };

        if let Some(current) = &self.current
            && current.id() == target.as_id()
            && self.session.is_live()
        {
            let _name = self
                .namespace
                .display_name(&**current.bound(), DisplayNameStyle::DesktopAbsoluteEditing)
                .unwrap_or_else(|_| format!("{target:?}"));
            browser_warn!(target = %_name, "already showing the navigation target");
            self.state = ControllerState::Idle;
            return Ok(NavigationOutcome::SameTarget);
        }

        let folder = match FolderHandle::bind(&*self.namespace, target.into()) {
            Ok(folder) => folder,
            Err(err) => return self.fail(err.into()),
        };

        self.state = ControllerState::Committing;
        match self.session.recreate(&folder, &self.host) {
            Ok(outcome) => Ok(self.commit(folder, outcome)),
            Err(fault) => {
                drop(folder);
                self.host.surface.set_active_view(None);
                self.restore_current_view();
                self.fail(BrowserError::view_creation(fault))
            }
        }
    }

    fn commit(&mut self, folder: FolderHandle, outcome: ViewOutcome) -> NavigationOutcome {
        let id = folder.id().to_owned_list();
        let previous = self.current.replace(folder);
        self.host.surface.set_active_view(self.session.view_id());

        if outcome == ViewOutcome::Placeholder {
            self.events.push(BrowserEvent::ViewCancelled {
                folder: id.clone(),
                message: self.host.settings.cancelled_text.clone(),
            });
        }
        browser_info!(folder = ?id, "navigation complete");
        self.events.push(BrowserEvent::NavigationComplete { folder: id });
        if let Some(current) = &self.current {
            self.listeners.notify(current);
        }
        if let Some(previous) = previous {
            previous.dispose();
        }
        self.state = ControllerState::Idle;

        match outcome {
            ViewOutcome::Windowed(_) => NavigationOutcome::Committed,
            ViewOutcome::Placeholder => NavigationOutcome::CommittedWithPlaceholder,
        }
    }

    /// Bring a view back for the still-current folder after a failed
    /// replacement tore the old one down.
    fn restore_current_view(&mut self) {
        let Some(current) = &self.current else {
            return;
        };
        match self.session.recreate(current, &self.host) {
            Ok(_) => {
                self.host.surface.set_active_view(self.session.view_id());
                browser_debug!(folder = ?current.id(), "restored view of the current folder");
            }
            Err(fault) => {
                browser_error!("could not restore the current folder's view: {}", fault);
                self.events.push(BrowserEvent::ViewLost {
                    folder: current.id().to_owned_list(),
                    message: fault.to_string(),
                });
            }
        }
    }

    fn fail(&mut self, err: BrowserError) -> BrowserResult<NavigationOutcome> {
        browser_warn!("navigation failed: {}", err);
        self.events.push(BrowserEvent::NavigationFailed {
            message: err.to_string(),
        });
        self.state = ControllerState::Idle;
        Err(err)
    }

    /// The committed folder.
    pub fn current_folder(&self) -> Option<&FolderHandle> {
        self.current.as_ref()
    }

    /// Display name of the committed folder.
    pub fn current_display_name(&self, style: DisplayNameStyle) -> BrowserResult<String> {
        let current = self.current.as_ref().ok_or(BrowserError::NoCurrentFolder)?;
        Ok(self.namespace.display_name(&**current.bound(), style)?)
    }

    /// Thread-safe handle for other threads and for deferred work.
    pub fn handle(&self) -> BrowserHandle {
        BrowserHandle::new(Arc::clone(&self.dispatcher))
    }

    /// The callback surface handed to host views.
    pub fn surface(&self) -> &Rc<CallbackSurface> {
        &self.host.surface
    }

    /// The embedding control.
    pub fn control(&self) -> WindowHandle {
        self.host.control
    }

    /// Navigation state.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// The view session.
    pub fn session(&self) -> &ViewSession {
        &self.session
    }

    /// Current settings.
    pub fn settings(&self) -> &BrowserSettings {
        &self.host.settings
    }

    /// Change the text the live view shows when it has nothing to show.
    ///
    /// Returns `false` when no view is live.
    pub fn set_placeholder_text(&mut self, text: &str) -> bool {
        self.session.set_placeholder_text(text)
    }

    /// Text the live view shows when it has nothing to show.
    pub fn placeholder_text(&self) -> Option<&str> {
        self.session.placeholder_text()
    }

    /// Change the empty-folder text for future views and, when a view window
    /// is live, for the current one.
    pub fn set_empty_folder_text(&mut self, text: impl Into<String>) {
        self.host.settings.empty_folder_text = text.into();
        if self.session.window().is_some() {
            self.session
                .set_placeholder_text(&self.host.settings.empty_folder_text);
        }
    }

    /// The control's client area changed.
    pub fn on_viewport_resized(&mut self, width: u32, height: u32) {
        self.host.viewport = ViewportRect::from_size(width, height);
        if self.session.resize_viewport(self.host.viewport) {
            browser_trace!(width, height, "resized view window");
        }
    }

    /// Subscribe to committed navigations.
    ///
    /// Listeners run on the owning thread after the new folder is current and
    /// before the previous one is disposed.
    pub fn on_navigation_complete<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&FolderHandle) + 'static,
    {
        self.listeners.add(Box::new(listener))
    }

    /// Unsubscribe a listener. Returns whether it was registered.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    /// Drain pending events. At most [`EVENT_QUEUE_CAPACITY`] are kept; older
    /// ones are dropped when the queue is not drained.
    ///
    /// [`EVENT_QUEUE_CAPACITY`]: crate::EVENT_QUEUE_CAPACITY
    pub fn take_events(&mut self) -> Vec<BrowserEvent> {
        self.events.take()
    }

    /// Run work queued by other threads and by the host view. Returns the
    /// number of items run.
    pub fn pump(&mut self) -> usize {
        if self.pumping {
            return 0;
        }
        self.pumping = true;
        let mut ran = 0;
        while let Some(task) = self.dispatcher.pop() {
            task(self);
            ran += 1;
        }
        self.pumping = false;
        ran
    }

    /// Block up to `timeout` for queued work, then run it.
    pub fn wait_and_pump(&mut self, timeout: Duration) -> usize {
        if self.dispatcher.wait(timeout) {
            self.pump()
        } else {
            0
        }
    }

    /// Install a hook called whenever work is queued, e.g. to post a message
    /// that makes the owning thread call [`pump`](Self::pump). The hook may
    /// run on any thread.
    pub fn set_wake_hook<F>(&self, hook: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.dispatcher.set_wake_hook(Some(Arc::new(hook)));
    }

    /// Remove the wake hook.
    pub fn clear_wake_hook(&self) {
        self.dispatcher.set_wake_hook(None);
    }

    /// Persist the settings and the committed folder.
    pub fn save_state(&self, store: &mut dyn PropertyStore) {
        self.host.settings.save(store);
        if let Some(current) = &self.current {
            store.set_property(keys::LAST_FOLDER, current.id().to_owned_list().to_hex());
        }
    }

    /// The folder persisted by [`save_state`](Self::save_state), if any.
    pub fn restore_target(store: &dyn PropertyStore) -> BrowserResult<Option<ItemIdList>> {
        store
            .property(keys::LAST_FOLDER)
            .map(|hex| {
                ItemIdList::from_hex(&hex)
                    .map_err(|err| BrowserError::settings(keys::LAST_FOLDER, err.to_string()))
            })
            .transpose()
    }

    /// Load settings from `store` and navigate to the persisted folder, or to
    /// the root when none was saved.
    pub fn restore(&mut self, store: &mut dyn PropertyStore) -> BrowserResult<NavigationOutcome> {
        self.host.settings = BrowserSettings::load(store)?;
        let target = Self::restore_target(store)?.unwrap_or_else(ItemIdList::root);
        self.navigate(NavigationRequest::absolute(target))
    }

    /// Tear down the view and the current folder and refuse further work.
    ///
    /// Safe to call more than once; also run on drop.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.dispatcher.close();
        self.session.destroy();
        self.host.surface.set_active_view(None);
        if let Some(current) = self.current.take() {
            current.dispose();
        }
        self.listeners.clear();
        self.state = ControllerState::Idle;
        browser_debug!(control = %self.host.control, "shell browser closed");
    }

    /// Whether [`close`](Self::close) has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for ShellBrowser {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for ShellBrowser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShellBrowser")
            .field("control", &self.host.control)
            .field("state", &self.state)
            .field("current", &self.current.as_ref().map(FolderHandle::id))
            .field("session", &self.session)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BindError, HostError, ViewStage};
    use crate::headless::{HeadlessViewFactory, MemoryNamespace};
    use crate::interop::{FolderViewCallback, ShellBrowserCallbacks};
    use crate::navigation::NavigationFlags;
    use crate::session::SessionState;
    use crate::settings::MemoryPropertyStore;
    use std::cell::RefCell;

    fn browser() -> (ShellBrowser, MemoryNamespace, HeadlessViewFactory) {
        let ns = MemoryNamespace::new("Desktop");
        let factory = HeadlessViewFactory::new();
        let control = WindowHandle::from_raw(0x42).unwrap();
        let browser = ShellBrowser::new(control, ns.clone(), factory.clone()).with_viewport(640, 480);
        (browser, ns, factory)
    }

    #[test]
    fn first_navigation_creates_one_view() {
        let (mut browser, _ns, factory) = browser();
        let outcome = browser
            .navigate(NavigationRequest::absolute(ItemIdList::root()))
            .unwrap();
        assert_eq!(outcome, NavigationOutcome::Committed);
        assert_eq!(browser.state(), ControllerState::Idle);
        assert_eq!(browser.session().state(), SessionState::Live);

        let ledger = factory.ledger();
        assert_eq!(ledger.live_views, 1);
        assert_eq!(ledger.windows, vec![browser.session().window().unwrap()]);
        assert_eq!(ledger.parent, Some(browser.control()));
        assert_eq!(ledger.last_bounds, Some(ViewportRect::from_size(640, 480)));
        assert_eq!(ledger.empty_text.as_deref(), Some("This folder\nis empty."));
        assert_eq!(
            browser.surface().query_active_shell_view(),
            Ok(browser.session().view_id().unwrap())
        );
    }

    #[test]
    fn listeners_see_the_new_folder_before_the_old_is_disposed() {
        let (mut browser, ns, _factory) = browser();
        let docs = ns.add_folder("Documents").unwrap();
        browser
            .navigate(NavigationRequest::absolute(ItemIdList::root()))
            .unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let probe = ns.clone();
        browser.on_navigation_complete(move |folder| {
            log.borrow_mut()
                .push((folder.id().to_owned_list(), probe.live_folders()));
        });
        browser.navigate(NavigationRequest::absolute(&docs)).unwrap();

        // Both the new and the previous folder were alive during notification.
        assert_eq!(*seen.borrow(), vec![(docs.clone(), 2)]);
        assert_eq!(ns.live_folders(), 1);
    }

    #[test]
    fn bind_failure_keeps_the_current_view() {
        let (mut browser, ns, factory) = browser();
        let usb = ns.add_folder("USB").unwrap();
        ns.revoke(&usb);
        browser
            .navigate(NavigationRequest::absolute(ItemIdList::root()))
            .unwrap();
        let window = browser.session().window();
        let transitions = browser.session().transitions();
        browser.take_events();

        let err = browser.navigate(NavigationRequest::absolute(&usb)).unwrap_err();
        assert!(matches!(err, BrowserError::Bind(BindError::Unavailable(_))));
        assert!(browser.current_folder().unwrap().id().is_root());
        assert_eq!(browser.session().window(), window);
        assert_eq!(browser.session().transitions(), transitions);
        assert_eq!(factory.ledger().live_windows, 1);
        assert!(matches!(
            browser.take_events().as_slice(),
            [BrowserEvent::NavigationFailed { .. }]
        ));
    }

    #[test]
    fn view_fault_restores_the_current_folder_view() {
        let (mut browser, ns, factory) = browser();
        let docs = ns.add_folder("Documents").unwrap();
        browser
            .navigate(NavigationRequest::absolute(ItemIdList::root()))
            .unwrap();
        factory.fail_next_view(HostError::failed("out of memory"));

        let err = browser.navigate(NavigationRequest::absolute(&docs)).unwrap_err();
        match err {
            BrowserError::ViewCreation(fault) => assert_eq!(fault.stage, ViewStage::View),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(browser.current_folder().unwrap().id().is_root());
        assert_eq!(browser.session().state(), SessionState::Live);
        let ledger = factory.ledger();
        assert_eq!(ledger.live_views, 1);
        assert_eq!(ledger.live_windows, 1);
        assert_eq!(ledger.folders, vec![ItemIdList::root()]);
        assert_eq!(ns.live_folders(), 1);
    }

    #[test]
    fn host_browse_object_runs_after_current_work() {
        let (mut browser, ns, _factory) = browser();
        let docs = ns.add_folder("Documents").unwrap();
        browser
            .navigate(NavigationRequest::absolute(ItemIdList::root()))
            .unwrap();

        browser
            .surface()
            .browse_object(docs.as_id(), NavigationFlags::SAME_BROWSER)
            .unwrap();
        assert!(browser.current_folder().unwrap().id().is_root());
        assert_eq!(browser.pump(), 1);
        assert_eq!(browser.current_folder().unwrap().id(), docs.as_id());
    }

    #[test]
    fn relative_host_navigation_combines_with_current() {
        let (mut browser, ns, _factory) = browser();
        let reports = ns.add_folder("Documents/Reports").unwrap();
        let docs = reports.parent();
        browser.navigate(NavigationRequest::absolute(&docs)).unwrap();

        let relative = ItemIdList::from_segments(["Reports"]).unwrap();
        browser
            .navigate(NavigationRequest::from_flags(&relative, NavigationFlags::RELATIVE))
            .unwrap();
        assert_eq!(browser.current_folder().unwrap().id(), reports.as_id());
        assert_eq!(
            browser
                .current_display_name(DisplayNameStyle::DesktopAbsoluteParsing)
                .unwrap(),
            "Desktop/Documents/Reports"
        );
    }

    #[test]
    fn selection_messages_become_events() {
        let (mut browser, _ns, _factory) = browser();
        browser
            .navigate(NavigationRequest::absolute(ItemIdList::root()))
            .unwrap();
        browser.take_events();
        browser
            .surface()
            .message(crate::interop::sfvm::SELECTION_CHANGED, 0, 0)
            .unwrap();
        assert_eq!(browser.take_events(), vec![BrowserEvent::SelectionChanged]);
    }

    #[test]
    fn empty_folder_text_applies_to_live_view() {
        let (mut browser, _ns, factory) = browser();
        browser
            .navigate(NavigationRequest::absolute(ItemIdList::root()))
            .unwrap();
        browser.set_empty_folder_text("Nothing to see");
        assert_eq!(browser.settings().empty_folder_text, "Nothing to see");
        assert_eq!(factory.ledger().empty_text.as_deref(), Some("Nothing to see"));
        assert_eq!(browser.placeholder_text(), Some("Nothing to see"));
    }

    #[test]
    fn save_and_restore_round_trip() {
        let (mut browser, ns, _factory) = browser();
        let docs = ns.add_folder("Documents").unwrap();
        browser.navigate(NavigationRequest::absolute(&docs)).unwrap();
        let mut store = MemoryPropertyStore::new();
        browser.save_state(&mut store);
        assert_eq!(ShellBrowser::restore_target(&store).unwrap(), Some(docs.clone()));

        let control = WindowHandle::from_raw(0x43).unwrap();
        let mut restored = ShellBrowser::new(control, ns.clone(), HeadlessViewFactory::new());
        assert_eq!(
            restored.restore(&mut store).unwrap(),
            NavigationOutcome::Committed
        );
        assert_eq!(restored.current_folder().unwrap().id(), docs.as_id());
    }

    #[test]
    fn corrupt_last_folder_is_a_settings_error() {
        let mut store = MemoryPropertyStore::new();
        store.set_property(keys::LAST_FOLDER, "ff".to_string());
        assert!(matches!(
            ShellBrowser::restore_target(&store),
            Err(BrowserError::Settings { .. })
        ));
    }

    #[test]
    fn close_is_idempotent_and_rejects_navigation() {
        let (mut browser, ns, factory) = browser();
        browser
            .navigate(NavigationRequest::absolute(ItemIdList::root()))
            .unwrap();
        browser.close();
        browser.close();
        assert!(browser.is_closed());
        assert_eq!(factory.ledger().live_views, 0);
        assert_eq!(ns.live_folders(), 0);
        assert_eq!(
            browser.navigate(NavigationRequest::absolute(ItemIdList::root())),
            Err(BrowserError::ContextClosed)
        );
        assert!(browser.handle().is_closed());
    }
}
