#![deny(missing_docs)]
//! Host a native shell folder view inside an application window.
//!
//! The crate owns the part of an embedded folder browser that is easy to get
//! wrong: which native view instance is alive, where its window lives, and how
//! navigation requests are sequenced. Rendering, enumeration, icons and
//! drag-and-drop stay with the host view.
//!
//! The moving parts:
//! - [`ItemIdList`] / [`ItemIdRef`] / [`ItemIdentifier`]: hierarchical item
//!   identifiers with explicit owned/borrowed forms.
//! - [`FolderHandle`]: a folder bound by a [`NamespaceProvider`].
//! - [`ViewSession`]: one native view plus its rehosted window.
//! - [`ShellBrowser`]: the embedding control and navigation state machine.
//! - [`CallbackSurface`]: the callback contracts the host view talks to.
//!
//! All state lives on the thread that created the [`ShellBrowser`]; other
//! threads reach it through a [`BrowserHandle`], which hands work over and
//! blocks until the owning thread has run it.
//!
//! Two collaborator sets ship with the crate:
//! - [`FsNamespace`] maps a directory tree onto item identifiers.
//! - [`headless`] provides an in-memory namespace and view factory for
//!   tests and for running without a native shell.

#[macro_use]
mod logging;

mod browser;
mod dispatch;
mod error;
mod events;
mod fs;
mod fs_namespace;
pub mod headless;
mod host;
mod interop;
mod item_id;
mod namespace;
mod navigation;
mod session;
mod settings;

pub use browser::ShellBrowser;
pub use dispatch::BrowserHandle;
pub use error::{
    BindError, BrowserError, BrowserResult, CallbackError, CallbackResult, HostError, NameError,
    ViewCreationFault, ViewStage, hresult,
};
pub use events::{BrowserEvent, EVENT_QUEUE_CAPACITY, ListenerId};
pub use fs::{EntryInfo, FileSystem, StdFileSystem};
pub use fs_namespace::{FsFolder, FsNamespace};
pub use host::{
    ActivationState, FolderFlags, FolderView, HostView, ViewFactory, ViewId, ViewMode,
    ViewSettings, ViewportRect, WindowHandle,
};
pub use interop::{
    CallbackSurface, Capability, ControlWindow, FolderViewCallback, Guid, HostMessage,
    IID_SHELL_BROWSER, IID_SHELL_FOLDER_VIEW_CB, ServiceProvider, ShellBrowserCallbacks, sfvm,
};
pub use item_id::{ItemIdError, ItemIdList, ItemIdRef, ItemIdentifier, Segments};
pub use logging::{init_tracing, init_tracing_dev, init_tracing_with_filter};
pub use namespace::{BoundFolder, DisplayNameStyle, FolderHandle, NamespaceProvider};
pub use navigation::{
    ControllerState, NavigationFlags, NavigationOutcome, NavigationRequest, NavigationTarget,
};
pub use session::{SessionState, ViewOutcome, ViewSession};
pub use settings::{BrowserSettings, MemoryPropertyStore, PropertyStore, keys};
