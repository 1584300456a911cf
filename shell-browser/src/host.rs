//! Contracts with the host view factory and the values passed across them.

use std::fmt;
use std::num::NonZeroUsize;
use std::rc::Rc;
use std::str::FromStr;

use bitflags::bitflags;

use crate::error::HostError;
use crate::interop::CallbackSurface;
use crate::namespace::FolderHandle;

/// Native window handle. Never null.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct WindowHandle(NonZeroUsize);

impl WindowHandle {
    /// Wrap a raw handle; `None` for a null handle.
    pub fn from_raw(raw: usize) -> Option<Self> {
        NonZeroUsize::new(raw).map(Self)
    }

    /// The raw handle value.
    pub fn as_raw(self) -> usize {
        self.0.get()
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Client-area rectangle in physical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ViewportRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

impl ViewportRect {
    /// A rectangle anchored at the client origin.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self {
            x: 0,
            y: 0,
            width,
            height,
        }
    }
}

/// View mode of the host folder view (`FOLDERVIEWMODE` values).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ViewMode {
    /// Let the host choose.
    #[default]
    Auto,
    /// Large icons.
    Icon,
    /// Small icons.
    SmallIcon,
    /// List.
    List,
    /// Details with columns.
    Details,
    /// Thumbnails.
    Thumbnail,
    /// Tiles.
    Tile,
    /// Filmstrip.
    ThumbStrip,
    /// Content.
    Content,
}

impl ViewMode {
    const ALL: [ViewMode; 9] = [
        ViewMode::Auto,
        ViewMode::Icon,
        ViewMode::SmallIcon,
        ViewMode::List,
        ViewMode::Details,
        ViewMode::Thumbnail,
        ViewMode::Tile,
        ViewMode::ThumbStrip,
        ViewMode::Content,
    ];

    /// Raw host value.
    pub fn raw(self) -> i32 {
        match self {
            ViewMode::Auto => -1,
            ViewMode::Icon => 1,
            ViewMode::SmallIcon => 2,
            ViewMode::List => 3,
            ViewMode::Details => 4,
            ViewMode::Thumbnail => 5,
            ViewMode::Tile => 6,
            ViewMode::ThumbStrip => 7,
            ViewMode::Content => 8,
        }
    }

    /// Decode a raw host value.
    pub fn from_raw(raw: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|mode| mode.raw() == raw)
    }

    /// Stable name used for persistence.
    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Auto => "auto",
            ViewMode::Icon => "icon",
            ViewMode::SmallIcon => "small_icon",
            ViewMode::List => "list",
            ViewMode::Details => "details",
            ViewMode::Thumbnail => "thumbnail",
            ViewMode::Tile => "tile",
            ViewMode::ThumbStrip => "thumb_strip",
            ViewMode::Content => "content",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s.trim())
            .ok_or_else(|| format!("unknown view mode `{s}`"))
    }
}

bitflags! {
    /// Folder view options (`FOLDERFLAGS` values).
    #[repr(transparent)]
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct FolderFlags: u32 {
        /// Arrange items automatically.
        const AUTO_ARRANGE = 0x1;
        /// Abbreviated names.
        const ABBREVIATED_NAMES = 0x2;
        /// Snap to grid.
        const SNAP_TO_GRID = 0x4;
        /// The view owns its data.
        const OWNER_DATA = 0x8;
        /// Use the best fit window size.
        const BEST_FIT_WINDOW = 0x10;
        /// Desktop view.
        const DESKTOP = 0x20;
        /// Single selection only.
        const SINGLE_SEL = 0x40;
        /// Hide subfolders.
        const NO_SUBFOLDERS = 0x80;
        /// Transparent background.
        const TRANSPARENT = 0x100;
        /// No client edge.
        const NO_CLIENT_EDGE = 0x200;
        /// No scroll bars.
        const NO_SCROLL = 0x400;
        /// Align items to the left.
        const ALIGN_LEFT = 0x800;
        /// No icons.
        const NO_ICONS = 0x1000;
        /// Always show the selection.
        const SHOW_SEL_ALWAYS = 0x2000;
        /// Hide file names.
        const HIDE_FILE_NAMES = 0x20000;
        /// Check boxes for selection.
        const CHECK_SELECT = 0x40000;
        /// Hide column headers in every view mode.
        const NO_HEADER_IN_ALL_VIEWS = 0x1000000;
    }
}

/// Settings handed to the host when a view window is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewSettings {
    /// Initial view mode.
    pub view_mode: ViewMode,
    /// View options.
    pub flags: FolderFlags,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            view_mode: ViewMode::Auto,
            flags: FolderFlags::NO_HEADER_IN_ALL_VIEWS,
        }
    }
}

/// UI activation requested from a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivationState {
    /// Deactivate before release.
    Deactivate,
    /// Active without keyboard focus.
    ActivateNoFocus,
    /// Active with keyboard focus.
    ActivateFocus,
}

/// Token identifying one view instance for the lifetime of a browser.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId(pub u64);

/// Secondary capability some host views expose.
pub trait FolderView {
    /// Text shown when the folder has no items (or no window).
    fn set_empty_text(&mut self, text: &str) -> Result<(), HostError>;

    /// The view mode the host actually chose.
    fn current_view_mode(&self) -> Result<ViewMode, HostError>;
}

/// One native view instance created by a [`ViewFactory`].
///
/// Dropping the value releases the instance.
pub trait HostView {
    /// Create the view window as a child of `parent`.
    fn create_window(
        &mut self,
        parent: WindowHandle,
        settings: &ViewSettings,
        bounds: ViewportRect,
        surface: &Rc<CallbackSurface>,
    ) -> Result<WindowHandle, HostError>;

    /// Destroy a window returned by [`create_window`](Self::create_window).
    fn destroy_window(&mut self, window: WindowHandle);

    /// Move and resize the view window.
    fn move_window(&mut self, window: WindowHandle, bounds: ViewportRect);

    /// Change UI activation.
    fn ui_activate(&mut self, state: ActivationState) -> Result<(), HostError>;

    /// The folder-view capability, when the host offers it.
    fn folder_view(&mut self) -> Option<&mut dyn FolderView> {
        None
    }
}

/// Outbound contract to the host's view factory.
pub trait ViewFactory {
    /// Create a view instance bound to `folder`.
    fn create_view(
        &self,
        folder: &FolderHandle,
        surface: &Rc<CallbackSurface>,
    ) -> Result<Box<dyn HostView>, HostError>;
}
