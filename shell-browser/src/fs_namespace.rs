//! A namespace over a directory tree.
//!
//! Each path component below the root directory becomes one identifier
//! segment holding the component's UTF-8 name.

use std::any::Any;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

use crate::error::{BindError, NameError};
use crate::fs::{FileSystem, StdFileSystem};
use crate::item_id::{ItemIdList, ItemIdRef};
use crate::namespace::{BoundFolder, DisplayNameStyle, NamespaceProvider};

/// [`NamespaceProvider`] rooted at a directory.
#[derive(Clone, Debug)]
pub struct FsNamespace<F: FileSystem = StdFileSystem> {
    root: PathBuf,
    fs: F,
}

impl FsNamespace<StdFileSystem> {
    /// Root the namespace at `root` using `std::fs`.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        Self::with_fs(root, StdFileSystem)
    }
}

impl<F: FileSystem> FsNamespace<F> {
    /// Root the namespace at `root` using a custom file system.
    pub fn with_fs(root: impl AsRef<Path>, fs: F) -> io::Result<Self> {
        let root = fs.canonicalize(root.as_ref())?;
        Ok(Self { root, fs })
    }

    /// Canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Identifier for a path inside the root.
    pub fn id_for_path(&self, path: impl AsRef<Path>) -> Result<ItemIdList, BindError> {
        let path = path.as_ref();
        let display = path.display().to_string();
        let canonical = self.fs.canonicalize(path).map_err(|e| io_to_bind(e, &display))?;
        let relative = canonical
            .strip_prefix(&self.root)
            .map_err(|_| BindError::NotFound(display.clone()))?;

        let mut id = ItemIdList::root();
        for component in relative.components() {
            let Component::Normal(name) = component else {
                return Err(BindError::NotFound(display));
            };
            let name = name
                .to_str()
                .ok_or_else(|| BindError::Unavailable(format!("non UTF-8 name in {display}")))?;
            id.push_segment(name.as_bytes())
                .map_err(|e| BindError::Unavailable(e.to_string()))?;
        }
        Ok(id)
    }

    /// Path for an identifier produced by [`id_for_path`](Self::id_for_path).
    pub fn path_for_id(&self, id: ItemIdRef<'_>) -> Result<PathBuf, BindError> {
        let mut path = self.root.clone();
        for segment in id.segments() {
            let name = std::str::from_utf8(segment)
                .map_err(|_| BindError::NotFound(format!("{id:?}")))?;
            let mut components = Path::new(name).components();
            match (components.next(), components.next()) {
                (Some(Component::Normal(_)), None) => path.push(name),
                _ => return Err(BindError::NotFound(format!("{id:?}"))),
            }
        }
        Ok(path)
    }
}

impl<F: FileSystem> NamespaceProvider for FsNamespace<F> {
    fn bind(&self, id: ItemIdRef<'_>) -> Result<Rc<dyn BoundFolder>, BindError> {
        let path = self.path_for_id(id)?;
        let shown = path.display().to_string();
        let md = self.fs.entry_info(&path).map_err(|e| io_to_bind(e, &shown))?;
        if !md.is_dir {
            return Err(BindError::NotAFolder(shown));
        }
        browser_trace!(path = %shown, symlink = md.is_symlink, "bound directory");
        Ok(Rc::new(FsFolder {
            root: id.is_root(),
            path,
            is_symlink: md.is_symlink,
        }))
    }
}

fn io_to_bind(err: io::Error, display: &str) -> BindError {
    match err.kind() {
        io::ErrorKind::NotFound => BindError::NotFound(display.to_string()),
        io::ErrorKind::PermissionDenied => BindError::AccessDenied(display.to_string()),
        _ => BindError::Unavailable(format!("{display}: {err}")),
    }
}

/// Directory bound by [`FsNamespace`].
#[derive(Clone, Debug)]
pub struct FsFolder {
    root: bool,
    path: PathBuf,
    is_symlink: bool,
}

impl FsFolder {
    /// Filesystem path of the directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the directory was reached through a symbolic link.
    pub fn is_symlink(&self) -> bool {
        self.is_symlink
    }
}

impl BoundFolder for FsFolder {
    fn display_name(&self, style: DisplayNameStyle) -> Result<String, NameError> {
        let full = self.path.display().to_string();
        match style {
            DisplayNameStyle::Normal | DisplayNameStyle::InFolder | DisplayNameStyle::ForEditing => {
                if self.root {
                    return Ok(full);
                }
                self.path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .ok_or(NameError::Unavailable(full))
            }
            DisplayNameStyle::ForParsing
            | DisplayNameStyle::DesktopAbsoluteParsing
            | DisplayNameStyle::DesktopAbsoluteEditing => Ok(full),
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
