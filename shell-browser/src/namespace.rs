//! Namespace provider seam and bound folders.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::error::{BindError, HostError, NameError};
use crate::item_id::{ItemIdList, ItemIdRef, ItemIdentifier};

/// Display-name styles understood by namespace providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DisplayNameStyle {
    /// Name shown in a list view.
    Normal,
    /// Name relative to the parent folder.
    InFolder,
    /// Parsing name relative to the parent folder.
    ForParsing,
    /// Name relative to the parent folder, for an edit box.
    ForEditing,
    /// Full parsing name from the namespace root.
    DesktopAbsoluteParsing,
    /// Full name from the namespace root, for an address bar.
    DesktopAbsoluteEditing,
}

/// A folder object produced by [`NamespaceProvider::bind`].
///
/// View factories receive the folder through [`FolderHandle::bound`] and may
/// downcast it with [`as_any`](Self::as_any) to reach provider-specific state.
pub trait BoundFolder: fmt::Debug {
    /// Display name of the folder in the given style.
    fn display_name(&self, style: DisplayNameStyle) -> Result<String, NameError>;

    /// Provider-specific access.
    fn as_any(&self) -> &dyn Any;
}

/// Outbound contract to the host's namespace.
pub trait NamespaceProvider {
    /// Bind an identifier to a folder object.
    fn bind(&self, id: ItemIdRef<'_>) -> Result<Rc<dyn BoundFolder>, BindError>;

    /// Combine an absolute base with an identifier relative to it.
    ///
    /// The default appends the relative segments below the base.
    fn combine(&self, base: ItemIdRef<'_>, relative: ItemIdRef<'_>) -> Result<ItemIdList, HostError> {
        Ok(base.to_owned_list().join(relative))
    }

    /// Parent of an identifier; the root is its own parent.
    fn parent_of(&self, id: ItemIdRef<'_>) -> ItemIdList {
        id.parent().to_owned_list()
    }

    /// Display name of a bound folder.
    fn display_name(
        &self,
        folder: &dyn BoundFolder,
        style: DisplayNameStyle,
    ) -> Result<String, NameError> {
        folder.display_name(style)
    }
}

/// A folder bound for one identifier.
///
/// A handle is released by [`dispose`](Self::dispose), which consumes it, or by
/// dropping it; either way exactly once.
pub struct FolderHandle {
    id: ItemIdList,
    folder: Rc<dyn BoundFolder>,
}

impl FolderHandle {
    /// Resolve `id` against `provider`.
    ///
    /// On failure nothing is retained.
    pub fn bind(
        provider: &dyn NamespaceProvider,
        id: ItemIdentifier<'_>,
    ) -> Result<FolderHandle, BindError> {
        let id = id.into_owned();
        let folder = provider.bind(id.as_id())?;
        browser_trace!(id = ?id, "bound folder");
        Ok(FolderHandle { id, folder })
    }

    /// Identifier this folder was bound for.
    pub fn id(&self) -> ItemIdRef<'_> {
        self.id.as_id()
    }

    /// The provider's folder object.
    pub fn bound(&self) -> &Rc<dyn BoundFolder> {
        &self.folder
    }

    /// Display name in the given style.
    pub fn display_name(&self, style: DisplayNameStyle) -> Result<String, NameError> {
        self.folder.display_name(style)
    }

    /// Release the folder.
    pub fn dispose(self) {
        browser_trace!(id = ?self.id, "disposing folder");
        drop(self);
    }
}

impl fmt::Debug for FolderHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FolderHandle")
            .field("id", &self.id)
            .field("folder", &self.folder)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::MemoryNamespace;

    #[test]
    fn bind_copies_borrowed_identifier() {
        let ns = MemoryNamespace::new("Desktop");
        let docs = ns.add_folder("Documents").unwrap();
        let folder = FolderHandle::bind(&ns, ItemIdentifier::from(&docs)).unwrap();
        drop(docs);
        assert_eq!(folder.id().depth(), 1);
        assert_eq!(
            folder.display_name(DisplayNameStyle::Normal).unwrap(),
            "Documents"
        );
    }

    #[test]
    fn failed_bind_retains_nothing() {
        let ns = MemoryNamespace::new("Desktop");
        let missing = ItemIdList::from_segments(["Nowhere"]).unwrap();
        let err = FolderHandle::bind(&ns, missing.into()).unwrap_err();
        assert!(matches!(err, BindError::NotFound(_)));
        assert_eq!(ns.live_folders(), 0);
    }

    #[test]
    fn dispose_releases_the_bound_folder() {
        let ns = MemoryNamespace::new("Desktop");
        let folder = FolderHandle::bind(&ns, ItemIdList::root().into()).unwrap();
        assert_eq!(ns.live_folders(), 1);
        folder.dispose();
        assert_eq!(ns.live_folders(), 0);
    }

    #[test]
    fn default_combine_appends_relative_segments() {
        let ns = MemoryNamespace::new("Desktop");
        let base = ItemIdList::from_segments(["a"]).unwrap();
        let rel = ItemIdList::from_segments(["b"]).unwrap();
        let combined = ns.combine(base.as_id(), rel.as_id()).unwrap();
        assert_eq!(combined, ItemIdList::from_segments(["a", "b"]).unwrap());
        assert_eq!(ns.parent_of(combined.as_id()), base);
    }
}
