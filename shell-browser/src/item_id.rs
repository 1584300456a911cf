//! Hierarchical item identifiers.
//!
//! An identifier is an opaque byte sequence made of segments, one per level
//! below the namespace root. Each segment is stored as a little-endian `u16`
//! size (covering the size field itself) followed by the segment payload, the
//! same framing a shell item ID list uses. The empty sequence is the root.
//!
//! Ownership is explicit:
//! - [`ItemIdList`] owns its bytes and releases them exactly once, on drop.
//! - [`ItemIdRef`] borrows bytes owned elsewhere.
//! - [`ItemIdentifier`] tags one or the other, for APIs that accept either and
//!   must copy a borrowed identifier before storing it.

use std::fmt;

use thiserror::Error;

const SIZE_FIELD: usize = 2;
const MAX_SEGMENT: usize = u16::MAX as usize - SIZE_FIELD;

/// Malformed identifier bytes or segments.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ItemIdError {
    /// A segment payload is empty.
    #[error("empty segment at index {index}")]
    EmptySegment {
        /// Segment index.
        index: usize,
    },
    /// A segment payload does not fit the size field.
    #[error("segment of {len} bytes exceeds the maximum of 65533")]
    SegmentTooLong {
        /// Payload length.
        len: usize,
    },
    /// The byte framing is inconsistent.
    #[error("malformed identifier at byte {offset}")]
    Malformed {
        /// Offset of the bad size field.
        offset: usize,
    },
    /// The hex text could not be decoded.
    #[error("invalid hex identifier")]
    InvalidHex,
}

fn validate(bytes: &[u8]) -> Result<(), ItemIdError> {
    let mut offset = 0;
    while offset < bytes.len() {
        let Some(size) = bytes.get(offset..offset + SIZE_FIELD) else {
            return Err(ItemIdError::Malformed { offset });
        };
        let size = u16::from_le_bytes([size[0], size[1]]) as usize;
        if size <= SIZE_FIELD || offset + size > bytes.len() {
            return Err(ItemIdError::Malformed { offset });
        }
        offset += size;
    }
    Ok(())
}

/// Borrowed item identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ItemIdRef<'a> {
    bytes: &'a [u8],
}

impl<'a> ItemIdRef<'a> {
    /// The namespace root.
    pub const ROOT: ItemIdRef<'static> = ItemIdRef { bytes: &[] };

    /// Borrow validated identifier bytes.
    pub fn from_bytes(bytes: &'a [u8]) -> Result<Self, ItemIdError> {
        validate(bytes)?;
        Ok(Self { bytes })
    }

    /// The encoded bytes.
    pub fn as_bytes(self) -> &'a [u8] {
        self.bytes
    }

    /// Whether this is the namespace root.
    pub fn is_root(self) -> bool {
        self.bytes.is_empty()
    }

    /// Iterate over segment payloads, root-most first.
    pub fn segments(self) -> Segments<'a> {
        Segments { rest: self.bytes }
    }

    /// Number of levels below the root.
    pub fn depth(self) -> usize {
        self.segments().count()
    }

    /// Payload of the deepest segment, `None` for the root.
    pub fn last_segment(self) -> Option<&'a [u8]> {
        self.segments().last()
    }

    /// The parent identifier. The root is its own parent.
    pub fn parent(self) -> ItemIdRef<'a> {
        let mut end = 0;
        let mut prev = 0;
        for segment in self.segments() {
            prev = end;
            end += segment.len() + SIZE_FIELD;
        }
        ItemIdRef {
            bytes: &self.bytes[..prev],
        }
    }

    /// Whether `self` is an ancestor of `candidate`.
    ///
    /// With `immediate_only == false` every identifier counts as its own
    /// ancestor and the root is an ancestor of everything. With
    /// `immediate_only == true` the candidate must be a direct child.
    pub fn is_ancestor_of(self, candidate: ItemIdRef<'_>, immediate_only: bool) -> bool {
        if !candidate.bytes.starts_with(self.bytes) {
            return false;
        }
        if !immediate_only {
            return true;
        }
        ItemIdRef {
            bytes: &candidate.bytes[self.bytes.len()..],
        }
        .depth()
            == 1
    }

    /// The part of `self` below `ancestor`, if `ancestor` is an ancestor.
    pub fn strip_prefix(self, ancestor: ItemIdRef<'_>) -> Option<ItemIdRef<'a>> {
        self.bytes
            .strip_prefix(ancestor.bytes)
            .map(|bytes| ItemIdRef { bytes })
    }

    /// Iterate from `self` up to and including the root.
    pub fn ancestors(self) -> impl Iterator<Item = ItemIdRef<'a>> {
        let mut next = Some(self);
        std::iter::from_fn(move || {
            let current = next?;
            next = if current.is_root() {
                None
            } else {
                Some(current.parent())
            };
            Some(current)
        })
    }

    /// Copy into an owned identifier.
    pub fn to_owned_list(self) -> ItemIdList {
        ItemIdList {
            bytes: self.bytes.to_vec(),
        }
    }
}

impl fmt::Debug for ItemIdRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut list = f.debug_list();
        for segment in self.segments() {
            match std::str::from_utf8(segment) {
                Ok(text) => list.entry(&text),
                Err(_) => list.entry(&hex(segment)),
            };
        }
        list.finish()
    }
}

/// Iterator over segment payloads.
#[derive(Clone, Debug)]
pub struct Segments<'a> {
    rest: &'a [u8],
}

impl<'a> Iterator for Segments<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        if self.rest.len() < SIZE_FIELD {
            return None;
        }
        let size = u16::from_le_bytes([self.rest[0], self.rest[1]]) as usize;
        let (segment, rest) = self.rest.split_at(size);
        self.rest = rest;
        Some(&segment[SIZE_FIELD..])
    }
}

/// Owned item identifier.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct ItemIdList {
    bytes: Vec<u8>,
}

impl ItemIdList {
    /// The namespace root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Take ownership of validated identifier bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ItemIdError> {
        validate(&bytes)?;
        Ok(Self { bytes })
    }

    /// Build an identifier from segment payloads, root-most first.
    pub fn from_segments<I, S>(segments: I) -> Result<Self, ItemIdError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let mut id = Self::root();
        for (index, segment) in segments.into_iter().enumerate() {
            let segment = segment.as_ref();
            if segment.is_empty() {
                return Err(ItemIdError::EmptySegment { index });
            }
            id.push_segment(segment)?;
        }
        Ok(id)
    }

    /// Append one level.
    pub fn push_segment(&mut self, segment: &[u8]) -> Result<(), ItemIdError> {
        if segment.is_empty() {
            return Err(ItemIdError::EmptySegment {
                index: self.depth(),
            });
        }
        if segment.len() > MAX_SEGMENT {
            return Err(ItemIdError::SegmentTooLong { len: segment.len() });
        }
        let size = (segment.len() + SIZE_FIELD) as u16;
        self.bytes.extend_from_slice(&size.to_le_bytes());
        self.bytes.extend_from_slice(segment);
        Ok(())
    }

    /// Borrow as an [`ItemIdRef`].
    pub fn as_id(&self) -> ItemIdRef<'_> {
        ItemIdRef { bytes: &self.bytes }
    }

    /// The encoded bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Whether this is the namespace root.
    pub fn is_root(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Number of levels below the root.
    pub fn depth(&self) -> usize {
        self.as_id().depth()
    }

    /// Iterate over segment payloads.
    pub fn segments(&self) -> Segments<'_> {
        self.as_id().segments()
    }

    /// The parent identifier. The root is its own parent.
    pub fn parent(&self) -> ItemIdList {
        self.as_id().parent().to_owned_list()
    }

    /// `self` followed by the segments of `relative`.
    pub fn join(&self, relative: ItemIdRef<'_>) -> ItemIdList {
        let mut bytes = Vec::with_capacity(self.bytes.len() + relative.bytes.len());
        bytes.extend_from_slice(&self.bytes);
        bytes.extend_from_slice(relative.bytes);
        ItemIdList { bytes }
    }

    /// Lower-case hex encoding, for string-keyed persistence.
    pub fn to_hex(&self) -> String {
        hex(&self.bytes)
    }

    /// Decode [`to_hex`](Self::to_hex) output.
    pub fn from_hex(text: &str) -> Result<Self, ItemIdError> {
        let text = text.trim();
        if text.len() % 2 != 0 {
            return Err(ItemIdError::InvalidHex);
        }
        let bytes = (0..text.len())
            .step_by(2)
            .map(|i| {
                text.get(i..i + 2)
                    .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                    .ok_or(ItemIdError::InvalidHex)
            })
            .collect::<Result<Vec<u8>, _>>()?;
        Self::from_bytes(bytes)
    }
}

impl fmt::Debug for ItemIdList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.as_id(), f)
    }
}

impl PartialEq<ItemIdRef<'_>> for ItemIdList {
    fn eq(&self, other: &ItemIdRef<'_>) -> bool {
        self.bytes == other.bytes
    }
}

impl PartialEq<ItemIdList> for ItemIdRef<'_> {
    fn eq(&self, other: &ItemIdList) -> bool {
        self.bytes == other.bytes.as_slice()
    }
}

fn hex(bytes: &[u8]) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// An identifier that is either owned by the holder or borrowed from the
/// caller.
///
/// Only the owned form is released by the holder; a borrowed one must be
/// copied with [`into_owned`](Self::into_owned) before it is stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ItemIdentifier<'a> {
    /// Released by whoever holds this value.
    Owned(ItemIdList),
    /// Owned by the caller.
    Borrowed(ItemIdRef<'a>),
}

impl<'a> ItemIdentifier<'a> {
    /// View the identifier without changing ownership.
    pub fn as_id(&self) -> ItemIdRef<'_> {
        match self {
            ItemIdentifier::Owned(list) => list.as_id(),
            ItemIdentifier::Borrowed(id) => *id,
        }
    }

    /// Whether the holder owns the bytes.
    pub fn is_owned(&self) -> bool {
        matches!(self, ItemIdentifier::Owned(_))
    }

    /// Take ownership, copying a borrowed identifier.
    pub fn into_owned(self) -> ItemIdList {
        match self {
            ItemIdentifier::Owned(list) => list,
            ItemIdentifier::Borrowed(id) => id.to_owned_list(),
        }
    }

    /// Convert to the owned form with a `'static` lifetime.
    pub fn into_static(self) -> ItemIdentifier<'static> {
        ItemIdentifier::Owned(self.into_owned())
    }
}

impl From<ItemIdList> for ItemIdentifier<'_> {
    fn from(list: ItemIdList) -> Self {
        ItemIdentifier::Owned(list)
    }
}

impl<'a> From<ItemIdRef<'a>> for ItemIdentifier<'a> {
    fn from(id: ItemIdRef<'a>) -> Self {
        ItemIdentifier::Borrowed(id)
    }
}

impl<'a> From<&'a ItemIdList> for ItemIdentifier<'a> {
    fn from(list: &'a ItemIdList) -> Self {
        ItemIdentifier::Borrowed(list.as_id())
    }
}
