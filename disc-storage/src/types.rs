//! Common types shared by the scanner and its callers

/// A candidate disc image discovered during a scan.
///
/// `H` is the storage provider's opaque resource handle; the entry
/// never owns the underlying bytes. `serial` is filled in at most once
/// during discovery; `display_title` is left for a metadata
/// collaborator to assign later.
#[derive(Debug, Clone)]
pub struct GameEntry<H> {
    /// Raw file name as reported by the provider.
    pub title: String,

    /// Handle to the byte source backing this entry.
    pub resource: H,

    /// Normalized product serial, when one could be resolved.
    pub serial: Option<String>,

    /// Human-readable title, assigned by an external collaborator.
    pub display_title: Option<String>,
}

impl<H> GameEntry<H> {
    pub fn new(title: impl Into<String>, resource: H) -> Self {
        Self {
            title: title.into(),
            resource,
            serial: None,
            display_title: None,
        }
    }

    /// The file name without its final extension.
    pub fn file_title(&self) -> &str {
        match self.title.rfind('.') {
            Some(i) if i > 0 => &self.title[..i],
            _ => &self.title,
        }
    }
}

/// One child of a storage directory, as reported by the provider.
#[derive(Debug, Clone)]
pub struct ChildEntry<H> {
    pub handle: H,
    pub name: String,
    pub mime_type: Option<String>,
    pub is_directory: bool,
}

/// One line of the diagnostic listing: what the filter decided for a
/// single tree entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingStatus {
    /// Path relative to the scan root; directories carry a trailing `/`.
    pub path: String,
    pub mime_type: Option<String>,
    pub is_directory: bool,
    /// Always `false` for directories.
    pub accepted: bool,
}
