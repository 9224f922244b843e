//! Auxiliary file buffers and their naming rules.

use std::collections::BTreeMap;

/// Client-local handle of a file buffer. Never sent to the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub(crate) u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub id: FileId,
    pub name: String,
    pub content: String,
}

impl FileEntry {
    pub fn has_valid_name(&self) -> bool {
        is_valid_file_name(&self.name)
    }
}

/// Names the service accepts: `[0-9A-Za-z_]+`.
pub fn is_valid_file_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Smallest `file<N>` (N >= 1) not already used by an entry.
pub fn next_file_name(files: &[FileEntry]) -> String {
    (1..)
        .map(|n| format!("file{}", n))
        .find(|candidate| !files.iter().any(|f| &f.name == candidate))
        .unwrap_or_default()
}

/// Wire mapping of name to content. A repeated name keeps the later entry.
pub fn file_map(files: &[FileEntry]) -> BTreeMap<String, String> {
    files
        .iter()
        .map(|f| (f.name.clone(), f.content.clone()))
        .collect()
}
