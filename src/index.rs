#![forbid(unsafe_code)]

use std::cmp::Ordering;
use std::path::{Path, PathBuf};

use crate::error::ActionError;
use crate::fs_ops::Executor;
use crate::model::Entry;

/// Cached listing of one directory plus the view rules applied on top of it.
///
/// Entries are replaced wholesale on `refresh`; the hidden, filter and search
/// settings only change what `visible_entries` yields.
#[derive(Debug, Clone)]
pub struct DirectoryIndex {
    path: PathBuf,
    entries: Vec<Entry>,
    show_hidden: bool,
    filter_text: Option<String>,
    search_text: Option<String>,
}

impl DirectoryIndex {
    pub fn new(path: PathBuf, show_hidden: bool) -> Self {
        Self {
            path,
            entries: Vec::new(),
            show_hidden,
            filter_text: None,
            search_text: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn show_hidden(&self) -> bool {
        self.show_hidden
    }

    pub fn filter_text(&self) -> Option<&str> {
        self.filter_text.as_deref()
    }

    pub fn search_text(&self) -> Option<&str> {
        self.search_text.as_deref()
    }

    /// Re-reads the directory. On failure the previous entries stay in place.
    pub fn refresh(&mut self, exec: &impl Executor) -> Result<(), ActionError> {
        let mut entries = exec.list_directory(&self.path).map_err(|source| {
            log::warn!("listing {} failed: {source}", self.path.display());
            ActionError::Access { path: self.path.clone(), source }
        })?;
        entries.sort_by(cmp_entries);
        self.entries = entries;
        Ok(())
    }

    pub fn set_filter(&mut self, text: &str) {
        let text = text.trim().to_lowercase();
        self.filter_text = if text.is_empty() { None } else { Some(text) };
    }

    pub fn clear_filter(&mut self) {
        self.filter_text = None;
    }

    pub fn set_search(&mut self, text: &str) {
        let text = text.trim().to_lowercase();
        self.search_text = if text.is_empty() { None } else { Some(text) };
    }

    pub fn clear_search(&mut self) {
        self.search_text = None;
    }

    pub fn set_hidden(&mut self, show: bool) {
        self.show_hidden = show;
    }

    /// Entries passing the hidden rule, then the filter, in listing order.
    pub fn visible_entries(&self) -> impl Iterator<Item = &Entry> + Clone + '_ {
        self.entries.iter().filter(move |entry| {
            (self.show_hidden || !entry.is_hidden())
                && self.filter_text.as_deref().is_none_or(|f| matches_filter(&entry.name, f))
        })
    }

    pub fn visible_len(&self) -> usize {
        self.visible_entries().count()
    }

    pub fn visible_at(&self, index: usize) -> Option<&Entry> {
        self.visible_entries().nth(index)
    }

    pub fn position_of(&self, name: &str) -> Option<usize> {
        self.visible_entries().position(|entry| entry.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    pub fn is_search_hit(&self, entry: &Entry) -> bool {
        self.search_text
            .as_deref()
            .is_some_and(|query| entry.name.to_lowercase().contains(query))
    }
}

/// Directories first, then case-insensitive name; exact name breaks ties.
pub fn cmp_entries(a: &Entry, b: &Entry) -> Ordering {
    match (a.kind.is_dir_like(), b.kind.is_dir_like()) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name)),
    }
}

/// `filter` is already lower-cased. Matches a name substring or the extension.
pub fn matches_filter(name: &str, filter: &str) -> bool {
    let name = name.to_lowercase();
    if name.contains(filter) {
        return true;
    }
    let wanted = filter.trim_start_matches('.');
    !wanted.is_empty()
        && name
            .rsplit_once('.')
            .is_some_and(|(stem, ext)| !stem.is_empty() && ext == wanted)
}
