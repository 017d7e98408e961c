#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ActionError;
use crate::model::{ClipboardMode, PasteRequest};

/// Planned paste: one request per clipboard path, in clipboard order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationBatch {
    pub requests: Vec<PasteRequest>,
}

/// Session-wide clipboard. Holds a snapshot of absolute paths taken at
/// copy/cut time, independent of any panel's later selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clipboard {
    content: Option<(ClipboardMode, Vec<PathBuf>)>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Option<ClipboardMode> {
        self.content.as_ref().map(|(mode, _)| *mode)
    }

    pub fn paths(&self) -> &[PathBuf] {
        self.content.as_ref().map(|(_, paths)| paths.as_slice()).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_none()
    }

    /// Replaces any previous content. An empty path list empties the clipboard.
    pub fn set_from(&mut self, mode: ClipboardMode, paths: Vec<PathBuf>) {
        self.content = if paths.is_empty() { None } else { Some((mode, paths)) };
    }

    pub fn clear(&mut self) {
        self.content = None;
    }

    /// Plans a paste into `dest_dir`. Rejects the whole batch when a source is
    /// `dest_dir` itself or one of its ancestors, after resolving symlinks.
    pub fn paste_into(&self, dest_dir: &Path) -> Result<OperationBatch, ActionError> {
        let Some((mode, sources)) = &self.content else {
            return Err(ActionError::NothingToPaste);
        };
        let resolved_dest = resolve(dest_dir);
        if let Some(source) = sources
            .iter()
            .find(|source| dest_dir.starts_with(source) || resolved_dest.starts_with(resolve_entry(source)))
        {
            return Err(ActionError::InvalidTarget(source.clone()));
        }
        let requests = sources
            .iter()
            .map(|source| PasteRequest { mode: *mode, source: source.clone(), dest_dir: dest_dir.to_path_buf() })
            .collect();
        Ok(OperationBatch { requests })
    }
}

fn resolve(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Resolves the parent only, so a symlinked source stays the link itself.
fn resolve_entry(path: &Path) -> PathBuf {
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) => resolve(parent).join(name),
        _ => resolve(path),
    }
}
