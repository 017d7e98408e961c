#![forbid(unsafe_code)]

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, SystemTime};

use crossterm::{
    cursor::MoveTo,
    event, execute,
    terminal::{Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen},
};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

use crate::error::FsError;
use crate::model::{Entry, EntryKind};

/// The OS side of the browser: every filesystem effect goes through here.
///
/// `copy` and `move_path` place `src` inside `dest_dir` under its own name and
/// never overwrite; callers that want to replace a target delete it first.
pub trait Executor {
    fn list_directory(&self, dir: &Path) -> Result<Vec<Entry>, FsError>;
    fn copy(&mut self, src: &Path, dest_dir: &Path) -> Result<(), FsError>;
    fn move_path(&mut self, src: &Path, dest_dir: &Path) -> Result<(), FsError>;
    fn delete(&mut self, path: &Path) -> Result<(), FsError>;
    fn mkdir(&mut self, path: &Path) -> Result<(), FsError>;
    fn create_file(&mut self, path: &Path) -> Result<(), FsError>;
    fn rename(&mut self, old: &Path, new: &Path) -> Result<(), FsError>;
    fn open_with_default_handler(&mut self, path: &Path) -> Result<(), FsError>;
    /// Reads at most `limit` bytes from the start of a file.
    fn read_head(&self, path: &Path, limit: usize) -> Result<Vec<u8>, FsError>;
}

#[derive(Debug, Clone)]
pub struct LocalExecutor {
    opener: String,
}

impl LocalExecutor {
    pub fn new(opener: impl Into<String>) -> Self {
        Self { opener: opener.into() }
    }
}

impl Executor for LocalExecutor {
    fn list_directory(&self, dir: &Path) -> Result<Vec<Entry>, FsError> {
        let mut entries = Vec::new();
        for item in fs::read_dir(dir)? {
            let item = item?;
            let path = item.path();
            let name = item.file_name().to_string_lossy().to_string();
            entries.push(read_entry(name, path));
        }
        Ok(entries)
    }

    fn copy(&mut self, src: &Path, dest_dir: &Path) -> Result<(), FsError> {
        let target = target_in(src, dest_dir);
        if target.symlink_metadata().is_ok() {
            return Err(FsError::AlreadyExists);
        }
        copy_entry(src, &target)?;
        log::info!("copied {} -> {}", src.display(), target.display());
        Ok(())
    }

    fn move_path(&mut self, src: &Path, dest_dir: &Path) -> Result<(), FsError> {
        let target = target_in(src, dest_dir);
        if target.symlink_metadata().is_ok() {
            return Err(FsError::AlreadyExists);
        }
        move_entry(src, &target)?;
        log::info!("moved {} -> {}", src.display(), target.display());
        Ok(())
    }

    fn delete(&mut self, path: &Path) -> Result<(), FsError> {
        remove_path(path)?;
        log::info!("deleted {}", path.display());
        Ok(())
    }

    fn mkdir(&mut self, path: &Path) -> Result<(), FsError> {
        fs::create_dir(path)?;
        log::info!("created directory {}", path.display());
        Ok(())
    }

    fn create_file(&mut self, path: &Path) -> Result<(), FsError> {
        fs::OpenOptions::new().write(true).create_new(true).open(path)?;
        log::info!("created file {}", path.display());
        Ok(())
    }

    fn rename(&mut self, old: &Path, new: &Path) -> Result<(), FsError> {
        if new.symlink_metadata().is_ok() {
            return Err(FsError::AlreadyExists);
        }
        fs::rename(old, new)?;
        log::info!("renamed {} -> {}", old.display(), new.display());
        Ok(())
    }

    fn open_with_default_handler(&mut self, path: &Path) -> Result<(), FsError> {
        let status = run_in_terminal(&self.opener, path)?;
        if status.success() {
            Ok(())
        } else {
            Err(FsError::Unknown(format!("{} exited with {}", self.opener, status)))
        }
    }

    fn read_head(&self, path: &Path, limit: usize) -> Result<Vec<u8>, FsError> {
        let file = fs::File::open(path)?;
        let mut data = Vec::with_capacity(limit.min(64 * 1024));
        file.take(limit as u64).read_to_end(&mut data)?;
        Ok(data)
    }
}

fn read_entry(name: String, path: PathBuf) -> Entry {
    let Ok(link_meta) = path.symlink_metadata() else {
        return Entry { name, path, kind: EntryKind::Other, size: 0, modified: None, permissions: 0 };
    };
    let kind = if link_meta.file_type().is_symlink() {
        match fs::metadata(&path) {
            Ok(target) if target.is_dir() => EntryKind::SymlinkToDir,
            _ => EntryKind::SymlinkToFile,
        }
    } else if link_meta.is_dir() {
        EntryKind::Directory
    } else if link_meta.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    };
    let meta = fs::metadata(&path).unwrap_or(link_meta);
    Entry {
        name,
        path,
        kind,
        size: meta.len(),
        modified: meta.modified().ok(),
        permissions: mode_bits(&meta),
    }
}

#[cfg(unix)]
fn mode_bits(meta: &fs::Metadata) -> u32 {
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_bits(meta: &fs::Metadata) -> u32 {
    if meta.permissions().readonly() { 0o444 } else { 0o644 }
}

pub fn target_in(src: &Path, dest_dir: &Path) -> PathBuf {
    match src.file_name() {
        Some(name) => dest_dir.join(name),
        None => dest_dir.to_path_buf(),
    }
}

/// Copies files and directory trees; symlinks are recreated, never followed.
pub fn copy_entry(src: &Path, dest: &Path) -> io::Result<()> {
    let file_type = src.symlink_metadata()?.file_type();
    if file_type.is_symlink() {
        copy_symlink(src, dest)
    } else if file_type.is_dir() {
        copy_dir_recursive(src, dest)
    } else {
        fs::copy(src, dest)?;
        Ok(())
    }
}

/// Renames in place; only a move across filesystems falls back to copy + remove.
pub fn move_entry(src: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(src, dest) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::CrossesDevices => {
            copy_entry(src, dest)?;
            remove_path(src)
        }
        Err(err) => Err(err),
    }
}

pub fn remove_path(path: &Path) -> io::Result<()> {
    let meta = path.symlink_metadata()?;
    if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

pub fn copy_dir_recursive(src: &Path, dest: &Path) -> io::Result<()> {
    fs::create_dir_all(dest)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let path = entry.path();
        let target = dest.join(entry.file_name());
        let file_type = entry.file_type()?;
        if file_type.is_symlink() {
            copy_symlink(&path, &target)?;
        } else if file_type.is_dir() {
            copy_dir_recursive(&path, &target)?;
        } else {
            fs::copy(&path, &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dest: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(fs::read_link(src)?, dest)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dest: &Path) -> io::Result<()> {
    fs::copy(src, dest).map(|_| ())
}

/// Runs `program path` in the foreground with the terminal handed back to it.
pub fn run_in_terminal(program: &str, path: &Path) -> io::Result<std::process::ExitStatus> {
    let mut stdout = io::stdout();
    crossterm::terminal::disable_raw_mode().ok();
    execute!(stdout, LeaveAlternateScreen)?;
    let status = Command::new(program).arg(path).status();
    execute!(stdout, EnterAlternateScreen, Clear(ClearType::All), MoveTo(0, 0))?;
    crossterm::terminal::enable_raw_mode().ok();
    while event::poll(Duration::from_millis(0))? {
        let _ = event::read();
    }
    status
}

/// Writes `dir` as plain text for a shell wrapper to `cd` into after exit.
pub fn write_exit_marker(marker: &Path, dir: &Path) -> io::Result<()> {
    fs::write(marker, dir.to_string_lossy().as_bytes())
}

/// A NUL byte in the sampled head marks the file as binary.
pub fn looks_binary(sample: &[u8]) -> bool {
    sample.iter().take(8192).any(|b| *b == 0)
}

pub fn format_size(size: u64) -> String {
    const UNITS: [&str; 5] = ["B", "K", "M", "G", "T"];
    if size < 1024 {
        return size.to_string();
    }
    let mut value = size as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1}{}", value, UNITS[unit])
}

pub fn format_time(time: Option<SystemTime>) -> String {
    let Some(time) = time else {
        return "Unknown".to_string();
    };
    let Ok(format) = time::format_description::parse("[year]-[month]-[day] [hour]:[minute]") else {
        return String::new();
    };
    let offset = time::UtcOffset::current_local_offset().unwrap_or(time::UtcOffset::UTC);
    let dt = time::OffsetDateTime::from(time).to_offset(offset);
    dt.format(&format).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("f1.txt"), vec![b'x'; 1024]).unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("sub").join("inner.txt"), b"inner").unwrap();
        dir
    }

    #[test]
    fn lists_entries_with_kinds_and_sizes() {
        let dir = fixture();
        let exec = LocalExecutor::new("true");
        let mut entries = exec.list_directory(dir.path()).unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "f1.txt");
        assert_eq!(entries[0].kind, EntryKind::File);
        assert_eq!(entries[0].size, 1024);
        assert_eq!(entries[1].kind, EntryKind::Directory);
    }

    #[cfg(unix)]
    #[test]
    fn copy_keeps_symlinks_inside_trees() {
        let dir = fixture();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("sub").join("up")).unwrap();
        let dest = TempDir::new().unwrap();
        let mut exec = LocalExecutor::new("true");
        exec.copy(&dir.path().join("sub"), dest.path()).unwrap();

        let copied = dest.path().join("sub");
        assert_eq!(fs::read(copied.join("inner.txt")).unwrap(), b"inner");
        let link = copied.join("up").symlink_metadata().unwrap();
        assert!(link.file_type().is_symlink());
        assert_eq!(fs::read_link(copied.join("up")).unwrap(), dir.path());
    }

    #[test]
    fn failed_rename_leaves_no_copy_behind() {
        let dir = fixture();
        let src = dir.path().join("sub");
        let inside = src.join("sub");
        assert!(move_entry(&src, &inside).is_err());
        assert!(!inside.exists());
        assert_eq!(fs::read(src.join("inner.txt")).unwrap(), b"inner");
    }

    #[cfg(unix)]
    #[test]
    fn classifies_symlinks_by_target() {
        let dir = fixture();
        std::os::unix::fs::symlink(dir.path().join("sub"), dir.path().join("to_sub")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("f1.txt"), dir.path().join("to_file")).unwrap();
        let exec = LocalExecutor::new("true");
        let entries = exec.list_directory(dir.path()).unwrap();
        let kind_of = |name: &str| entries.iter().find(|e| e.name == name).unwrap().kind;
        assert_eq!(kind_of("to_sub"), EntryKind::SymlinkToDir);
        assert_eq!(kind_of("to_file"), EntryKind::SymlinkToFile);
    }

    #[test]
    fn listing_a_missing_directory_fails() {
        let dir = fixture();
        let exec = LocalExecutor::new("true");
        let err = exec.list_directory(&dir.path().join("gone")).unwrap_err();
        assert_eq!(err, FsError::NotFound);
    }

    #[test]
    fn copy_places_source_inside_destination() {
        let dir = fixture();
        let dest = dir.path().join("dest");
        fs::create_dir(&dest).unwrap();
        let mut exec = LocalExecutor::new("true");
        exec.copy(&dir.path().join("sub"), &dest).unwrap();
        assert_eq!(fs::read(dest.join("sub").join("inner.txt")).unwrap(), b"inner");
        assert!(dir.path().join("sub").exists());
    }

    #[test]
    fn copy_refuses_to_overwrite() {
        let dir = fixture();
        let mut exec = LocalExecutor::new("true");
        let err = exec.copy(&dir.path().join("f1.txt"), dir.path()).unwrap_err();
        assert_eq!(err, FsError::AlreadyExists);
    }

    #[test]
    fn move_removes_the_source() {
        let dir = fixture();
        let mut exec = LocalExecutor::new("true");
        exec.move_path(&dir.path().join("f1.txt"), &dir.path().join("sub")).unwrap();
        assert!(!dir.path().join("f1.txt").exists());
        assert!(dir.path().join("sub").join("f1.txt").exists());
    }

    #[test]
    fn create_file_and_mkdir_refuse_existing_names() {
        let dir = fixture();
        let mut exec = LocalExecutor::new("true");
        assert_eq!(exec.create_file(&dir.path().join("f1.txt")), Err(FsError::AlreadyExists));
        assert_eq!(exec.mkdir(&dir.path().join("sub")), Err(FsError::AlreadyExists));
        exec.create_file(&dir.path().join("new.txt")).unwrap();
        assert!(dir.path().join("new.txt").is_file());
    }

    #[test]
    fn delete_removes_directories_recursively() {
        let dir = fixture();
        let mut exec = LocalExecutor::new("true");
        exec.delete(&dir.path().join("sub")).unwrap();
        assert!(!dir.path().join("sub").exists());
        assert_eq!(exec.delete(&dir.path().join("sub")), Err(FsError::NotFound));
    }

    #[test]
    fn read_head_stops_at_limit() {
        let dir = fixture();
        let exec = LocalExecutor::new("true");
        let head = exec.read_head(&dir.path().join("f1.txt"), 10).unwrap();
        assert_eq!(head.len(), 10);
    }

    #[test]
    fn exit_marker_holds_the_plain_path() {
        let dir = fixture();
        let marker = dir.path().join("lastdir");
        write_exit_marker(&marker, &dir.path().join("sub")).unwrap();
        let written = fs::read_to_string(&marker).unwrap();
        assert_eq!(written, dir.path().join("sub").to_string_lossy());
    }

    #[test]
    fn binary_detection_uses_nul_bytes() {
        assert!(looks_binary(b"abc\0def"));
        assert!(!looks_binary("plain text\n".as_bytes()));
    }

    #[test]
    fn sizes_are_human_readable() {
        assert_eq!(format_size(0), "0");
        assert_eq!(format_size(1023), "1023");
        assert_eq!(format_size(1024), "1.0K");
        assert_eq!(format_size(1536 * 1024), "1.5M");
    }

    #[test]
    fn missing_time_is_unknown() {
        assert_eq!(format_time(None), "Unknown");
    }
}
