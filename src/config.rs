#![forbid(unsafe_code)]

use std::fs;
use std::path::{Path, PathBuf};

pub const OPENER_ENV: &str = "DUALFM_OPENER";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub show_hidden: bool,
    pub dual_panel: bool,
    pub preview_limit_kb: u64,
    pub opener: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            show_hidden: false,
            dual_panel: false,
            preview_limit_kb: 512,
            opener: "xdg-open".to_string(),
        }
    }
}

impl Settings {
    pub fn preview_limit_bytes(&self) -> u64 {
        self.preview_limit_kb.saturating_mul(1024)
    }

    /// Defaults, then the settings file, then environment overrides.
    pub fn load() -> Self {
        let mut settings = match settings_path() {
            Some(path) => Self::from_file(&path),
            None => Self::default(),
        };
        settings.apply_env(|key| std::env::var(key).ok());
        settings
    }

    pub fn from_file(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(content) => Self::parse(&content),
            Err(err) => {
                log::debug!("no settings at {}: {err}", path.display());
                Self::default()
            }
        }
    }

    /// `key = value` lines; `#` starts a comment line. Bad lines are skipped.
    pub fn parse(content: &str) -> Self {
        let mut settings = Self::default();
        for (number, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some((key, value)) = line.split_once('=') else {
                log::warn!("settings line {}: expected key = value", number + 1);
                continue;
            };
            let (key, value) = (key.trim(), value.trim());
            let applied = match key {
                "show_hidden" => parse_bool(value).map(|v| settings.show_hidden = v),
                "dual_panel" => parse_bool(value).map(|v| settings.dual_panel = v),
                "preview_limit_kb" => value.parse().ok().map(|v| settings.preview_limit_kb = v),
                "opener" if !value.is_empty() => {
                    settings.opener = value.to_string();
                    Some(())
                }
                _ => None,
            };
            if applied.is_none() {
                log::warn!("settings line {}: ignoring {key} = {value}", number + 1);
            }
        }
        settings
    }

    pub fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(opener) = get(OPENER_ENV).filter(|v| !v.trim().is_empty()) {
            self.opener = opener;
        }
    }
}

pub fn settings_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(Path::new(&home).join(".dualfm").join("settings.txt"))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_known_keys() {
        let settings = Settings::parse(
            "# comment\nshow_hidden = yes\ndual_panel=on\npreview_limit_kb = 64\nopener = less\n",
        );
        assert_eq!(
            settings,
            Settings {
                show_hidden: true,
                dual_panel: true,
                preview_limit_kb: 64,
                opener: "less".to_string(),
            }
        );
        assert_eq!(settings.preview_limit_bytes(), 64 * 1024);
    }

    #[test]
    fn bad_lines_keep_defaults() {
        let settings = Settings::parse("show_hidden = maybe\nwat\ncolour = blue\npreview_limit_kb = -3\n");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        assert_eq!(Settings::from_file(&dir.path().join("nope.txt")), Settings::default());
    }

    #[test]
    fn environment_overrides_opener() {
        let mut settings = Settings::default();
        settings.apply_env(|key| (key == OPENER_ENV).then(|| "vim".to_string()));
        assert_eq!(settings.opener, "vim");
        settings.apply_env(|_| Some("  ".to_string()));
        assert_eq!(settings.opener, "vim");
    }
}
