#![forbid(unsafe_code)]

use std::path::Path;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

pub const LOG_ENV: &str = "DUALFM_LOG";

/// Sends `log` records to the file named by `DUALFM_LOG`. Without it, logging
/// stays disabled: the terminal belongs to the UI.
pub fn init_from_env() {
    let Some(path) = std::env::var_os(LOG_ENV) else {
        return;
    };
    if let Err(err) = init_file(Path::new(&path)) {
        eprintln!("dualfm: cannot open log {}: {err}", Path::new(&path).display());
    }
}

pub fn init_file(path: &Path) -> Result<(), fern::InitError> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            let now = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
            out.finish(format_args!("{} {} {}: {}", now, record.level(), record.target(), message))
        })
        .level(log::LevelFilter::Debug)
        .chain(fern::log_file(path)?)
        .apply()?;
    Ok(())
}
