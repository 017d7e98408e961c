#![forbid(unsafe_code)]

mod app;
mod cli;
mod clipboard;
mod config;
mod controller;
mod error;
mod fs_ops;
mod group;
mod index;
mod keymap;
mod logging;
mod model;
mod pane;
mod selection;
mod ui;

use std::io;
use std::path::PathBuf;

use crate::app::App;
use crate::cli::{Cli, USAGE};
use crate::config::Settings;

fn main() -> io::Result<()> {
    let cli = match Cli::parse(std::env::args().skip(1)) {
        Ok(cli) => cli,
        Err(err) => {
            eprintln!("dualfm: {err}\n\n{USAGE}");
            std::process::exit(2);
        }
    };
    if cli.help {
        print!("{USAGE}");
        return Ok(());
    }
    if cli.version {
        println!("dualfm {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    logging::init_from_env();
    let settings = Settings::load();
    let start = start_dir(cli.start)?;
    log::info!("starting in {} with {:?}", start.display(), settings);

    let app = App::new(start, &settings, cli.exit_marker).map_err(io::Error::other)?;
    app.run()
}

fn start_dir(requested: Option<PathBuf>) -> io::Result<PathBuf> {
    let dir = match requested {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let dir = dir.canonicalize()?;
    if !dir.is_dir() {
        return Err(io::Error::new(io::ErrorKind::NotADirectory, format!("{} is not a directory", dir.display())));
    }
    Ok(dir)
}
