//! spotwm
//!
//! A tiling X11 window manager that splits every monitor into three fixed
//! spots: one large, two small. Windows are placed, focused and stacked per
//! spot; there are no workspaces and no floating layer.

mod config;
mod launcher;
mod shared;
mod wm;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::Command;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::launcher::ShellLauncher;
use crate::wm::backend::ClientMessageKind;
use crate::wm::display::X11Display;
use crate::wm::keyboard::resolve_bindings;
use crate::wm::{Outcome, WindowManager};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Ask the running instance to restart or exit instead of starting one
    #[arg(value_enum)]
    control: Option<Control>,

    /// Read the configuration from this file instead of ~/.config/spotwm
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Control {
    Restart,
    Exit,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "spotwm=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    if let Some(control) = args.control {
        let display = X11Display::connect()?;
        let kind = match control {
            Control::Restart => ClientMessageKind::Restart,
            Control::Exit => ClientMessageKind::Exit,
        };
        display.send_control(kind)?;
        info!("Sent {:?} to the running instance", control);
        return Ok(());
    }

    info!("Starting spotwm");
    match run(&args) {
        Ok(Outcome::Exit) => {
            info!("Exiting");
            Ok(())
        }
        Ok(Outcome::Restart) => restart(),
        Err(e) => {
            error!("{:#}", e);
            Err(e)
        }
    }
}

fn run(args: &Args) -> Result<Outcome> {
    let config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let display = X11Display::connect()?;
    display.become_wm()?;

    let bindings = resolve_bindings(&config.bindings);
    display.grab_keys(&bindings)?;
    display.grab_buttons()?;
    launcher::spawn_reaper()?;

    let mut wm = WindowManager::new(display, config, bindings, Box::new(ShellLauncher));
    wm.setup_monitors()?;
    wm.adopt_windows()?;
    wm.run()
}

/// Replace this process with a fresh copy of itself.
fn restart() -> Result<()> {
    let exe = std::env::current_exe().context("Failed to locate the spotwm binary")?;
    info!("Restarting {:?}", exe);
    let err = Command::new(&exe).args(std::env::args_os().skip(1)).exec();
    Err(err).with_context(|| format!("Failed to exec {:?}", exe))
}
