//! Detached command launching
//!
//! Commands run through `/bin/sh -c` in their own process group and are
//! forgotten immediately. A background thread reaps them on SIGCHLD so
//! they never linger as zombies.

use anyhow::{Context, Result};
use nix::sys::wait::{WaitPidFlag, WaitStatus, waitpid};
use nix::unistd::Pid;
use signal_hook::consts::SIGCHLD;
use signal_hook::iterator::Signals;
use std::os::unix::process::CommandExt;
use std::process::{Command, Stdio};
use std::thread;
use tracing::{debug, info};

/// Fire-and-forget process launcher.
pub trait Launcher {
    fn launch(&self, command: &str) -> Result<()>;
}

/// Launches commands with the user's shell semantics.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellLauncher;

impl Launcher for ShellLauncher {
    fn launch(&self, command: &str) -> Result<()> {
        let command = command.trim();
        if command.is_empty() {
            return Ok(());
        }

        let child = Command::new("/bin/sh")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .process_group(0)
            .spawn()
            .with_context(|| format!("Failed to launch {:?}", command))?;

        debug!("Launched {:?} (pid {})", command, child.id());
        Ok(())
    }
}

/// Reap every child that has exited. Never blocks.
pub fn reap_children() -> usize {
    let mut reaped = 0;
    loop {
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) | Err(_) => break,
            Ok(status) => {
                debug!("Reaped child: {:?}", status);
                reaped += 1;
            }
        }
    }
    reaped
}

/// Start the SIGCHLD watcher thread.
pub fn spawn_reaper() -> Result<()> {
    let mut signals = Signals::new([SIGCHLD]).context("Failed to register SIGCHLD handler")?;
    thread::Builder::new()
        .name("spotwm-reaper".into())
        .spawn(move || {
            for _ in signals.forever() {
                reap_children();
            }
        })
        .context("Failed to spawn reaper thread")?;
    // Children may have exited before the handler was installed
    reap_children();
    info!("Child reaper started");
    Ok(())
}
