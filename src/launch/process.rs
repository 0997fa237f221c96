//! Game process control: stopping stale instances and starting the game

use std::error::Error;
use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

use super::executable::ExecutableDescriptor;

pub trait GameProcesses {
    /// Stop every running process whose name starts with one of `prefixes`.
    /// Returns how many were found.
    fn terminate_running(&self, prefixes: &[&str]) -> Result<usize, Box<dyn Error>>;

    /// Hand a store URI (e.g. `steam://rungameid/...`) to the OS
    fn open_store_uri(&self, uri: &str) -> Result<(), Box<dyn Error>>;

    /// Start the executable with its folder as working directory
    fn start_executable(&self, exe: &ExecutableDescriptor) -> Result<(), Box<dyn Error>>;
}

pub fn is_flatpak() -> bool {
    Path::new("/.flatpak-info").exists()
}

/// Inside a Flatpak sandbox the game lives on the host, so spawn it there
/// through the portal.
pub fn command_for(exe: impl AsRef<OsStr>) -> Command {
    if is_flatpak() {
        let mut cmd = Command::new("flatpak-spawn");
        cmd.arg("--host").arg(exe);
        return cmd;
    }
    Command::new(exe)
}

#[cfg(feature = "full")]
pub use system::SystemProcesses;

#[cfg(feature = "full")]
mod system {
    use std::error::Error;
    use std::process::{Command, Stdio};
    use std::thread;
    use std::time::{Duration, Instant};

    use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, RefreshKind, Signal, System};
    use wait_timeout::ChildExt;

    use super::{command_for, ExecutableDescriptor, GameProcesses};
    use crate::logging::{log_info, log_launch, log_warning};

    /// Platform opener for URIs
    fn opener_command(uri: &str) -> Command {
        if cfg!(target_os = "windows") {
            let mut cmd = Command::new("cmd");
            cmd.args(["/C", "start", ""]).arg(uri);
            cmd
        } else if cfg!(target_os = "macos") {
            let mut cmd = Command::new("open");
            cmd.arg(uri);
            cmd
        } else {
            let mut cmd = command_for("xdg-open");
            cmd.arg(uri);
            cmd
        }
    }

    /// Longest wait for a stale game process to exit
    const EXIT_TIMEOUT: Duration = Duration::from_secs(5);
    const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);
    /// Openers normally hand off and exit quickly
    const OPENER_TIMEOUT: Duration = Duration::from_secs(3);

    /// Real process table, backed by sysinfo
    #[derive(Default)]
    pub struct SystemProcesses;

    impl SystemProcesses {
        #[must_use]
        pub fn new() -> Self {
            Self
        }
    }

    fn snapshot() -> System {
        System::new_with_specifics(RefreshKind::new().with_processes(ProcessRefreshKind::new()))
    }

    fn is_alive(pid: Pid) -> bool {
        snapshot()
            .process(pid)
            .is_some_and(|p| p.status() != ProcessStatus::Zombie)
    }

    /// Poll until `pid` is gone. Returns false on timeout.
    fn wait_for_exit(pid: Pid, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            if !is_alive(pid) {
                return true;
            }
            thread::sleep(EXIT_POLL_INTERVAL);
        }
        !is_alive(pid)
    }

    impl GameProcesses for SystemProcesses {
        fn terminate_running(&self, prefixes: &[&str]) -> Result<usize, Box<dyn Error>> {
            let system = snapshot();
            let stale: Vec<(Pid, String)> = system
                .processes()
                .iter()
                .filter_map(|(pid, process)| {
                    let name = process.name().to_string_lossy().to_string();
                    prefixes
                        .iter()
                        .any(|prefix| name.starts_with(prefix))
                        .then_some((*pid, name))
                })
                .collect();

            for (pid, name) in &stale {
                let Some(process) = system.process(*pid) else {
                    continue;
                };
                log_info(&format!("Stopping running game process {} (pid {})", name, pid));

                // Graceful close first; platforms without SIGTERM get a kill right away
                let force_killed = match process.kill_with(Signal::Term) {
                    Some(true) => false,
                    _ => {
                        if !process.kill() {
                            return Err(format!("Could not stop {} (pid {})", name, pid).into());
                        }
                        true
                    }
                };

                if !wait_for_exit(*pid, EXIT_TIMEOUT) && !force_killed {
                    log_warning(&format!(
                        "{} did not exit within {}s, killing it",
                        name,
                        EXIT_TIMEOUT.as_secs()
                    ));
                    process.kill();
                }
            }

            Ok(stale.len())
        }

        fn open_store_uri(&self, uri: &str) -> Result<(), Box<dyn Error>> {
            log_launch(&format!("Opening {}", uri));
            let mut child = opener_command(uri)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()?;

            match child.wait_timeout(OPENER_TIMEOUT)? {
                Some(status) if !status.success() => {
                    Err(format!("Opening {} failed with exit code {:?}", uri, status.code()).into())
                }
                // Exited cleanly, or still running and owning the hand-off
                _ => Ok(()),
            }
        }

        fn start_executable(&self, exe: &ExecutableDescriptor) -> Result<(), Box<dyn Error>> {
            let full_path = exe.full_path();
            log_launch(&format!("Starting {}", full_path.display()));
            command_for(&full_path)
                .current_dir(&exe.path)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()?;
            Ok(())
        }
    }
}
