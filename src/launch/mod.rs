//! Game launching
//!
//! Stops any running game instance, brings the modding API into the
//! requested state, resolves the platform executable and starts it either
//! directly or through Steam.

mod api;
mod executable;
mod process;

pub use api::{ApiInstallState, LaunchMode, ManagedFolderApi, ModdingApi};
pub use executable::{has_store_api, resolve_executable, ExecutableDescriptor, HostOs};
pub use process::{command_for, is_flatpak, GameProcesses};
#[cfg(feature = "full")]
pub use process::SystemProcesses;

use std::error::Error;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::logging::{log_action, log_error, log_info, log_launch, log_warning};
use crate::prompt::UserPrompt;

/// Process name prefixes of the game on every platform
pub const GAME_PROCESS_PREFIXES: &[&str] = &["hollow_knight", "Hollow Knight"];

/// Steam app id of Hollow Knight
pub const STEAM_APP_ID: u32 = 367520;

const ALREADY_RUNNING_MESSAGE: &str = "Hollow Knight is already running and could not be closed.\n\
     Launching again may not work. Do you want to launch anyway?";
const LAUNCH_FAILED_MESSAGE: &str = "Unable to launch the game";

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug)]
pub enum LaunchError {
    /// No managed folder configured
    ManagedFolderNotSet,
    /// Could not derive the executable location from the managed folder
    ExecutableNotFound { managed_folder: String, reason: String },
}

impl std::fmt::Display for LaunchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchError::ManagedFolderNotSet => {
                write!(f, "The game's Managed folder is not configured")
            }
            LaunchError::ExecutableNotFound { managed_folder, reason } => {
                write!(
                    f,
                    "Hollow Knight executable not found from '{}': {}",
                    managed_folder, reason
                )
            }
        }
    }
}

impl Error for LaunchError {}

// ============================================================================
// Launch Sequencer
// ============================================================================

/// Anything that can start the game in a given mode
pub trait GameLauncher {
    fn launch(&self, mode: Option<LaunchMode>);
}

/// Clears the launching flag however `launch` exits
struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn set(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct LaunchSequencer<'a> {
    managed_folder: Option<PathBuf>,
    host_os: HostOs,
    api: &'a dyn ModdingApi,
    processes: &'a dyn GameProcesses,
    prompt: &'a dyn UserPrompt,
    launching: Arc<AtomicBool>,
}

impl<'a> LaunchSequencer<'a> {
    pub fn new(
        managed_folder: Option<PathBuf>,
        api: &'a dyn ModdingApi,
        processes: &'a dyn GameProcesses,
        prompt: &'a dyn UserPrompt,
    ) -> Self {
        Self {
            managed_folder,
            host_os: HostOs::current(),
            api,
            processes,
            prompt,
            launching: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Resolve executables as if running on `os`
    #[must_use]
    pub fn with_host_os(mut self, os: HostOs) -> Self {
        self.host_os = os;
        self
    }

    /// True while a launch is in progress
    pub fn is_launching(&self) -> bool {
        self.launching.load(Ordering::SeqCst)
    }

    /// Shared handle to the launching flag.
    ///
    /// `launch` blocks its caller, so a UI thread or a collaborator keeps
    /// this handle to see the flag while the launch is running.
    pub fn launching_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.launching)
    }

    /// Returns false when the user chose not to continue
    fn close_running_game(&self) -> bool {
        match self.processes.terminate_running(GAME_PROCESS_PREFIXES) {
            Ok(0) => true,
            Ok(count) => {
                log_info(&format!("Closed {} running game process(es)", count));
                true
            }
            Err(e) => {
                log_warning(&format!("Failed to close running game: {}", e));
                self.prompt.confirm(ALREADY_RUNNING_MESSAGE)
            }
        }
    }

    fn start_game(&self, mode: Option<LaunchMode>) -> Result<(), Box<dyn Error>> {
        self.api.check_api()?;

        if let Some(mode) = mode {
            let state = self.api.api_install();
            if state.needs_toggle(mode) {
                log_launch(&format!("Modding API is {:?}, toggling for {:?} launch", state, mode));
                self.api.toggle_api()?;
            }
        }

        let managed_folder = self
            .managed_folder
            .as_deref()
            .ok_or(LaunchError::ManagedFolderNotSet)?;
        let exe = resolve_executable(managed_folder, self.host_os)?;

        if exe.is_store_launch {
            self.processes
                .open_store_uri(&format!("steam://rungameid/{}", STEAM_APP_ID))?;
        } else {
            self.processes.start_executable(&exe)?;
        }
        Ok(())
    }
}

impl GameLauncher for LaunchSequencer<'_> {
    /// Never fails outward: errors are shown through the prompt.
    fn launch(&self, mode: Option<LaunchMode>) {
        log_action(&format!("Launching game (mode: {:?})", mode));
        let _busy = BusyGuard::set(&self.launching);

        if !self.close_running_game() {
            log_info("Launch cancelled by user");
            return;
        }

        if let Err(e) = self.start_game(mode) {
            log_error(&format!("{}: {}", LAUNCH_FAILED_MESSAGE, e));
            self.prompt.show_error(LAUNCH_FAILED_MESSAGE, &*e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::cell::{Cell, OnceCell};
    use std::fs;
    use std::panic::{self, AssertUnwindSafe};
    use std::path::Path;
    use tempfile::TempDir;

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Fail {
        Nothing,
        Terminate,
        CheckApi,
        Toggle,
        Resolve,
        Start,
        StoreStart,
        PanicInCheck,
    }

    struct FakeApi {
        state: Cell<ApiInstallState>,
        fail: Fail,
        toggles: Cell<usize>,
        watched_flag: OnceCell<Arc<AtomicBool>>,
        flag_during_check: Cell<Option<bool>>,
    }

    impl FakeApi {
        fn new(state: ApiInstallState, fail: Fail) -> Self {
            Self {
                state: Cell::new(state),
                fail,
                toggles: Cell::new(0),
                watched_flag: OnceCell::new(),
                flag_during_check: Cell::new(None),
            }
        }
    }

    impl ModdingApi for FakeApi {
        fn check_api(&self) -> Result<(), Box<dyn Error>> {
            if let Some(flag) = self.watched_flag.get() {
                self.flag_during_check.set(Some(flag.load(Ordering::SeqCst)));
            }
            match self.fail {
                Fail::CheckApi => Err("api check failed".into()),
                Fail::PanicInCheck => panic!("installer blew up"),
                _ => Ok(()),
            }
        }

        fn api_install(&self) -> ApiInstallState {
            self.state.get()
        }

        fn toggle_api(&self) -> Result<(), Box<dyn Error>> {
            if self.fail == Fail::Toggle {
                return Err("toggle failed".into());
            }
            self.toggles.set(self.toggles.get() + 1);
            let next = match self.state.get() {
                ApiInstallState::Installed { enabled } => ApiInstallState::Installed { enabled: !enabled },
                ApiInstallState::NotInstalled => ApiInstallState::Installed { enabled: true },
            };
            self.state.set(next);
            Ok(())
        }
    }

    #[derive(Default)]
    struct FakeProcesses {
        fail_terminate: bool,
        fail_start: bool,
        opened: Mutex<Vec<String>>,
        started: Mutex<Vec<ExecutableDescriptor>>,
    }

    impl GameProcesses for FakeProcesses {
        fn terminate_running(&self, prefixes: &[&str]) -> Result<usize, Box<dyn Error>> {
            assert_eq!(prefixes, GAME_PROCESS_PREFIXES);
            if self.fail_terminate {
                return Err("access denied".into());
            }
            Ok(0)
        }

        fn open_store_uri(&self, uri: &str) -> Result<(), Box<dyn Error>> {
            if self.fail_start {
                return Err("no opener".into());
            }
            self.opened.lock().push(uri.to_string());
            Ok(())
        }

        fn start_executable(&self, exe: &ExecutableDescriptor) -> Result<(), Box<dyn Error>> {
            if self.fail_start {
                return Err("spawn failed".into());
            }
            self.started.lock().push(exe.clone());
            Ok(())
        }
    }

    struct FakePrompt {
        answer: bool,
        confirms: Cell<usize>,
        errors: Mutex<Vec<String>>,
    }

    impl FakePrompt {
        fn answering(answer: bool) -> Self {
            Self {
                answer,
                confirms: Cell::new(0),
                errors: Mutex::new(Vec::new()),
            }
        }
    }

    impl UserPrompt for FakePrompt {
        fn confirm(&self, _message: &str) -> bool {
            self.confirms.set(self.confirms.get() + 1);
            self.answer
        }

        fn show_error(&self, message: &str, error: &dyn Error) {
            self.errors.lock().push(format!("{}: {}", message, error));
        }

        fn show_notice(&self, _title: &str, _message: &str) {}
    }

    fn game_dir(root: &Path) -> PathBuf {
        let managed = root.join("Hollow Knight").join("hollow_knight_Data").join("Managed");
        fs::create_dir_all(&managed).unwrap();
        managed
    }

    fn add_steam_api(managed: &Path) {
        let plugins = managed.parent().unwrap().join("Plugins");
        fs::create_dir_all(&plugins).unwrap();
        fs::write(plugins.join("steam_api64.dll"), b"").unwrap();
    }

    #[test]
    fn starts_executable_directly_without_steam_api() {
        let tmp = TempDir::new().unwrap();
        let managed = game_dir(tmp.path());
        let api = FakeApi::new(ApiInstallState::Installed { enabled: true }, Fail::Nothing);
        let procs = FakeProcesses::default();
        let prompt = FakePrompt::answering(true);

        let launcher = LaunchSequencer::new(Some(managed), &api, &procs, &prompt)
            .with_host_os(HostOs::Linux);
        launcher.launch(None);

        let started = procs.started.lock();
        assert_eq!(started.len(), 1);
        assert_eq!(started[0].name, "hollow_knight.x86_64");
        assert_eq!(started[0].path, tmp.path().join("Hollow Knight"));
        assert!(procs.opened.lock().is_empty());
        assert!(prompt.errors.lock().is_empty());
        assert_eq!(api.toggles.get(), 0);
    }

    #[test]
    fn steam_install_goes_through_store_uri() {
        let tmp = TempDir::new().unwrap();
        let managed = game_dir(tmp.path());
        add_steam_api(&managed);

        let api = FakeApi::new(ApiInstallState::NotInstalled, Fail::Nothing);
        let procs = FakeProcesses::default();
        let prompt = FakePrompt::answering(true);

        LaunchSequencer::new(Some(managed), &api, &procs, &prompt)
            .with_host_os(HostOs::Windows)
            .launch(None);

        assert_eq!(*procs.opened.lock(), vec!["steam://rungameid/367520".to_string()]);
        assert!(procs.started.lock().is_empty());
    }

    #[test]
    fn vanilla_launch_toggles_enabled_api() {
        let tmp = TempDir::new().unwrap();
        let api = FakeApi::new(ApiInstallState::Installed { enabled: true }, Fail::Nothing);
        let procs = FakeProcesses::default();
        let prompt = FakePrompt::answering(true);

        LaunchSequencer::new(Some(game_dir(tmp.path())), &api, &procs, &prompt)
            .launch(Some(LaunchMode::Vanilla));

        assert_eq!(api.toggles.get(), 1);
        assert_eq!(api.api_install(), ApiInstallState::Installed { enabled: false });
    }

    #[test]
    fn vanilla_launch_leaves_missing_api_alone() {
        let tmp = TempDir::new().unwrap();
        let api = FakeApi::new(ApiInstallState::NotInstalled, Fail::Nothing);
        let procs = FakeProcesses::default();
        let prompt = FakePrompt::answering(true);

        LaunchSequencer::new(Some(game_dir(tmp.path())), &api, &procs, &prompt)
            .launch(Some(LaunchMode::Vanilla));

        assert_eq!(api.toggles.get(), 0);
    }

    #[test]
    fn modded_launch_toggles_disabled_api() {
        let tmp = TempDir::new().unwrap();
        let api = FakeApi::new(ApiInstallState::Installed { enabled: false }, Fail::Nothing);
        let procs = FakeProcesses::default();
        let prompt = FakePrompt::answering(true);

        LaunchSequencer::new(Some(game_dir(tmp.path())), &api, &procs, &prompt)
            .launch(Some(LaunchMode::Modded));

        assert_eq!(api.toggles.get(), 1);
    }

    #[test]
    fn declining_after_failed_close_aborts_launch() {
        let tmp = TempDir::new().unwrap();
        let api = FakeApi::new(ApiInstallState::NotInstalled, Fail::Nothing);
        let procs = FakeProcesses {
            fail_terminate: true,
            ..Default::default()
        };
        let prompt = FakePrompt::answering(false);

        let launcher = LaunchSequencer::new(Some(game_dir(tmp.path())), &api, &procs, &prompt);
        launcher.launch(None);

        assert_eq!(prompt.confirms.get(), 1);
        assert!(procs.started.lock().is_empty());
        assert!(prompt.errors.lock().is_empty());
        assert!(!launcher.is_launching());
    }

    #[test]
    fn accepting_after_failed_close_still_launches() {
        let tmp = TempDir::new().unwrap();
        let api = FakeApi::new(ApiInstallState::NotInstalled, Fail::Nothing);
        let procs = FakeProcesses {
            fail_terminate: true,
            ..Default::default()
        };
        let prompt = FakePrompt::answering(true);

        LaunchSequencer::new(Some(game_dir(tmp.path())), &api, &procs, &prompt)
            .with_host_os(HostOs::Windows)
            .launch(None);

        assert_eq!(procs.started.lock().len(), 1);
    }

    #[test]
    fn missing_managed_folder_setting_is_reported() {
        let api = FakeApi::new(ApiInstallState::NotInstalled, Fail::Nothing);
        let procs = FakeProcesses::default();
        let prompt = FakePrompt::answering(true);

        let launcher = LaunchSequencer::new(None, &api, &procs, &prompt);
        launcher.launch(None);
        assert!(!launcher.is_launching());

        let errors = prompt.errors.lock();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Unable to launch the game"));
    }

    #[test]
    fn launching_flag_is_cleared_on_every_failure() {
        let failures = [
            Fail::Nothing,
            Fail::Terminate,
            Fail::CheckApi,
            Fail::Toggle,
            Fail::Resolve,
            Fail::Start,
            Fail::StoreStart,
        ];
        for fail in failures {
            let tmp = TempDir::new().unwrap();
            let managed = if fail == Fail::Resolve {
                // data folder's parent was never created
                tmp.path().join("gone").join("hollow_knight_Data").join("Managed")
            } else {
                game_dir(tmp.path())
            };
            if fail == Fail::StoreStart {
                add_steam_api(&managed);
            }

            let api = FakeApi::new(ApiInstallState::Installed { enabled: true }, fail);
            let procs = FakeProcesses {
                fail_terminate: fail == Fail::Terminate,
                fail_start: matches!(fail, Fail::Start | Fail::StoreStart),
                ..Default::default()
            };
            let prompt = FakePrompt::answering(true);

            let launcher = LaunchSequencer::new(Some(managed), &api, &procs, &prompt)
                .with_host_os(HostOs::Linux);
            assert!(!launcher.is_launching());
            launcher.launch(Some(LaunchMode::Vanilla));
            assert!(!launcher.is_launching(), "flag left set after {:?}", fail);

            let reported = prompt.errors.lock().len();
            let expected = match fail {
                Fail::Nothing | Fail::Terminate => 0,
                _ => 1,
            };
            assert_eq!(reported, expected, "errors reported after {:?}", fail);
            assert!(procs.opened.lock().is_empty());
            assert!(procs.started.lock().len() <= 1);
        }
    }

    #[test]
    fn launching_flag_is_visible_while_launch_runs() {
        let tmp = TempDir::new().unwrap();
        let api = FakeApi::new(ApiInstallState::NotInstalled, Fail::Nothing);
        let procs = FakeProcesses::default();
        let prompt = FakePrompt::answering(true);

        let launcher = LaunchSequencer::new(Some(game_dir(tmp.path())), &api, &procs, &prompt)
            .with_host_os(HostOs::Linux);
        let flag = launcher.launching_flag();
        api.watched_flag.set(Arc::clone(&flag)).unwrap();

        assert!(!flag.load(Ordering::SeqCst));
        launcher.launch(None);

        assert_eq!(api.flag_during_check.get(), Some(true));
        assert!(!flag.load(Ordering::SeqCst));
        assert_eq!(procs.started.lock().len(), 1);
    }

    #[test]
    fn launching_flag_is_cleared_when_a_collaborator_panics() {
        let tmp = TempDir::new().unwrap();
        let api = FakeApi::new(ApiInstallState::NotInstalled, Fail::PanicInCheck);
        let procs = FakeProcesses::default();
        let prompt = FakePrompt::answering(true);

        let launcher = LaunchSequencer::new(Some(game_dir(tmp.path())), &api, &procs, &prompt);
        let result = panic::catch_unwind(AssertUnwindSafe(|| launcher.launch(None)));

        assert!(result.is_err());
        assert!(!launcher.is_launching());
    }
}
