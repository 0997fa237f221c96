//! Modding API install state
//!
//! The mod installer owns the modding API; the launcher only reads its state
//! and asks for a toggle when the requested launch mode disagrees with it.

use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use crate::logging::{log_info, log_warning};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    Vanilla,
    Modded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiInstallState {
    NotInstalled,
    Installed { enabled: bool },
}

impl ApiInstallState {
    /// Whether the game would already start in `mode` without touching the API
    pub fn satisfies(&self, mode: LaunchMode) -> bool {
        match (mode, self) {
            (LaunchMode::Vanilla, ApiInstallState::NotInstalled) => true,
            (LaunchMode::Vanilla, ApiInstallState::Installed { enabled }) => !enabled,
            (LaunchMode::Modded, ApiInstallState::Installed { enabled }) => *enabled,
            (LaunchMode::Modded, ApiInstallState::NotInstalled) => false,
        }
    }

    pub fn needs_toggle(&self, mode: LaunchMode) -> bool {
        !self.satisfies(mode)
    }
}

/// The installer/mod-source side of the modding API
pub trait ModdingApi {
    /// Consistency check run before every launch
    fn check_api(&self) -> Result<(), Box<dyn Error>>;

    fn api_install(&self) -> ApiInstallState;

    /// Enable the API if disabled, disable it if enabled, install it if missing
    fn toggle_api(&self) -> Result<(), Box<dyn Error>>;
}

// ============================================================================
// Managed Folder Implementation
// ============================================================================

const ASSEMBLY: &str = "Assembly-CSharp.dll";
/// Backup of the vanilla assembly, present while the API is enabled
const VANILLA_BACKUP: &str = "Assembly-CSharp.dll.v";
/// Backup of the modded assembly, present while the API is disabled
const MODDED_BACKUP: &str = "Assembly-CSharp.dll.m";

/// Reads and toggles the API by swapping `Assembly-CSharp.dll` with its backups.
///
/// Installing the API from scratch belongs to the mod installer, so toggling
/// a `NotInstalled` game is an error here.
pub struct ManagedFolderApi {
    managed_folder: PathBuf,
}

impl ManagedFolderApi {
    #[must_use]
    pub fn new(managed_folder: impl Into<PathBuf>) -> Self {
        Self {
            managed_folder: managed_folder.into(),
        }
    }

    fn file(&self, name: &str) -> PathBuf {
        self.managed_folder.join(name)
    }

    fn swap(&self, current_to: &str, restore_from: &str) -> Result<(), Box<dyn Error>> {
        let current = self.file(ASSEMBLY);
        let backup = self.file(restore_from);
        if !backup.exists() {
            return Err(format!("Missing backup assembly {}", backup.display()).into());
        }
        fs::rename(&current, self.file(current_to))?;
        if let Err(e) = fs::rename(&backup, &current) {
            // put the original assembly back so the game still starts
            let _ = fs::rename(self.file(current_to), &current);
            return Err(e.into());
        }
        Ok(())
    }
}

fn exists(path: &Path) -> bool {
    path.is_file()
}

impl ModdingApi for ManagedFolderApi {
    fn check_api(&self) -> Result<(), Box<dyn Error>> {
        if !self.managed_folder.is_dir() {
            return Err(format!(
                "Managed folder not found: {}",
                self.managed_folder.display()
            )
            .into());
        }
        if !exists(&self.file(ASSEMBLY)) {
            return Err(format!("{} is missing from the managed folder", ASSEMBLY).into());
        }
        if exists(&self.file(VANILLA_BACKUP)) && exists(&self.file(MODDED_BACKUP)) {
            log_warning("Both vanilla and modded assembly backups exist; assuming the API is enabled");
        }
        Ok(())
    }

    fn api_install(&self) -> ApiInstallState {
        if exists(&self.file(VANILLA_BACKUP)) {
            ApiInstallState::Installed { enabled: true }
        } else if exists(&self.file(MODDED_BACKUP)) {
            ApiInstallState::Installed { enabled: false }
        } else {
            ApiInstallState::NotInstalled
        }
    }

    fn toggle_api(&self) -> Result<(), Box<dyn Error>> {
        match self.api_install() {
            ApiInstallState::Installed { enabled: true } => {
                log_info("Disabling modding API");
                self.swap(MODDED_BACKUP, VANILLA_BACKUP)
            }
            ApiInstallState::Installed { enabled: false } => {
                log_info("Enabling modding API");
                self.swap(VANILLA_BACKUP, MODDED_BACKUP)
            }
            ApiInstallState::NotInstalled => {
                Err("The modding API is not installed; install it from the mod manager first".into())
            }
        }
    }
}
