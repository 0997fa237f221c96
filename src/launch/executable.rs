//! Game executable resolution
//!
//! Unity games keep their assemblies in `<Exe>_Data/Managed`, so the
//! executable is found by walking up from the configured managed folder.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::LaunchError;

/// Executable name on macOS (inside `hollow_knight.app/Contents/MacOS`)
pub const MAC_EXECUTABLE_NAME: &str = "Hollow Knight";

/// Files containing this marker mean the install came from Steam
const STEAM_API_MARKER: &str = "steam_api";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    Linux,
    MacOs,
}

impl HostOs {
    #[must_use]
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            HostOs::Windows
        } else if cfg!(target_os = "macos") {
            HostOs::MacOs
        } else {
            HostOs::Linux
        }
    }

    pub fn executable_suffix(&self) -> &'static str {
        match self {
            HostOs::Windows => ".exe",
            HostOs::Linux => ".x86_64",
            HostOs::MacOs => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutableDescriptor {
    /// Folder containing the executable, also used as the working directory
    pub path: PathBuf,
    pub name: String,
    pub is_store_launch: bool,
}

impl ExecutableDescriptor {
    pub fn full_path(&self) -> PathBuf {
        self.path.join(&self.name)
    }
}

fn not_found(managed_folder: &Path, reason: &str) -> LaunchError {
    LaunchError::ExecutableNotFound {
        managed_folder: managed_folder.display().to_string(),
        reason: reason.to_string(),
    }
}

/// Work out where the game executable lives from its managed folder.
///
/// Layouts:
/// - Windows/Linux: `<game>/hollow_knight_Data/Managed` -> `<game>/hollow_knight(.exe|.x86_64)`
/// - macOS: `hollow_knight.app/Contents/Resources/Data/Managed` ->
///   `hollow_knight.app/Contents/MacOS/Hollow Knight`
pub fn resolve_executable(
    managed_folder: &Path,
    os: HostOs,
) -> Result<ExecutableDescriptor, LaunchError> {
    let data_folder = managed_folder
        .parent()
        .ok_or_else(|| not_found(managed_folder, "managed folder has no parent"))?;
    let mut exe_folder = data_folder
        .parent()
        .ok_or_else(|| not_found(managed_folder, "data folder has no parent"))?
        .to_path_buf();

    let mut name = if os == HostOs::MacOs {
        let contents = exe_folder
            .parent()
            .ok_or_else(|| not_found(managed_folder, "app bundle has no Contents folder"))?;
        exe_folder = contents.join("MacOS");
        MAC_EXECUTABLE_NAME.to_string()
    } else {
        let data_name = data_folder
            .file_name()
            .ok_or_else(|| not_found(managed_folder, "data folder has no name"))?;
        // Unity names the data folder after the executable
        data_name.to_string_lossy().replace("_Data", "")
    };
    name.push_str(os.executable_suffix());

    if !exe_folder.is_dir() {
        return Err(not_found(
            managed_folder,
            &format!("{} does not exist", exe_folder.display()),
        ));
    }

    let plugins_folder = match os {
        HostOs::MacOs => exe_folder
            .parent()
            .map(|contents| contents.join("PlugIns"))
            .unwrap_or_default(),
        _ => data_folder.join("Plugins"),
    };

    Ok(ExecutableDescriptor {
        is_store_launch: has_store_api(&plugins_folder),
        path: exe_folder,
        name,
    })
}

/// True when any file under `plugins_folder` looks like the Steam API library.
///
/// A missing folder just means this is not a Steam install.
pub fn has_store_api(plugins_folder: &Path) -> bool {
    if !plugins_folder.is_dir() {
        return false;
    }

    WalkDir::new(plugins_folder)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .any(|entry| {
            entry
                .file_name()
                .to_string_lossy()
                .contains(STEAM_API_MARKER)
        })
}
