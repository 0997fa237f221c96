//! `hkmm://` deep links
//!
//! The OS hands us links such as `hkmm://launch/vanilla`. This module parses
//! them, dispatches the launch command and registers the scheme handler.

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use crate::launch::{GameLauncher, LaunchMode};
use crate::logging::{log_action, log_info, log_warning};
use crate::prompt::UserPrompt;

pub const SCHEME: &str = "hkmm";

const INVALID_LAUNCH_TITLE: &str = "Launch Game";
const INVALID_LAUNCH_MESSAGE: &str = "Launch game command is invalid. Please specify the launch as \
     vanilla or modded or leave blank for regular launch";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlSchemeKind {
    None,
    Download,
    Reset,
    ForceUpdateAll,
    CustomModLinks,
    BaseLink,
    Modpack,
    RemoveAllModsGlobalSettings,
    RemoveGlobalSettings,
    Launch,
}

impl UrlSchemeKind {
    fn from_name(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "download" => UrlSchemeKind::Download,
            "reset" => UrlSchemeKind::Reset,
            "forceupdateall" => UrlSchemeKind::ForceUpdateAll,
            "custommodlinks" => UrlSchemeKind::CustomModLinks,
            "baselink" => UrlSchemeKind::BaseLink,
            "modpack" => UrlSchemeKind::Modpack,
            "removeallmodsglobalsettings" => UrlSchemeKind::RemoveAllModsGlobalSettings,
            "removeglobalsettings" => UrlSchemeKind::RemoveGlobalSettings,
            "launch" => UrlSchemeKind::Launch,
            _ => UrlSchemeKind::None,
        }
    }
}

/// One inbound deep link; handled at most once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlSchemeCommand {
    pub kind: UrlSchemeKind,
    pub payload: String,
    pub handled: bool,
}

impl UrlSchemeCommand {
    pub fn new(kind: UrlSchemeKind, payload: impl Into<String>) -> Self {
        Self {
            kind,
            payload: payload.into(),
            handled: false,
        }
    }

    /// Parse `hkmm://<command>/<payload>`. Anything with another scheme is `None`.
    pub fn parse(uri: &str) -> Option<Self> {
        let (scheme, rest) = uri.trim().split_once("://")?;
        if !scheme.eq_ignore_ascii_case(SCHEME) {
            return None;
        }

        let rest = rest.trim_end_matches('/');
        let (command, payload) = rest.split_once('/').unwrap_or((rest, ""));
        Some(Self::new(UrlSchemeKind::from_name(command), payload))
    }
}

fn launch_mode_for(payload: &str) -> Result<Option<LaunchMode>, ()> {
    match payload.to_lowercase().as_str() {
        "" => Ok(None),
        "vanilla" | "false" => Ok(Some(LaunchMode::Vanilla)),
        "modded" | "true" => Ok(Some(LaunchMode::Modded)),
        _ => Err(()),
    }
}

/// Run a pending `launch` deep link. Other commands are left for their owners.
pub fn dispatch_launch(
    command: &mut UrlSchemeCommand,
    launcher: &dyn GameLauncher,
    prompt: &dyn UserPrompt,
) {
    if command.handled || command.kind != UrlSchemeKind::Launch {
        return;
    }

    log_action(&format!("Handling launch link (payload: {:?})", command.payload));
    match launch_mode_for(&command.payload) {
        Ok(mode) => launcher.launch(mode),
        Err(()) => {
            log_warning(&format!("Invalid launch link payload: {}", command.payload));
            prompt.show_notice(INVALID_LAUNCH_TITLE, INVALID_LAUNCH_MESSAGE);
        }
    }

    command.handled = true;
}

// ============================================================================
// Handler Registration (Linux)
// ============================================================================

const DESKTOP_FILE: &str = "hkmm-url-handler.desktop";

/// Register this binary as the `hkmm://` handler via a desktop entry and xdg-mime
pub fn register_scheme_handler() -> Result<PathBuf, Box<dyn Error>> {
    if !cfg!(target_os = "linux") {
        return Err("Scheme registration is only supported on Linux".into());
    }

    let exe = std::env::current_exe()?;
    let applications_dir = dirs::data_dir()
        .ok_or("Could not find the user data directory")?
        .join("applications");
    fs::create_dir_all(&applications_dir)?;

    let desktop_path = applications_dir.join(DESKTOP_FILE);
    let desktop_content = format!(
        r#"[Desktop Entry]
Type=Application
Name=hkmm URL Handler
Comment=Handle {scheme}:// links for Hollow Knight mods
Exec="{exe}" open-url %u
Icon=applications-games
Terminal=false
NoDisplay=true
Categories=Game;Utility;
MimeType=x-scheme-handler/{scheme};
"#,
        scheme = SCHEME,
        exe = exe.to_string_lossy()
    );
    fs::write(&desktop_path, desktop_content)?;

    let status = std::process::Command::new("xdg-mime")
        .arg("default")
        .arg(DESKTOP_FILE)
        .arg(format!("x-scheme-handler/{}", SCHEME))
        .status()?;
    if !status.success() {
        return Err(format!("xdg-mime exited with {:?}", status.code()).into());
    }

    log_info(&format!("Registered {}:// handler at {}", SCHEME, desktop_path.display()));
    Ok(desktop_path)
}
