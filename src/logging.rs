//! hkmm Logging System
//!
//! Writes one log file per run with a short system information header,
//! and mirrors every line to the console.

use chrono::Local;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::sync::OnceLock;

static LOGGER: OnceLock<Mutex<HkmmLogger>> = OnceLock::new();

// ============================================================================
// System Information Detection
// ============================================================================

#[derive(Debug, Clone)]
pub struct SystemInfo {
    pub app_version: String,
    pub os: String,
    pub arch: String,
    pub distro: String,
    pub desktop_env: String,
}

impl SystemInfo {
    pub fn detect() -> Self {
        Self {
            app_version: env!("CARGO_PKG_VERSION").to_string(),
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            distro: detect_distro(),
            desktop_env: detect_desktop_env(),
        }
    }

    pub fn to_log_header(&self) -> String {
        format!(
r#"================================================================================
hkmm Log - {}
================================================================================
Application:   hkmm v{}
System Info:
  OS:          {} ({})
  Distro:      {}
  Desktop:     {}
================================================================================
"#,
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            self.app_version,
            self.os,
            self.arch,
            self.distro,
            self.desktop_env,
        )
    }
}

fn detect_distro() -> String {
    if let Ok(file) = File::open("/etc/os-release") {
        let reader = BufReader::new(file);
        for line in reader.lines().map_while(Result::ok) {
            if let Some(name) = line.strip_prefix("PRETTY_NAME=") {
                return name.trim_matches('"').to_string();
            }
        }
    }
    "n/a".to_string()
}

fn detect_desktop_env() -> String {
    ["XDG_CURRENT_DESKTOP", "DESKTOP_SESSION", "XDG_SESSION_DESKTOP"]
        .iter()
        .find_map(|var| std::env::var(var).ok())
        .unwrap_or_else(|| "Unknown".to_string())
}

// ============================================================================
// Log Levels
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogLevel {
    Info,
    Action, // User actions (commands, deep links)
    Download,
    Launch,
    Warning,
    Error,
}

impl LogLevel {
    pub fn prefix(&self) -> &'static str {
        match self {
            LogLevel::Info => "[INFO]",
            LogLevel::Action => "[ACTION]",
            LogLevel::Download => "[DOWNLOAD]",
            LogLevel::Launch => "[LAUNCH]",
            LogLevel::Warning => "[WARNING]",
            LogLevel::Error => "[ERROR]",
        }
    }
}

// ============================================================================
// hkmm Logger
// ============================================================================

pub struct HkmmLogger {
    log_file: Option<File>,
}

fn open_log_file() -> Option<File> {
    // Unit test runs stay on the console and out of the user's config dir
    if cfg!(test) {
        return None;
    }

    let log_dir = hkmm_path!("logs");
    let _ = fs::create_dir_all(&log_dir);

    let timestamp = Local::now().format("%Y%m%d_%H%M%S");
    let log_path = log_dir.join(format!("hkmm_{}.log", timestamp));

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .ok()
}

impl HkmmLogger {
    pub fn new() -> Self {
        let mut logger = Self {
            log_file: open_log_file(),
        };
        logger.write_raw(&SystemInfo::detect().to_log_header());
        logger
    }

    fn write_raw(&mut self, msg: &str) {
        if let Some(ref mut file) = self.log_file {
            let _ = writeln!(file, "{}", msg);
            let _ = file.flush();
        }

        // stdout is reserved for command output (documents, banners)
        eprintln!("{}", msg);
    }

    pub fn log(&mut self, level: LogLevel, message: &str) {
        let timestamp = Local::now().format("%H:%M:%S");
        let formatted = format!("[{}] {} {}", timestamp, level.prefix(), message);
        self.write_raw(&formatted);
    }
}

impl Default for HkmmLogger {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Global Logger Access
// ============================================================================

/// Initialize the global logger (call once at startup)
pub fn init_logger() {
    logger();
}

fn logger() -> &'static Mutex<HkmmLogger> {
    LOGGER.get_or_init(|| Mutex::new(HkmmLogger::new()))
}

// ============================================================================
// Convenience Logging Functions
// ============================================================================

pub fn log_info(message: &str) {
    logger().lock().log(LogLevel::Info, message);
}

pub fn log_action(message: &str) {
    logger().lock().log(LogLevel::Action, message);
}

pub fn log_download(message: &str) {
    logger().lock().log(LogLevel::Download, message);
}

pub fn log_launch(message: &str) {
    logger().lock().log(LogLevel::Launch, message);
}

pub fn log_warning(message: &str) {
    logger().lock().log(LogLevel::Warning, message);
}

pub fn log_error(message: &str) {
    logger().lock().log(LogLevel::Error, message);
}
