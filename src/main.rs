//! hkmm - Hollow Knight mod manager helper
//!
//! Command-line front end: launch the game, handle `hkmm://` links and read
//! mod documents.

use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};

use hkmm::config::AppConfig;
use hkmm::deeplink::{dispatch_launch, register_scheme_handler, UrlSchemeCommand, UrlSchemeKind};
use hkmm::document::{fetch_additional_info, DocumentKind, DocumentTask, ImageResolver};
use hkmm::http::GithubClient;
use hkmm::launch::{GameLauncher, LaunchMode, LaunchSequencer, ManagedFolderApi, SystemProcesses};
use hkmm::logging::{init_logger, log_action, log_info};
use hkmm::prompt::{ConsolePrompt, UserPrompt};

#[derive(Parser)]
#[command(name = "hkmm", version, about = "Hollow Knight mod manager helper")]
struct Cli {
    /// Answer yes to every confirmation
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the game, closing any running instance first
    Launch {
        /// Disable the modding API before launching
        #[arg(long, conflicts_with = "modded")]
        vanilla: bool,
        /// Enable the modding API before launching
        #[arg(long)]
        modded: bool,
    },
    /// Handle an hkmm:// link (used by the desktop handler)
    OpenUrl { uri: String },
    /// Print a mod's README or latest release notes
    Readme {
        /// Repository URL, e.g. https://github.com/owner/repo
        repository: String,
        #[arg(long)]
        release_notes: bool,
    },
    /// Download an image referenced by a mod's README
    Image {
        repository: String,
        path: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the additional info banner, if any
    Info,
    /// Register hkmm as the hkmm:// link handler (Linux)
    RegisterScheme,
    /// Show or change settings
    Config {
        #[arg(long)]
        managed_folder: Option<PathBuf>,
        /// Network timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// HTTP proxy URL; pass an empty string to clear it
        #[arg(long)]
        proxy: Option<String>,
    },
}

fn launch_game(config: &AppConfig, prompt: &dyn UserPrompt, mode: Option<LaunchMode>) {
    let api = ManagedFolderApi::new(config.managed_folder.clone().unwrap_or_default());
    let processes = SystemProcesses::new();
    LaunchSequencer::new(config.managed_folder.clone(), &api, &processes, prompt).launch(mode);
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let mut config = AppConfig::load();
    let prompt = ConsolePrompt::new(cli.yes);

    match cli.command {
        Command::Launch { vanilla, modded } => {
            let mode = match (vanilla, modded) {
                (true, _) => Some(LaunchMode::Vanilla),
                (_, true) => Some(LaunchMode::Modded),
                _ => None,
            };
            launch_game(&config, &prompt, mode);
        }
        Command::OpenUrl { uri } => {
            log_action(&format!("Opened with {}", uri));
            let mut command = UrlSchemeCommand::parse(&uri)
                .ok_or_else(|| format!("Not an hkmm:// link: {}", uri))?;
            if command.kind != UrlSchemeKind::Launch {
                return Err(format!("{:?} links are handled by the mod installer", command.kind).into());
            }

            let api = ManagedFolderApi::new(config.managed_folder.clone().unwrap_or_default());
            let processes = SystemProcesses::new();
            let launcher = LaunchSequencer::new(config.managed_folder.clone(), &api, &processes, &prompt);
            dispatch_launch(&mut command, &launcher, &prompt);
        }
        Command::Readme { repository, release_notes } => {
            let kind = if release_notes {
                DocumentKind::ReleaseNotes
            } else {
                DocumentKind::Readme
            };
            let client = Arc::new(GithubClient::new(&config)?);
            let mut task = DocumentTask::spawn(client, repository, kind);
            task.wait();
            println!("{}", task.display_text());
        }
        Command::Image { repository, path, output } => {
            let client = Arc::new(GithubClient::new(&config)?);
            let resolver = ImageResolver::new(client, repository);
            let bytes = resolver
                .resolve(&path)
                .ok_or_else(|| format!("Image not available: {}", path))?;

            let output = output.unwrap_or_else(|| {
                PathBuf::from(path.rsplit('/').next().filter(|n| !n.is_empty()).unwrap_or("image"))
            });
            fs::write(&output, bytes)?;
            log_info(&format!("Saved image to {}", output.display()));
        }
        Command::Info => {
            let client = GithubClient::new(&config)?;
            let info = fetch_additional_info(&client);
            if info.visible {
                println!("{}", info.text);
            }
        }
        Command::RegisterScheme => {
            let path = register_scheme_handler()?;
            println!("Registered hkmm:// handler: {}", path.display());
        }
        Command::Config { managed_folder, timeout, proxy } => {
            let changed = managed_folder.is_some() || timeout.is_some() || proxy.is_some();
            if let Some(folder) = managed_folder {
                config.managed_folder = Some(folder);
            }
            if let Some(secs) = timeout {
                config.request_timeout_secs = secs;
            }
            if let Some(proxy) = proxy {
                config.proxy = Some(proxy).filter(|p| !p.trim().is_empty());
            }
            if changed {
                config.save()?;
                log_info("Settings saved");
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    init_logger();
    log_info("hkmm starting up...");

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
