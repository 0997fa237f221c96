//! hkmm - Hollow Knight mod manager helper
//!
//! Library crate shared by the CLI: launching the game, `hkmm://` deep
//! links, and mod READMEs / release notes fetched from GitHub.

#[macro_use]
pub mod paths;

pub mod config;
pub mod deeplink;
pub mod launch;
pub mod logging;
pub mod prompt;

#[cfg(feature = "network")]
pub mod document;
#[cfg(feature = "network")]
pub mod github;
#[cfg(feature = "network")]
pub mod http;
