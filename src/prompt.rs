//! User-facing prompts and error display
//!
//! The launch flow and deep-link dispatcher never show UI themselves; they
//! ask a [`UserPrompt`] to confirm, to notify, or to display an error.

use std::error::Error;
use std::io::{self, BufRead, Write};

pub trait UserPrompt {
    /// Yes/no question. Returns `true` to proceed.
    fn confirm(&self, message: &str) -> bool;

    /// Generic "could not complete operation" display with the cause attached.
    fn show_error(&self, message: &str, error: &dyn Error);

    /// Informational message with a title (used for invalid deep links).
    fn show_notice(&self, title: &str, message: &str);
}

/// Terminal prompt used by the CLI
pub struct ConsolePrompt {
    /// Answer every confirmation with "yes" without reading stdin
    pub assume_yes: bool,
}

impl ConsolePrompt {
    #[must_use]
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

impl UserPrompt for ConsolePrompt {
    fn confirm(&self, message: &str) -> bool {
        eprintln!("{}", message);
        if self.assume_yes {
            eprintln!("Continue? [y/N] y");
            return true;
        }

        eprint!("Continue? [y/N] ");
        let _ = io::stderr().flush();

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }

    fn show_error(&self, message: &str, error: &dyn Error) {
        eprintln!("error: {}", message);
        eprintln!("  caused by: {}", error);
        let mut source = error.source();
        while let Some(inner) = source {
            eprintln!("  caused by: {}", inner);
            source = inner.source();
        }
    }

    fn show_notice(&self, title: &str, message: &str) {
        eprintln!("{}: {}", title, message);
    }
}
