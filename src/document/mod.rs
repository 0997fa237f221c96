//! Remote mod documents: READMEs and release notes from GitHub
//!
//! Fetches run on a background thread that writes the owning
//! [`RemoteDocument`] once. Failures are silent; the caller shows a
//! "not available" placeholder instead.

mod images;
mod info;
mod rewrite;

pub use images::{ImageResolver, TRUSTED_MEDIA_HOST};
pub use info::{fetch_additional_info, AdditionalInfo, ADDITIONAL_INFO_URL};
pub use rewrite::{prepare_for_display, rewrite_anchor_links, wrap_bare_links};

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;

use crate::github::{latest_release_endpoint, readme_endpoint, GithubReadme, GithubRelease};
use crate::http::{HttpError, HttpGet};
use crate::logging::{log_download, log_warning};

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Readme,
    ReleaseNotes,
}

impl DocumentKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            DocumentKind::Readme => "Readme",
            DocumentKind::ReleaseNotes => "Release Notes",
        }
    }
}

/// Text as fetched, plus the link anchors should point at
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedDocument {
    pub text: String,
    /// `html_url` of the README; empty for release notes
    pub canonical_link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteDocument {
    /// `None` while loading, empty when the fetch failed
    pub raw_text: Option<String>,
    pub source_link: String,
}

impl RemoteDocument {
    pub fn is_loaded(&self) -> bool {
        self.raw_text.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// First completion wins; later ones are ignored
    fn complete(&mut self, fetched: Option<FetchedDocument>) {
        if self.raw_text.is_some() {
            return;
        }
        match fetched {
            Some(doc) => {
                self.raw_text = Some(prepare_for_display(&doc.text, &doc.canonical_link));
                self.source_link = doc.canonical_link;
            }
            None => self.raw_text = Some(String::new()),
        }
    }
}

// ============================================================================
// Fetching
// ============================================================================

fn fetch_readme(client: &dyn HttpGet, repository: &str) -> Result<FetchedDocument, HttpError> {
    let api_url = readme_endpoint(repository)?;
    let response = client.get(&api_url)?;
    if !response.is_success() {
        return Err(format!("{} returned {}", api_url, response.status).into());
    }

    let readme: GithubReadme = serde_json::from_slice(&response.body)?;
    let download_url = readme
        .download_url
        .ok_or_else(|| format!("{} has no download_url", api_url))?;

    log_download(&format!("Fetching readme from {}", download_url));
    let content = client.get(&download_url)?;
    if !content.is_success() {
        return Err(format!("{} returned {}", download_url, content.status).into());
    }

    Ok(FetchedDocument {
        text: content.text(),
        canonical_link: readme.html_url,
    })
}

fn fetch_release_notes(
    client: &dyn HttpGet,
    repository: &str,
) -> Result<FetchedDocument, HttpError> {
    let api_url = latest_release_endpoint(repository)?;
    let response = client.get(&api_url)?;
    if !response.is_success() {
        return Err(format!("{} returned {}", api_url, response.status).into());
    }

    let release: GithubRelease = serde_json::from_slice(&response.body)?;
    Ok(FetchedDocument {
        text: release.body.unwrap_or_default(),
        canonical_link: String::new(),
    })
}

/// Fetch a README or the latest release notes. Any failure yields `None`.
pub fn fetch_document(
    client: &dyn HttpGet,
    repository: &str,
    kind: DocumentKind,
) -> Option<FetchedDocument> {
    let result = match kind {
        DocumentKind::Readme => fetch_readme(client, repository),
        DocumentKind::ReleaseNotes => fetch_release_notes(client, repository),
    };

    match result {
        Ok(doc) => Some(doc),
        Err(e) => {
            log_warning(&format!(
                "Failed to fetch {} for {}: {}",
                kind.display_name().to_lowercase(),
                repository,
                e
            ));
            None
        }
    }
}

// ============================================================================
// Background Task
// ============================================================================

/// A document being fetched in the background
pub struct DocumentTask {
    kind: DocumentKind,
    document: Arc<Mutex<RemoteDocument>>,
    handle: Option<JoinHandle<()>>,
}

impl DocumentTask {
    pub fn spawn(client: Arc<dyn HttpGet>, repository: impl Into<String>, kind: DocumentKind) -> Self {
        let repository = repository.into();
        let document = Arc::new(Mutex::new(RemoteDocument::default()));

        let shared = Arc::clone(&document);
        let handle = thread::spawn(move || {
            let fetched = fetch_document(client.as_ref(), &repository, kind);
            shared.lock().complete(fetched);
        });

        Self {
            kind,
            document,
            handle: Some(handle),
        }
    }

    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Block until the fetch has finished
    pub fn wait(&mut self) -> RemoteDocument {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                // the fetch thread died before writing a result
                self.document.lock().complete(None);
            }
        }
        self.snapshot()
    }

    pub fn snapshot(&self) -> RemoteDocument {
        self.document.lock().clone()
    }

    /// The fetched text, or a loading / not available placeholder
    pub fn display_text(&self) -> String {
        let name = self.kind.display_name();
        match self.document.lock().raw_text.as_deref() {
            None => format!("{} is loading....", name),
            Some("") => format!("{} not available", name),
            Some(text) => text.to_string(),
        }
    }

    /// Document to keep for the mod once the view closes.
    ///
    /// Release notes are dropped so a later readme request fetches the readme.
    pub fn into_cached(mut self) -> Option<RemoteDocument> {
        let document = self.wait();
        match self.kind {
            DocumentKind::Readme => Some(document),
            DocumentKind::ReleaseNotes => None,
        }
    }
}
