//! Image loading for rendered documents
//!
//! Absolute image URLs are only fetched from GitHub; relative ones are
//! looked up in the repository on the raw-content host.

use std::sync::Arc;

use url::Url;

use crate::github::raw_file_url;
use crate::http::{HttpError, HttpGet};
use crate::logging::log_warning;

pub const TRUSTED_MEDIA_HOST: &str = "github.com";

fn is_trusted(url: &Url) -> bool {
    let scheme_ok = matches!(url.scheme(), "http" | "https");
    let host_ok = url.host_str().is_some_and(|host| {
        host == TRUSTED_MEDIA_HOST
            || host
                .strip_suffix(TRUSTED_MEDIA_HOST)
                .is_some_and(|sub| sub.ends_with('.'))
    });
    scheme_ok && host_ok
}

pub struct ImageResolver {
    client: Arc<dyn HttpGet>,
    repository: String,
}

impl ImageResolver {
    pub fn new(client: Arc<dyn HttpGet>, repository: impl Into<String>) -> Self {
        Self {
            client,
            repository: repository.into(),
        }
    }

    /// URL the image would be fetched from, or `None` if it is not allowed
    pub fn image_url(&self, path: &str) -> Result<Option<String>, HttpError> {
        match Url::parse(path) {
            Ok(url) if is_trusted(&url) => Ok(Some(url.into())),
            Ok(_) => Ok(None),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                Ok(Some(raw_file_url(&self.repository, path)?))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Image bytes for `path`, or `None` if refused or unreachable
    pub fn resolve(&self, path: &str) -> Option<Vec<u8>> {
        match self.try_resolve(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                log_warning(&format!("Could not load image {}: {}", path, e));
                None
            }
        }
    }

    fn try_resolve(&self, path: &str) -> Result<Option<Vec<u8>>, HttpError> {
        let Some(url) = self.image_url(path)? else {
            return Ok(None);
        };
        let response = self.client.get(&url)?;
        if !response.is_success() {
            return Err(format!("{} returned {}", url, response.status).into());
        }
        Ok(Some(response.body))
    }
}
