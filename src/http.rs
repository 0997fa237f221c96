//! HTTP client for the GitHub API and raw-content host
//!
//! A single explicitly constructed client carries the fixed headers,
//! timeout and proxy; everything that fetches takes it as a parameter.

use std::error::Error;
use std::io::Read;

use crate::config::AppConfig;

pub type HttpError = Box<dyn Error + Send + Sync>;

/// GitHub's versioned JSON plus any image type, for API calls and image fetches alike
pub const ACCEPT: &str = "application/vnd.github.v3+json, image/*";

pub fn user_agent() -> String {
    format!("hkmm/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Body as text. Invalid UTF-8 sequences become U+FFFD.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// One GET request. Non-2xx statuses are responses, not errors.
pub trait HttpGet: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, HttpError>;
}

pub struct GithubClient {
    agent: ureq::Agent,
}

impl GithubClient {
    pub fn new(config: &AppConfig) -> Result<Self, Box<dyn Error>> {
        let mut builder = ureq::AgentBuilder::new()
            .timeout(config.request_timeout())
            .user_agent(&user_agent());

        if let Some(proxy) = config.proxy() {
            builder = builder.proxy(ureq::Proxy::new(proxy)?);
        }

        Ok(Self {
            agent: builder.build(),
        })
    }
}

fn read_body(response: ureq::Response) -> Result<HttpResponse, HttpError> {
    let status = response.status();
    let mut body = Vec::new();
    response.into_reader().read_to_end(&mut body)?;
    Ok(HttpResponse { status, body })
}

impl HttpGet for GithubClient {
    fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
        match self.agent.get(url).set("Accept", ACCEPT).call() {
            Ok(response) => read_body(response),
            Err(ureq::Error::Status(_, response)) => read_body(response),
            Err(e) => Err(e.into()),
        }
    }
}


#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// Canned responses keyed by URL; unknown URLs fail like a dropped connection
    #[derive(Default)]
    pub struct FakeHttp {
        routes: HashMap<String, HttpResponse>,
        pub requests: Mutex<Vec<String>>,
    }

    impl FakeHttp {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn route(mut self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
            self.routes.insert(
                url.to_string(),
                HttpResponse {
                    status,
                    body: body.into(),
                },
            );
            self
        }
    }

    impl HttpGet for FakeHttp {
        fn get(&self, url: &str) -> Result<HttpResponse, HttpError> {
            self.requests.lock().push(url.to_string());
            self.routes
                .get(url)
                .cloned()
                .ok_or_else(|| format!("connection refused: {}", url).into())
        }
    }
}
