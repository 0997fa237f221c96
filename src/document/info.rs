//! Additional info banner shown above the mod list

use crate::http::HttpGet;
use crate::logging::log_warning;

pub const ADDITIONAL_INFO_URL: &str =
    "https://raw.githubusercontent.com/TheMulhima/Lumafly/static-resources/AdditionalInfo.md";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdditionalInfo {
    pub text: String,
    pub visible: bool,
}

/// Fetch the banner. Not important enough to report failures.
pub fn fetch_additional_info(client: &dyn HttpGet) -> AdditionalInfo {
    let text = match client.get(ADDITIONAL_INFO_URL) {
        Ok(response) if response.is_success() => response.text(),
        Ok(response) => {
            log_warning(&format!("Additional info returned {}", response.status));
            String::new()
        }
        Err(e) => {
            log_warning(&format!("Could not fetch additional info: {}", e));
            String::new()
        }
    };

    AdditionalInfo {
        visible: !text.trim().is_empty(),
        text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::FakeHttp;

    #[test]
    fn banner_with_text_is_visible() {
        let http = FakeHttp::new().route(ADDITIONAL_INFO_URL, 200, "**Server maintenance** tonight");
        let info = fetch_additional_info(&http);
        assert!(info.visible);
        assert_eq!(info.text, "**Server maintenance** tonight");
    }

    #[test]
    fn empty_or_failed_banner_is_hidden() {
        let empty = FakeHttp::new().route(ADDITIONAL_INFO_URL, 200, "");
        assert!(!fetch_additional_info(&empty).visible);

        assert_eq!(fetch_additional_info(&FakeHttp::new()), AdditionalInfo::default());
    }
}
