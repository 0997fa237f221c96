//! Shared GitHub API types and endpoints

use serde::Deserialize;
use url::Url;

pub const API_HOST: &str = "https://api.github.com";
pub const RAW_CONTENT_HOST: &str = "https://raw.githubusercontent.com";

/// Response of `GET /repos/{owner}/{repo}/readme`
#[derive(Deserialize, Debug, Clone)]
pub struct GithubReadme {
    pub download_url: Option<String>,
    pub html_url: String,
}

/// Response of `GET /repos/{owner}/{repo}/releases/latest`
#[derive(Deserialize, Debug, Clone)]
pub struct GithubRelease {
    pub tag_name: Option<String>,
    pub body: Option<String>,
}

/// `owner/repo` from a repository URL such as `https://github.com/owner/repo/`
pub fn repo_path(repository: &str) -> Result<String, url::ParseError> {
    let url = Url::parse(repository)?;
    Ok(url.path().trim_matches('/').to_string())
}

pub fn readme_endpoint(repository: &str) -> Result<String, url::ParseError> {
    Ok(format!("{}/repos/{}/readme", API_HOST, repo_path(repository)?))
}

pub fn latest_release_endpoint(repository: &str) -> Result<String, url::ParseError> {
    Ok(format!(
        "{}/repos/{}/releases/latest",
        API_HOST,
        repo_path(repository)?
    ))
}

/// Raw URL of a file on the repository's default branch
pub fn raw_file_url(repository: &str, file: &str) -> Result<String, url::ParseError> {
    Ok(format!(
        "{}/{}/HEAD/{}",
        RAW_CONTENT_HOST,
        repo_path(repository)?,
        file.trim_start_matches('/')
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_ignore_trailing_slashes() {
        assert_eq!(
            readme_endpoint("https://github.com/hk-modding/api/").unwrap(),
            "https://api.github.com/repos/hk-modding/api/readme"
        );
        assert_eq!(
            latest_release_endpoint("https://github.com/hk-modding/api").unwrap(),
            "https://api.github.com/repos/hk-modding/api/releases/latest"
        );
    }

    #[test]
    fn raw_file_url_points_at_default_branch() {
        assert_eq!(
            raw_file_url("https://github.com/org/repo", "/docs/img.png").unwrap(),
            "https://raw.githubusercontent.com/org/repo/HEAD/docs/img.png"
        );
    }

    #[test]
    fn relative_repository_is_rejected() {
        assert!(readme_endpoint("org/repo").is_err());
    }
}
