use anyhow::{Context, Result, bail};
use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_API_URL: &str = "http://localhost:8000/stories";
pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_DOWNLOAD_DIR: &str = "./downloads";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub bind: SocketAddr,
    pub download_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = lookup("STORYFORGE_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let bind = lookup("STORYFORGE_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let download_dir =
            lookup("STORYFORGE_DOWNLOAD_DIR").unwrap_or_else(|| DEFAULT_DOWNLOAD_DIR.to_string());

        Ok(Config {
            api_url: validate_api_url(&api_url)?,
            bind: bind
                .parse()
                .with_context(|| format!("STORYFORGE_BIND is not a socket address: {}", bind))?,
            download_dir: PathBuf::from(download_dir),
        })
    }
}

fn validate_api_url(raw: &str) -> Result<String> {
    let url = reqwest::Url::parse(raw)
        .with_context(|| format!("STORYFORGE_API_URL is not a URL: {}", raw))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("STORYFORGE_API_URL must be http or https, got {}", url.scheme());
    }
    Ok(raw.trim_end_matches('/').to_string())
}
