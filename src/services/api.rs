use crate::models::{Chapter, ContinueRequest, DownloadPayload, NewStory, Story, StoryId};
use async_trait::async_trait;
use reqwest::{
    StatusCode,
    header::{CONTENT_DISPOSITION, HeaderValue},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("backend answered {0}")]
    Status(StatusCode),

    #[error("unreadable response: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn is_status(&self) -> bool {
        matches!(self, ApiError::Status(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err)
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

/// The remote story service, one method per endpoint.
#[async_trait]
pub trait StoryBackend: Send + Sync {
    async fn list_stories(&self) -> ApiResult<Vec<Story>>;
    async fn create_story(&self, story: &NewStory) -> ApiResult<Story>;
    async fn get_story(&self, id: StoryId) -> ApiResult<Story>;
    async fn add_chapter(&self, request: &ContinueRequest) -> ApiResult<Chapter>;
    async fn download_story(&self, id: StoryId) -> ApiResult<DownloadPayload>;
}

pub struct HttpStoryBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpStoryBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpStoryBackend {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn story_url(&self, id: StoryId) -> String {
        format!("{}/{}", self.base_url, id)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let response = ensure_success(response)?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| ApiError::Decode(e.to_string()))
    }
}

fn ensure_success(response: reqwest::Response) -> ApiResult<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ApiError::Status(status))
    }
}

/// Header values are raw bytes; non-ASCII filenames arrive as Latin-1.
fn header_text(value: &HeaderValue) -> String {
    value.as_bytes().iter().map(|&b| b as char).collect()
}

#[async_trait]
impl StoryBackend for HttpStoryBackend {
    async fn list_stories(&self) -> ApiResult<Vec<Story>> {
        let response = self.client.get(&self.base_url).send().await?;
        Self::read_json(response).await
    }

    async fn create_story(&self, story: &NewStory) -> ApiResult<Story> {
        // The backend declares its collection route with the trailing slash.
        let response = self
            .client
            .post(format!("{}/", self.base_url))
            .json(story)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn get_story(&self, id: StoryId) -> ApiResult<Story> {
        let response = self.client.get(self.story_url(id)).send().await?;
        Self::read_json(response).await
    }

    async fn add_chapter(&self, request: &ContinueRequest) -> ApiResult<Chapter> {
        let response = self
            .client
            .post(format!("{}/chapters", self.story_url(request.story_id)))
            .json(request)
            .send()
            .await?;
        Self::read_json(response).await
    }

    async fn download_story(&self, id: StoryId) -> ApiResult<DownloadPayload> {
        let response = self
            .client
            .get(format!("{}/download", self.story_url(id)))
            .send()
            .await?;
        let response = ensure_success(response)?;

        let content_disposition = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .map(header_text);
        let body = response.bytes().await?.to_vec();

        Ok(DownloadPayload {
            content_disposition,
            body,
        })
    }
}
