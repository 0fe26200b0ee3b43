//! In-memory story backend for command and router tests.

use crate::models::{Chapter, ContinueRequest, DownloadPayload, NewStory, Story, StoryId};
use crate::services::api::{ApiError, ApiResult, StoryBackend};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::StatusCode;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Default)]
struct Inner {
    stories: Mutex<Vec<Story>>,
    calls: Mutex<Vec<String>>,
    failing: Mutex<HashSet<&'static str>>,
    gates: Mutex<HashMap<StoryId, Arc<Notify>>>,
    download_gates: Mutex<HashMap<StoryId, Arc<Notify>>>,
    disposition: Mutex<Option<String>>,
}

#[derive(Clone, Default)]
pub(crate) struct FakeBackend {
    inner: Arc<Inner>,
}

impl FakeBackend {
    pub(crate) fn with_story(self, title: &str, chapters: u32) -> Self {
        {
            let mut stories = self.inner.stories.lock();
            let id = stories.len() as StoryId + 1;
            stories.push(story(id, title, chapters));
        }
        self
    }

    pub(crate) fn fail(&self, op: &'static str) {
        self.inner.failing.lock().insert(op);
    }

    pub(crate) fn heal(&self, op: &'static str) {
        self.inner.failing.lock().remove(op);
    }

    pub(crate) fn gate(&self, id: StoryId) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.inner.gates.lock().insert(id, Arc::clone(&gate));
        gate
    }

    pub(crate) fn gate_download(&self, id: StoryId) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.inner.download_gates.lock().insert(id, Arc::clone(&gate));
        gate
    }

    pub(crate) fn set_disposition(&self, value: &str) {
        *self.inner.disposition.lock() = Some(value.to_string());
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().clone()
    }

    fn record(&self, call: String, op: &'static str) -> ApiResult<()> {
        self.inner.calls.lock().push(call);
        if self.inner.failing.lock().contains(op) {
            Err(ApiError::Status(StatusCode::INTERNAL_SERVER_ERROR))
        } else {
            Ok(())
        }
    }
}

fn story(id: StoryId, title: &str, chapters: u32) -> Story {
    Story {
        id,
        title: title.to_string(),
        genre: "Fantasy".into(),
        prompt: "A map that redraws itself".into(),
        created_at: "2024-05-01T10:20:30".into(),
        chapters: (1..=chapters).map(|n| chapter(id, n, &format!("Part {}", n))).collect(),
    }
}

fn chapter(story_id: StoryId, number: u32, content: &str) -> Chapter {
    Chapter {
        chapter_number: number,
        title: format!("Title {}", number),
        content: content.to_string(),
        id: None,
        story_id: Some(story_id),
    }
}

#[async_trait]
impl StoryBackend for FakeBackend {
    async fn list_stories(&self) -> ApiResult<Vec<Story>> {
        self.record("list".into(), "list")?;
        Ok(self.inner.stories.lock().clone())
    }

    async fn create_story(&self, new: &NewStory) -> ApiResult<Story> {
        self.record("create".into(), "create")?;
        let mut stories = self.inner.stories.lock();
        let mut created = story(stories.len() as StoryId + 1, &new.title, 1);
        created.genre = new.genre.clone();
        created.prompt = new.prompt.clone();
        stories.push(created.clone());
        Ok(created)
    }

    async fn get_story(&self, id: StoryId) -> ApiResult<Story> {
        self.record(format!("get {}", id), "get")?;
        let gate = self.inner.gates.lock().get(&id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.inner
            .stories
            .lock()
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(ApiError::Status(StatusCode::NOT_FOUND))
    }

    async fn add_chapter(&self, request: &ContinueRequest) -> ApiResult<Chapter> {
        self.record(format!("chapter {}", request.story_id), "chapter")?;
        let mut stories = self.inner.stories.lock();
        let target = stories
            .iter_mut()
            .find(|s| s.id == request.story_id)
            .ok_or(ApiError::Status(StatusCode::NOT_FOUND))?;
        let next = chapter(
            request.story_id,
            target.chapters.len() as u32 + 1,
            &request.instructions,
        );
        target.chapters.push(next.clone());
        Ok(next)
    }

    async fn download_story(&self, id: StoryId) -> ApiResult<DownloadPayload> {
        self.record(format!("download {}", id), "download")?;
        let gate = self.inner.download_gates.lock().get(&id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(DownloadPayload {
            content_disposition: self.inner.disposition.lock().clone(),
            body: format!("Title: story {}", id).into_bytes(),
        })
    }
}
