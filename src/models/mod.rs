use serde::{Deserialize, Serialize};

pub type StoryId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chapter {
    pub chapter_number: u32,
    pub title: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub story_id: Option<StoryId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    pub genre: String,
    pub prompt: String,
    /// Kept as sent; the backend emits naive ISO timestamps.
    pub created_at: String,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
}

/// Body of the create request. Also the shape of the create form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewStory {
    pub title: String,
    pub genre: String,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinueRequest {
    pub story_id: StoryId,
    pub instructions: String,
}

/// Raw download body plus the filename the server suggested, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadPayload {
    pub content_disposition: Option<String>,
    pub body: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn story_accepts_backend_extras() {
        let raw = r#"{
            "id": 3,
            "title": "The Lantern",
            "genre": "Fantasy",
            "prompt": "A lighthouse keeper finds a door",
            "full_story": "ignored",
            "created_at": "2024-05-01T10:20:30.123456",
            "chapters": [
                {"id": 9, "story_id": 3, "chapter_number": 1, "title": "Door", "content": "It creaked."}
            ]
        }"#;
        let story: Story = serde_json::from_str(raw).unwrap();
        assert_eq!(story.id, 3);
        assert_eq!(story.chapters.len(), 1);
        assert_eq!(story.chapters[0].story_id, Some(3));
    }

    #[test]
    fn chapters_default_to_empty() {
        let raw = r#"{"id":1,"title":"t","genre":"g","prompt":"p","created_at":"2024-01-01T00:00:00"}"#;
        let story: Story = serde_json::from_str(raw).unwrap();
        assert!(story.chapters.is_empty());
    }
}
