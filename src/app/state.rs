//! View state for the library and the story modal.

use crate::models::{Chapter, NewStory, Story, StoryId};
use crate::ui::render;
use crate::ui::view::Node;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Control {
    pub loading: bool,
    pub disabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlId {
    Create,
    Continue,
    Download,
}

/// The viewer context a request was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    pub story_id: StoryId,
    pub epoch: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModalState {
    Closed,
    Loading(Ticket),
    Open(Ticket),
    Error { ticket: Ticket, message: String },
}

/// Everything the page shows.
#[derive(Debug, Clone)]
pub struct Document {
    pub form: NewStory,
    pub continue_prompt: String,
    pub story_count: String,
    pub stories: Vec<Node>,
    pub empty_state_visible: bool,
    pub modal_title: String,
    pub modal_genre: String,
    pub viewer: Vec<Node>,
    pub scroll_to_bottom: bool,
    pub create_btn: Control,
    pub continue_btn: Control,
    pub download_btn: Control,
    pub alert: Option<String>,
}

impl Default for Document {
    fn default() -> Self {
        Document {
            form: NewStory::default(),
            continue_prompt: String::new(),
            story_count: count_label(0),
            stories: Vec::new(),
            empty_state_visible: false,
            modal_title: String::new(),
            modal_genre: String::new(),
            viewer: Vec::new(),
            scroll_to_bottom: false,
            create_btn: Control::default(),
            continue_btn: Control::default(),
            download_btn: Control::default(),
            alert: None,
        }
    }
}

impl Document {
    pub fn control(&self, id: ControlId) -> Control {
        match id {
            ControlId::Create => self.create_btn,
            ControlId::Continue => self.continue_btn,
            ControlId::Download => self.download_btn,
        }
    }

    pub fn control_mut(&mut self, id: ControlId) -> &mut Control {
        match id {
            ControlId::Create => &mut self.create_btn,
            ControlId::Continue => &mut self.continue_btn,
            ControlId::Download => &mut self.download_btn,
        }
    }
}

pub fn count_label(count: usize) -> String {
    format!("{} Stories", count)
}

#[derive(Debug, Clone)]
pub struct ViewState {
    pub doc: Document,
    pub modal: ModalState,
    epoch: u64,
}

impl Default for ViewState {
    fn default() -> Self {
        ViewState {
            doc: Document::default(),
            modal: ModalState::Closed,
            epoch: 0,
        }
    }
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// The story the modal is bound to, whatever its phase.
    pub fn selected(&self) -> Option<Ticket> {
        match &self.modal {
            ModalState::Closed => None,
            ModalState::Loading(ticket) | ModalState::Open(ticket) => Some(*ticket),
            ModalState::Error { ticket, .. } => Some(*ticket),
        }
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.selected() == Some(ticket)
    }

    pub fn modal_active(&self) -> bool {
        self.modal != ModalState::Closed
    }

    pub fn show_library(&mut self, stories: &[Story]) {
        self.doc.story_count = count_label(stories.len());
        self.doc.empty_state_visible = stories.is_empty();
        self.doc.stories = stories.iter().map(render::story_card).collect();
    }

    pub fn begin_open(&mut self, story_id: StoryId) -> Ticket {
        self.epoch += 1;
        let ticket = Ticket {
            story_id,
            epoch: self.epoch,
        };
        self.modal = ModalState::Loading(ticket);
        self.doc.modal_title.clear();
        self.doc.modal_genre.clear();
        self.doc.viewer = vec![render::loading_placeholder()];
        self.doc.scroll_to_bottom = false;
        ticket
    }

    /// Returns false when `ticket` no longer owns the modal.
    pub fn finish_open(&mut self, ticket: Ticket, story: &Story) -> bool {
        if self.modal != ModalState::Loading(ticket) {
            return false;
        }
        self.modal = ModalState::Open(ticket);
        self.doc.modal_title = story.title.clone();
        self.doc.modal_genre = story.genre.clone();
        self.doc.viewer = story.chapters.iter().map(render::chapter_block).collect();
        true
    }

    pub fn fail_open(&mut self, ticket: Ticket, message: &str) -> bool {
        if self.modal != ModalState::Loading(ticket) {
            return false;
        }
        self.modal = ModalState::Error {
            ticket,
            message: message.to_string(),
        };
        self.doc.viewer = vec![render::inline_error(message)];
        true
    }

    pub fn append_chapter(&mut self, ticket: Ticket, chapter: &Chapter) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.doc.viewer.push(render::chapter_block(chapter));
        self.doc.continue_prompt.clear();
        self.doc.scroll_to_bottom = true;
        true
    }

    pub fn close(&mut self) {
        self.epoch += 1;
        self.modal = ModalState::Closed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(id: StoryId, chapters: usize) -> Story {
        Story {
            id,
            title: format!("Story {}", id),
            genre: "Mystery".into(),
            prompt: "A locked room".into(),
            created_at: "2024-03-09T08:00:00".into(),
            chapters: (1..=chapters)
                .map(|n| Chapter {
                    chapter_number: n as u32,
                    title: format!("Part {}", n),
                    content: "...".into(),
                    id: None,
                    story_id: Some(id),
                })
                .collect(),
        }
    }

    #[test]
    fn count_label_tracks_list_length() {
        let mut state = ViewState::new();
        state.show_library(&[story(1, 0), story(2, 0)]);
        assert_eq!(state.doc.story_count, "2 Stories");
        assert_eq!(state.doc.stories.len(), 2);
        assert!(!state.doc.empty_state_visible);

        state.show_library(&[]);
        assert_eq!(state.doc.story_count, "0 Stories");
        assert!(state.doc.stories.is_empty());
        assert!(state.doc.empty_state_visible);
    }

    #[test]
    fn open_moves_through_loading_to_open() {
        let mut state = ViewState::new();
        let ticket = state.begin_open(7);
        assert_eq!(state.modal, ModalState::Loading(ticket));
        assert_eq!(state.doc.viewer.len(), 1);

        assert!(state.finish_open(ticket, &story(7, 2)));
        assert_eq!(state.modal, ModalState::Open(ticket));
        assert_eq!(state.doc.modal_title, "Story 7");
        assert_eq!(state.doc.viewer.len(), 2);
    }

    #[test]
    fn superseded_open_is_ignored() {
        let mut state = ViewState::new();
        let first = state.begin_open(1);
        let second = state.begin_open(2);

        assert!(!state.finish_open(first, &story(1, 3)));
        assert!(!state.fail_open(first, "Story not found"));
        assert_eq!(state.modal, ModalState::Loading(second));
    }

    #[test]
    fn close_clears_selection_and_invalidates() {
        let mut state = ViewState::new();
        let ticket = state.begin_open(4);
        state.close();

        assert_eq!(state.selected(), None);
        assert!(!state.modal_active());
        assert!(!state.append_chapter(ticket, &story(4, 1).chapters[0]));
    }

    #[test]
    fn reopening_same_story_gets_a_fresh_ticket() {
        let mut state = ViewState::new();
        let first = state.begin_open(5);
        let second = state.begin_open(5);
        assert_ne!(first, second);
        assert!(!state.is_current(first));
    }
}
