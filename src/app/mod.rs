//! Command layer: every user interaction becomes one `Command`, and every
//! command performs at most one request/response/render cycle.

pub mod state;
#[cfg(test)]
pub(crate) mod testing;

use crate::models::{ContinueRequest, NewStory, StoryId};
use crate::services::api::{ApiError, StoryBackend};
use crate::services::download::{resolve_filename, save_payload};
use crate::ui::render;
use parking_lot::Mutex;
use serde::Deserialize;
use state::{Control, ControlId, Ticket, ViewState};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

pub const CONTINUE_FALLBACK: &str = "Continue story naturally";
pub const CREATE_FAILED: &str = "Failed to forge story";
pub const CONTINUE_FAILED: &str = "Failed to generate chapter";
pub const DOWNLOAD_FAILED: &str = "Download failed";
pub const STORY_NOT_FOUND: &str = "Story not found";
pub const STORY_LOAD_FAILED: &str = "Failed to load story";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    LoadLibrary,
    CreateStory(NewStory),
    OpenStory(StoryId),
    CloseModal,
    ModalClick(ClickTarget),
    ContinueStory { instructions: String },
    Download,
    DismissAlert,
}

/// What a click inside the modal landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClickTarget {
    Backdrop,
    Content,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::LoadLibrary => "load_library",
            Command::CreateStory(_) => "create_story",
            Command::OpenStory(_) => "open_story",
            Command::CloseModal => "close_modal",
            Command::ModalClick(_) => "modal_click",
            Command::ContinueStory { .. } => "continue_story",
            Command::Download => "download",
            Command::DismissAlert => "dismiss_alert",
        }
    }

    /// Interactions are swallowed while an alert is up.
    fn blocked_by_alert(&self) -> bool {
        !matches!(self, Command::LoadLibrary | Command::DismissAlert)
    }
}

/// Marks a control busy and puts it back when dropped.
struct LoadingGuard {
    state: Arc<Mutex<ViewState>>,
    control: ControlId,
}

impl LoadingGuard {
    /// `None` when the control is already busy.
    fn engage(state: &Arc<Mutex<ViewState>>, control: ControlId, disable: bool) -> Option<Self> {
        let mut view = state.lock();
        let current = view.doc.control_mut(control);
        if current.loading {
            return None;
        }
        *current = Control {
            loading: true,
            disabled: disable,
        };
        Some(LoadingGuard {
            state: Arc::clone(state),
            control,
        })
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        *self.state.lock().doc.control_mut(self.control) = Control::default();
    }
}

pub struct App<B> {
    backend: B,
    state: Arc<Mutex<ViewState>>,
    epoch: watch::Sender<u64>,
    download_dir: PathBuf,
}

/// Fails a still-loading open if its request is abandoned, e.g. when the
/// client disconnects and the handler future is dropped mid-request.
struct PendingOpen {
    state: Arc<Mutex<ViewState>>,
    ticket: Ticket,
}

impl Drop for PendingOpen {
    fn drop(&mut self) {
        // No-op once the ticket has landed, failed, or been superseded.
        if self.state.lock().fail_open(self.ticket, STORY_LOAD_FAILED) {
            warn!(story_id = self.ticket.story_id, "story load abandoned");
        }
    }
}

impl<B: StoryBackend> App<B> {
    pub fn new(backend: B, download_dir: impl Into<PathBuf>) -> Self {
        let (epoch, _) = watch::channel(0);
        App {
            backend,
            state: Arc::new(Mutex::new(ViewState::new())),
            epoch,
            download_dir: download_dir.into(),
        }
    }

    pub async fn dispatch(&self, command: Command) {
        let span = info_span!("command", name = command.name(), request_id = %Uuid::new_v4());
        self.handle(command).instrument(span).await
    }

    async fn handle(&self, command: Command) {
        if command.blocked_by_alert() && self.state.lock().doc.alert.is_some() {
            debug!("alert pending, command ignored");
            return;
        }

        match command {
            Command::LoadLibrary => self.load_library().await,
            Command::CreateStory(form) => self.create_story(form).await,
            Command::OpenStory(id) => self.open_story(id).await,
            Command::CloseModal => self.close_modal(),
            Command::ModalClick(ClickTarget::Backdrop) => self.close_modal(),
            Command::ModalClick(ClickTarget::Content) => {}
            Command::ContinueStory { instructions } => self.continue_story(instructions).await,
            Command::Download => self.download().await,
            Command::DismissAlert => {
                self.state.lock().doc.alert = None;
            }
        }
    }

    pub fn render_page(&self) -> String {
        render::page(&self.state.lock())
    }

    /// True once after a continuation landed, so the next page can jump to it.
    pub fn take_scroll_request(&self) -> bool {
        std::mem::take(&mut self.state.lock().doc.scroll_to_bottom)
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> ViewState {
        self.state.lock().clone()
    }

    async fn load_library(&self) {
        match self.backend.list_stories().await {
            Ok(stories) => {
                self.state.lock().show_library(&stories);
                info!(count = stories.len(), "library loaded");
            }
            // No banner here, unlike the other commands.
            Err(e) => error!(error = %e, "Failed to load stories"),
        }
    }

    async fn create_story(&self, form: NewStory) {
        let Some(_loading) = LoadingGuard::engage(&self.state, ControlId::Create, true) else {
            debug!("create already in flight");
            return;
        };
        self.state.lock().doc.form = form.clone();

        let story = match self.backend.create_story(&form).await {
            Ok(story) => story,
            Err(e) => {
                warn!(error = %e, "story creation failed");
                self.alert(CREATE_FAILED);
                return;
            }
        };
        info!(story_id = story.id, "story created");

        self.state.lock().doc.form = NewStory::default();
        self.load_library().await;
        self.open_story(story.id).await;
    }

    async fn open_story(&self, id: StoryId) {
        let ticket = self.transition(|state| state.begin_open(id));
        let _pending = PendingOpen {
            state: Arc::clone(&self.state),
            ticket,
        };

        let Some(result) = self.unless_superseded(ticket, self.backend.get_story(id)).await else {
            debug!(story_id = id, "story load superseded");
            return;
        };

        let applied = match result {
            Ok(story) => self.state.lock().finish_open(ticket, &story),
            Err(e) => {
                warn!(story_id = id, error = %e, "story load failed");
                self.state.lock().fail_open(ticket, open_failure_message(&e))
            }
        };
        if !applied {
            debug!(story_id = id, "stale story response dropped");
        }
    }

    fn close_modal(&self) {
        self.transition(ViewState::close);
    }

    async fn continue_story(&self, instructions: String) {
        let Some(ticket) = self.state.lock().selected() else {
            debug!("no story selected");
            return;
        };
        let Some(_loading) = LoadingGuard::engage(&self.state, ControlId::Continue, true) else {
            debug!("continuation already in flight");
            return;
        };
        self.state.lock().doc.continue_prompt = instructions.clone();

        let request = ContinueRequest {
            story_id: ticket.story_id,
            instructions: continuation_instructions(&instructions),
        };
        match self.unless_superseded(ticket, self.backend.add_chapter(&request)).await {
            None => debug!(story_id = ticket.story_id, "continuation superseded"),
            Some(Ok(chapter)) => {
                if self.state.lock().append_chapter(ticket, &chapter) {
                    info!(
                        story_id = ticket.story_id,
                        chapter = chapter.chapter_number,
                        "chapter appended"
                    );
                } else {
                    debug!(story_id = ticket.story_id, "stale chapter dropped");
                }
            }
            Some(Err(e)) => {
                warn!(story_id = ticket.story_id, error = %e, "continuation failed");
                self.alert(CONTINUE_FAILED);
            }
        }
    }

    async fn download(&self) {
        let Some(ticket) = self.state.lock().selected() else {
            debug!("no story selected");
            return;
        };
        let Some(_loading) = LoadingGuard::engage(&self.state, ControlId::Download, false) else {
            debug!("download already in flight");
            return;
        };

        let payload = match self
            .unless_superseded(ticket, self.backend.download_story(ticket.story_id))
            .await
        {
            None => {
                debug!(story_id = ticket.story_id, "download superseded");
                return;
            }
            Some(Ok(payload)) => payload,
            Some(Err(e)) => {
                warn!(story_id = ticket.story_id, error = %e, "download failed");
                self.alert(DOWNLOAD_FAILED);
                return;
            }
        };

        let filename = resolve_filename(payload.content_disposition.as_deref(), ticket.story_id);
        match save_payload(&self.download_dir, &filename, &payload.body) {
            Ok(path) => info!(path = %path.display(), "story saved"),
            Err(e) => {
                error!(error = %e, "saving download failed");
                self.alert(DOWNLOAD_FAILED);
            }
        }
    }

    fn alert(&self, message: &str) {
        self.state.lock().doc.alert = Some(message.to_string());
    }

    /// Applies a selection change and announces the new epoch.
    fn transition<R>(&self, change: impl FnOnce(&mut ViewState) -> R) -> R {
        let mut state = self.state.lock();
        let out = change(&mut state);
        self.epoch.send_replace(state.epoch());
        out
    }

    /// Runs `request` until it finishes or the view moves past `ticket`.
    /// Dropping the request future aborts the underlying HTTP call.
    async fn unless_superseded<F: Future>(&self, ticket: Ticket, request: F) -> Option<F::Output> {
        let epoch = self.epoch.subscribe();
        tokio::select! {
            output = request => Some(output),
            _ = superseded(epoch, ticket.epoch) => None,
        }
    }
}

async fn superseded(mut epoch: watch::Receiver<u64>, issued: u64) {
    loop {
        if *epoch.borrow_and_update() != issued {
            return;
        }
        if epoch.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

fn open_failure_message(err: &ApiError) -> &'static str {
    if err.is_status() {
        STORY_NOT_FOUND
    } else {
        STORY_LOAD_FAILED
    }
}

fn continuation_instructions(input: &str) -> String {
    if input.trim().is_empty() {
        CONTINUE_FALLBACK.to_string()
    } else {
        input.to_string()
    }
}
