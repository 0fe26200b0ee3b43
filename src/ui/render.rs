use crate::app::state::{Control, ControlId, ViewState};
use crate::models::{Chapter, Story};
use crate::ui::view::{Node, el, render_all};
use chrono::{DateTime, NaiveDateTime};

pub const LOADING_TEXT: &str = "Loading Codex...";
const PREVIEW_CHARS: usize = 160;

pub fn story_card(story: &Story) -> Node {
    el("a")
        .class("story-card")
        .attr("href", format!("/open/{}", story.id))
        .child(
            el("div")
                .child(el("span").class("tag").text(&story.genre))
                .child(el("h3").text(&story.title))
                .child(el("p").class("prompt-preview").text(prompt_preview(&story.prompt))),
        )
        .child(
            el("div")
                .class("card-meta")
                .child(el("span").text(format_date(&story.created_at)))
                .child(el("span").text("Open \u{2192}")),
        )
        .into()
}

pub fn chapter_block(chapter: &Chapter) -> Node {
    el("div")
        .class("chapter")
        .child(
            el("div")
                .class("chapter-title")
                .text(format!("Chapter {}: {}", chapter.chapter_number, chapter.title)),
        )
        .child(el("div").class("chapter-content").text(&chapter.content))
        .into()
}

pub fn loading_placeholder() -> Node {
    el("div").class("viewer-placeholder").text(LOADING_TEXT).into()
}

pub fn inline_error(message: &str) -> Node {
    el("p").class("viewer-error").text(message).into()
}

/// Shortens a prompt for the library card, on a char boundary.
pub fn prompt_preview(prompt: &str) -> String {
    let prompt = prompt.trim();
    if prompt.chars().count() <= PREVIEW_CHARS {
        return prompt.to_string();
    }
    let cut: String = prompt.chars().take(PREVIEW_CHARS).collect();
    format!("{}\u{2026}", cut.trim_end())
}

/// `M/D/YYYY`, or the raw value when it is not a timestamp we know.
pub fn format_date(raw: &str) -> String {
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return stamp.format("%-m/%-d/%Y").to_string();
    }
    if let Ok(stamp) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return stamp.format("%-m/%-d/%Y").to_string();
    }
    raw.to_string()
}

fn button(label: &str, id: &'static str, control: Control) -> Node {
    let class = if control.loading { "btn loading" } else { "btn" };
    el("button")
        .attr("type", "submit")
        .attr("id", id)
        .class(class)
        .flag("disabled", control.disabled)
        .text(label)
        .into()
}

fn create_form(state: &ViewState) -> Node {
    let form = &state.doc.form;
    el("form")
        .attr("id", "storyForm")
        .attr("method", "post")
        .attr("action", "/stories")
        .child(
            el("input")
                .attr("name", "title")
                .attr("placeholder", "Title")
                .attr("value", &form.title)
                .flag("required", true),
        )
        .child(
            el("input")
                .attr("name", "genre")
                .attr("placeholder", "Genre")
                .attr("value", &form.genre)
                .flag("required", true),
        )
        .child(
            el("textarea")
                .attr("name", "prompt")
                .attr("placeholder", "Describe your story...")
                .flag("required", true)
                .text(&form.prompt),
        )
        .child(button("Forge Story", "createBtn", state.doc.control(ControlId::Create)))
        .into()
}

fn library(state: &ViewState) -> Node {
    let empty_class = if state.doc.empty_state_visible {
        "empty-state"
    } else {
        "empty-state hidden"
    };
    el("section")
        .class("library")
        .child(
            el("div")
                .class("library-head")
                .child(el("h2").text("Library"))
                .child(el("span").attr("id", "storyCount").text(&state.doc.story_count)),
        )
        .child(
            el("div")
                .attr("id", "emptyState")
                .class(empty_class)
                .text("No stories yet. Forge your first one."),
        )
        .child(
            el("div")
                .attr("id", "storiesList")
                .children(state.doc.stories.iter().cloned()),
        )
        .into()
}

fn post_form(action: &'static str, inner: Node) -> Node {
    el("form")
        .attr("method", "post")
        .attr("action", action)
        .child(inner)
        .into()
}

fn modal(state: &ViewState) -> Node {
    let doc = &state.doc;
    let class = if state.modal_active() { "modal active" } else { "modal" };

    let backdrop = el("form")
        .class("modal-backdrop")
        .attr("method", "post")
        .attr("action", "/modal/click")
        .child(
            el("button")
                .attr("name", "target")
                .attr("value", "backdrop")
                .attr("aria-label", "Close"),
        );

    let header = el("div")
        .class("modal-header")
        .child(
            el("div")
                .child(el("span").class("tag").attr("id", "modalGenre").text(&doc.modal_genre))
                .child(el("h2").attr("id", "modalTitle").text(&doc.modal_title)),
        )
        .child(post_form("/download", button("Download", "downloadBtn", doc.control(ControlId::Download))))
        .child(post_form(
            "/close",
            el("button").attr("type", "submit").attr("id", "closeModal").text("\u{00d7}").into(),
        ));

    let viewer = el("div")
        .attr("id", "storyViewer")
        .class("story-viewer")
        .children(doc.viewer.iter().cloned())
        .child(el("div").attr("id", "viewer-end"));

    let continue_form = el("form")
        .class("continue-form")
        .attr("method", "post")
        .attr("action", "/continue")
        .child(
            el("textarea")
                .attr("id", "continuePrompt")
                .attr("name", "instructions")
                .attr("placeholder", "What happens next? (optional)")
                .text(&doc.continue_prompt),
        )
        .child(button("Continue", "continueBtn", doc.control(ControlId::Continue)));

    el("div")
        .attr("id", "storyModal")
        .class(class)
        .child(backdrop)
        .child(
            el("div")
                .class("modal-content")
                .child(header)
                .child(viewer)
                .child(continue_form),
        )
        .into()
}

fn alert(message: &str) -> Node {
    el("div")
        .class("alert-overlay")
        .child(
            el("div")
                .class("alert-box")
                .attr("role", "alertdialog")
                .child(el("p").text(message))
                .child(post_form(
                    "/alert/dismiss",
                    el("button").attr("type", "submit").flag("autofocus", true).text("OK").into(),
                )),
        )
        .into()
}

pub fn page(state: &ViewState) -> String {
    let mut body: Vec<Node> = vec![
        el("header").child(el("h1").text("Forge")).into(),
        el("main")
            .child(el("section").class("create").child(create_form(state)))
            .child(library(state))
            .into(),
        modal(state),
    ];
    if let Some(message) = &state.doc.alert {
        body.push(alert(message));
    }

    format!(
        "<!DOCTYPE html><html><head><title>Forge AI Storyteller</title><meta charset=\"utf-8\"><style>{}</style></head><body>{}</body></html>",
        STYLE,
        render_all(&body)
    )
}

const STYLE: &str = r#"
body { font-family: Georgia, serif; margin: 0; background: #14121a; color: #e8e4f0; }
header, main { max-width: 960px; margin: 0 auto; padding: 1.5rem; }
input, textarea { display: block; width: 100%; margin: 0.5rem 0; padding: 0.6rem; background: #1f1c28; color: inherit; border: 1px solid #3a3548; border-radius: 6px; }
.btn { padding: 0.6rem 1.2rem; border-radius: 6px; border: none; background: #b98a3e; color: #14121a; cursor: pointer; }
.btn.loading { opacity: 0.6; cursor: progress; }
.library-head { display: flex; justify-content: space-between; align-items: baseline; }
#storiesList { display: grid; grid-template-columns: repeat(auto-fill, minmax(260px, 1fr)); gap: 1rem; }
.story-card { display: flex; flex-direction: column; justify-content: space-between; padding: 1rem; background: #1f1c28; border-radius: 8px; color: inherit; text-decoration: none; }
.story-card h3 { margin: 0.5rem 0 0 0; font-size: 1.1rem; }
.prompt-preview { color: #9a94aa; font-size: 0.9rem; margin-top: 0.5rem; }
.tag { font-size: 0.75rem; text-transform: uppercase; color: #b98a3e; }
.card-meta { display: flex; justify-content: space-between; color: #9a94aa; font-size: 0.8rem; margin-top: 1rem; }
.hidden { display: none; }
.empty-state { padding: 2rem; text-align: center; color: #9a94aa; }
.modal { display: none; position: fixed; inset: 0; }
.modal.active { display: block; }
.modal-backdrop button { position: fixed; inset: 0; width: 100%; height: 100%; border: none; background: rgba(0, 0, 0, 0.7); cursor: pointer; }
.modal-content { position: relative; max-width: 760px; margin: 4vh auto; max-height: 92vh; display: flex; flex-direction: column; background: #1f1c28; border-radius: 10px; padding: 1.5rem; }
.modal-header { display: flex; justify-content: space-between; align-items: center; gap: 1rem; }
.story-viewer { overflow-y: auto; flex: 1; margin: 1rem 0; }
.viewer-placeholder { text-align: center; padding: 2rem; color: #666; }
.viewer-error { color: red; text-align: center; }
.chapter { margin-bottom: 2rem; }
.chapter-title { font-weight: bold; color: #b98a3e; margin-bottom: 0.5rem; }
.chapter-content { white-space: pre-wrap; line-height: 1.6; }
.alert-overlay { position: fixed; inset: 0; background: rgba(0, 0, 0, 0.5); display: flex; align-items: center; justify-content: center; }
.alert-box { background: #2a2635; padding: 1.5rem; border-radius: 8px; min-width: 280px; text-align: center; }
"#;
