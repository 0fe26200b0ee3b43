mod app;
mod config;
mod models;
mod services;
mod ui;

use app::{App, ClickTarget, Command};
use axum::{
    Form, Router,
    extract::{Path, State},
    response::{Html, Redirect},
    routing::{get, post},
};
use models::{NewStory, StoryId};
use serde::Deserialize;
use services::api::{HttpStoryBackend, StoryBackend};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, fmt};

type SharedApp<B> = Arc<App<B>>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let config = config::Config::from_env()?;
    let backend = HttpStoryBackend::new(&config.api_url);
    let app = Arc::new(App::new(backend, config.download_dir.clone()));

    let router = router(app).layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()));

    let listener = TcpListener::bind(config.bind).await?;
    tracing::info!(
        "Listening on {}, stories from {}",
        listener.local_addr()?,
        config.api_url
    );
    axum::serve(listener, router).await?;

    Ok(())
}

fn router<B: StoryBackend + 'static>(app: SharedApp<B>) -> Router {
    Router::new()
        .route("/", get(index::<B>))
        .route("/health", get(health_check))
        .route("/stories", post(create_story::<B>))
        .route("/open/:id", get(open_story::<B>))
        .route("/close", post(close_modal::<B>))
        .route("/modal/click", post(modal_click::<B>))
        .route("/continue", post(continue_story::<B>))
        .route("/download", post(download::<B>))
        .route("/alert/dismiss", post(dismiss_alert::<B>))
        .with_state(app)
}

#[derive(Debug, Deserialize)]
struct ModalClickForm {
    target: ClickTarget,
}

#[derive(Debug, Deserialize)]
struct ContinueForm {
    #[serde(default)]
    instructions: String,
}

/// Page load: refresh the library, then render.
async fn index<B: StoryBackend>(State(app): State<SharedApp<B>>) -> Html<String> {
    app.dispatch(Command::LoadLibrary).await;
    Html(app.render_page())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn create_story<B: StoryBackend>(
    State(app): State<SharedApp<B>>,
    Form(form): Form<NewStory>,
) -> Redirect {
    app.dispatch(Command::CreateStory(form)).await;
    Redirect::to("/")
}

async fn open_story<B: StoryBackend>(
    State(app): State<SharedApp<B>>,
    Path(id): Path<StoryId>,
) -> Redirect {
    app.dispatch(Command::OpenStory(id)).await;
    Redirect::to("/")
}

async fn close_modal<B: StoryBackend>(State(app): State<SharedApp<B>>) -> Redirect {
    app.dispatch(Command::CloseModal).await;
    Redirect::to("/")
}

async fn modal_click<B: StoryBackend>(
    State(app): State<SharedApp<B>>,
    Form(click): Form<ModalClickForm>,
) -> Redirect {
    app.dispatch(Command::ModalClick(click.target)).await;
    Redirect::to("/")
}

async fn continue_story<B: StoryBackend>(
    State(app): State<SharedApp<B>>,
    Form(form): Form<ContinueForm>,
) -> Redirect {
    app.dispatch(Command::ContinueStory {
        instructions: form.instructions,
    })
    .await;
    if app.take_scroll_request() {
        Redirect::to("/#viewer-end")
    } else {
        Redirect::to("/")
    }
}

async fn download<B: StoryBackend>(State(app): State<SharedApp<B>>) -> Redirect {
    app.dispatch(Command::Download).await;
    Redirect::to("/")
}

async fn dismiss_alert<B: StoryBackend>(State(app): State<SharedApp<B>>) -> Redirect {
    app.dispatch(Command::DismissAlert).await;
    Redirect::to("/")
}
