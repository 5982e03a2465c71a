//! HTTP routes for the course site.

use crate::store::ProgressStore;
use crate::ServerError;
use academy_core::{percent, Config, Course, ModuleProgress, Quiz};
use academy_render::{
    BestAttempt, IndexTemplate, Layout, LessonTemplate, ModuleCard, ModuleTemplate,
    NotFoundTemplate, ProgressToggle, ProgressToggleTemplate, QuizTemplate,
};
use askama::Template;
use axum::{
    extract::{Form, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::{services::ServeDir, trace::TraceLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub course: Arc<RwLock<Course>>,
    pub store: ProgressStore,
}

impl AppState {
    pub fn new(config: Config, course: Course, store: ProgressStore) -> Self {
        Self {
            config: Arc::new(config),
            course: Arc::new(RwLock::new(course)),
            store,
        }
    }

    fn site_title(&self) -> &str {
        &self.config.site.title
    }
}

/// Build the application router
pub fn router(state: AppState) -> Router {
    let static_dir = state.config.static_dir();

    Router::new()
        .route("/", get(index))
        .route("/module/{module_id}", get(module_overview))
        .route("/module/{module_id}/lesson/{slug}", get(lesson_view))
        .route("/module/{module_id}/quiz", get(quiz_view).post(quiz_submit))
        .route("/progress/toggle", post(toggle_progress))
        .route("/api/progress", get(api_progress))
        .route("/healthz", get(healthz))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn page<T: Template>(template: T) -> Result<Response, ServerError> {
    Ok(Html(template.render()?).into_response())
}

fn not_found(state: &AppState, course: &Course, message: &str) -> Result<Response, ServerError> {
    let layout = Layout::new(
        state.site_title(),
        "Not found",
        course.modules(),
        &HashSet::new(),
        None,
    );
    let body = NotFoundTemplate {
        layout,
        message: message.to_string(),
    }
    .render()?;
    Ok((StatusCode::NOT_FOUND, Html(body)).into_response())
}

async fn index(State(state): State<AppState>) -> Result<Response, ServerError> {
    let completed = state.store.completed_ids().await?;
    let course = state.course.read().await;

    let modules: Vec<ModuleCard> = course
        .modules()
        .iter()
        .map(|m| ModuleCard::new(m, &completed))
        .collect();
    let total_lessons = modules.iter().map(|m| m.progress.total).sum();
    let total_done = modules.iter().map(|m| m.progress.done).sum();

    page(IndexTemplate {
        layout: Layout::new(state.site_title(), "Home", course.modules(), &completed, None),
        site_description: state.config.site.description.clone(),
        modules,
        total_lessons,
        total_done,
        overall_pct: percent(total_done, total_lessons),
    })
}

async fn module_overview(
    State(state): State<AppState>,
    Path(module_id): Path<String>,
) -> Result<Response, ServerError> {
    let completed = state.store.completed_ids().await?;
    let course = state.course.read().await;

    let Some(module) = course.module(&module_id) else {
        return not_found(&state, &course, "Module not found");
    };

    page(ModuleTemplate {
        layout: Layout::new(
            state.site_title(),
            module.title.clone(),
            course.modules(),
            &completed,
            Some((module.id.as_str(), None)),
        ),
        module_id: module.id.clone(),
        title: module.title.clone(),
        description: module.description.clone(),
        lessons: academy_render::templates::lesson_entries(module, &completed, None),
        progress: ModuleProgress::compute(module, &completed),
        quiz_url: module.quiz_url(),
    })
}

async fn lesson_view(
    State(state): State<AppState>,
    Path((module_id, slug)): Path<(String, String)>,
) -> Result<Response, ServerError> {
    let completed = state.store.completed_ids().await?;
    let course = state.course.read().await;

    let Some(view) = course.lesson(&module_id, &slug) else {
        return not_found(&state, &course, "Lesson not found");
    };

    let layout = Layout::new(
        state.site_title(),
        view.lesson.title(),
        course.modules(),
        &completed,
        Some((view.module.id.as_str(), Some(view.lesson.slug.as_str()))),
    );
    let is_completed = completed.contains(view.lesson_id.as_str());
    page(LessonTemplate::new(layout, &view, is_completed))
}

#[derive(Debug, Deserialize)]
pub struct ToggleForm {
    pub lesson_id: String,
    pub module_id: String,
    pub lesson_slug: String,
    #[serde(default)]
    pub currently_completed: u8,
}

/// Flip a lesson's completion and return the replacement toggle fragment
async fn toggle_progress(
    State(state): State<AppState>,
    Form(form): Form<ToggleForm>,
) -> Result<Response, ServerError> {
    let completed = if form.currently_completed != 0 {
        state
            .store
            .mark_incomplete(&form.lesson_id, &form.module_id, &form.lesson_slug)
            .await?;
        false
    } else {
        state
            .store
            .mark_complete(&form.lesson_id, &form.module_id, &form.lesson_slug)
            .await?;
        true
    };
    tracing::debug!(lesson = %form.lesson_id, completed, "Toggled lesson progress");

    page(ProgressToggleTemplate {
        toggle: ProgressToggle {
            lesson_id: form.lesson_id,
            module_id: form.module_id,
            lesson_slug: form.lesson_slug,
            completed,
        },
    })
}

async fn quiz_view(
    State(state): State<AppState>,
    Path(module_id): Path<String>,
) -> Result<Response, ServerError> {
    render_quiz(&state, &module_id, None).await
}

async fn quiz_submit(
    State(state): State<AppState>,
    Path(module_id): Path<String>,
    Form(answers): Form<HashMap<String, String>>,
) -> Result<Response, ServerError> {
    render_quiz(&state, &module_id, Some(answers)).await
}

/// Render a quiz page, grading and recording `answers` when present
async fn render_quiz(
    state: &AppState,
    module_id: &str,
    answers: Option<HashMap<String, String>>,
) -> Result<Response, ServerError> {
    let quiz: Option<Quiz> = state.course.read().await.quiz(module_id)?;
    let Some(quiz) = quiz else {
        let course = state.course.read().await;
        let message = if course.module(module_id).is_some() {
            "Quiz not found for this module"
        } else {
            "Module not found"
        };
        return not_found(state, &course, message);
    };

    let outcome = match answers {
        Some(answers) => {
            let outcome = quiz.grade(&answers);
            state
                .store
                .save_quiz_attempt(&quiz.id, outcome.correct, outcome.total, &answers)
                .await?;
            tracing::info!(
                quiz = %quiz.id,
                score = outcome.correct,
                total = outcome.total,
                "Recorded quiz attempt"
            );
            Some(outcome)
        }
        None => None,
    };

    let best = state.store.quiz_best(&quiz.id).await?.map(|a| BestAttempt {
        score: a.score,
        total: a.total,
        pct: percent(a.score.max(0) as usize, a.total.max(0) as usize),
    });
    let completed = state.store.completed_ids().await?;
    let course = state.course.read().await;

    // The module can vanish between the two reads if content reloads
    let Some(module) = course.module(module_id) else {
        return not_found(state, &course, "Module not found");
    };

    let quiz_title = quiz
        .title
        .clone()
        .unwrap_or_else(|| format!("{} Quiz", module.title));

    page(QuizTemplate {
        layout: Layout::new(
            state.site_title(),
            quiz_title.clone(),
            course.modules(),
            &completed,
            Some((module.id.as_str(), None)),
        ),
        module_id: module.id.clone(),
        module_title: module.title.clone(),
        module_url: module.url(),
        quiz_id: quiz.id.clone(),
        quiz_title,
        quiz_url: module.quiz_url(),
        passing_score: quiz.passing_score,
        questions: quiz.questions,
        best,
        outcome,
    })
}

#[derive(Debug, Serialize)]
struct ModuleSummary {
    module_id: String,
    title: String,
    done: usize,
    total: usize,
    pct: u32,
}

#[derive(Debug, Serialize)]
struct ProgressPayload {
    modules: Vec<ModuleSummary>,
    raw: BTreeMap<String, crate::store::LessonRecord>,
}

async fn api_progress(State(state): State<AppState>) -> Result<Response, ServerError> {
    let raw = state.store.progress().await?;
    let completed: HashSet<String> = raw
        .values()
        .filter(|r| r.is_completed())
        .map(|r| r.id.clone())
        .collect();

    let course = state.course.read().await;
    let modules = course
        .modules()
        .iter()
        .map(|m| {
            let progress = ModuleProgress::compute(m, &completed);
            ModuleSummary {
                module_id: m.id.clone(),
                title: m.title.clone(),
                done: progress.done,
                total: progress.total,
                pct: progress.pct,
            }
        })
        .collect();

    Ok(Json(ProgressPayload { modules, raw }).into_response())
}

async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

async fn fallback(State(state): State<AppState>) -> Result<Response, ServerError> {
    let course = state.course.read().await;
    not_found(&state, &course, "Page not found")
}
