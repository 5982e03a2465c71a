//! Askama template definitions.

use academy_core::assets;
use academy_core::{LessonView, Module, ModuleProgress, Question, QuizOutcome};
use askama::Template;
use std::collections::HashSet;

/// Third-party asset URLs linked from every page
#[derive(Debug, Clone)]
pub struct Cdn {
    pub highlight_css: &'static str,
    pub highlight_js: &'static str,
    pub highlight_yaml_js: &'static str,
    pub highlight_typescript_js: &'static str,
    pub mermaid_js: &'static str,
    pub htmx_js: &'static str,
}

impl Default for Cdn {
    fn default() -> Self {
        Self {
            highlight_css: assets::HIGHLIGHT_CSS,
            highlight_js: assets::HIGHLIGHT_JS,
            highlight_yaml_js: assets::HIGHLIGHT_YAML_JS,
            highlight_typescript_js: assets::HIGHLIGHT_TYPESCRIPT_JS,
            mermaid_js: assets::MERMAID_JS,
            htmx_js: assets::HTMX_JS,
        }
    }
}

/// A lesson link in the sidebar or a module's lesson list
#[derive(Debug, Clone)]
pub struct LessonEntry {
    pub slug: String,
    pub title: String,
    pub url: String,
    pub duration: Option<String>,
    pub completed: bool,
    pub active: bool,
}

/// A module in the sidebar, with its completion badge
#[derive(Debug, Clone)]
pub struct SidebarModule {
    pub id: String,
    pub title: String,
    pub url: String,
    /// JSON array of the module's lesson ids, read by client-side scripts
    pub lessons_json: String,
    pub progress: ModuleProgress,
    pub active: bool,
    pub lessons: Vec<LessonEntry>,
}

impl SidebarModule {
    pub fn badge_done(&self) -> bool {
        self.progress.is_complete()
    }
}

/// State shared by every page: site chrome, asset links and the sidebar
#[derive(Debug, Clone)]
pub struct Layout {
    pub site_title: String,
    pub page_title: String,
    pub cdn: Cdn,
    pub sidebar: Vec<SidebarModule>,
}

impl Layout {
    /// Build the chrome for a page. `completed` holds lesson id strings;
    /// `active` is the (module id, lesson slug) being viewed, if any.
    pub fn new(
        site_title: &str,
        page_title: impl Into<String>,
        modules: &[Module],
        completed: &HashSet<String>,
        active: Option<(&str, Option<&str>)>,
    ) -> Self {
        let sidebar = modules
            .iter()
            .map(|module| {
                let module_active = active.is_some_and(|(id, _)| id == module.id);
                let active_slug = active.and_then(|(_, slug)| slug);
                let ids: Vec<String> = module
                    .lesson_ids()
                    .into_iter()
                    .map(|id| id.to_string())
                    .collect();

                SidebarModule {
                    id: module.id.clone(),
                    title: module.title.clone(),
                    url: module.url(),
                    lessons_json: serde_json::to_string(&ids).unwrap_or_else(|_| "[]".into()),
                    progress: ModuleProgress::compute(module, completed),
                    active: module_active,
                    lessons: lesson_entries(module, completed, active_slug.filter(|_| module_active)),
                }
            })
            .collect();

        Self {
            site_title: site_title.to_string(),
            page_title: page_title.into(),
            cdn: Cdn::default(),
            sidebar,
        }
    }
}

/// Lesson rows for one module, marking completion and the active slug
pub fn lesson_entries(
    module: &Module,
    completed: &HashSet<String>,
    active_slug: Option<&str>,
) -> Vec<LessonEntry> {
    module
        .lessons
        .iter()
        .zip(module.lesson_ids())
        .map(|(lesson, id)| LessonEntry {
            slug: lesson.slug.clone(),
            title: lesson.title().to_string(),
            url: lesson.url(&module.id),
            duration: lesson.duration.clone(),
            completed: completed.contains(id.as_str()),
            active: active_slug == Some(lesson.slug.as_str()),
        })
        .collect()
}

/// A module card on the home page
#[derive(Debug, Clone)]
pub struct ModuleCard {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub url: String,
    pub lesson_count: usize,
    pub progress: ModuleProgress,
}

impl ModuleCard {
    pub fn new(module: &Module, completed: &HashSet<String>) -> Self {
        Self {
            id: module.id.clone(),
            title: module.title.clone(),
            description: module.description.clone(),
            url: module.url(),
            lesson_count: module.lessons.len(),
            progress: ModuleProgress::compute(module, completed),
        }
    }
}

/// Home page template
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub layout: Layout,
    pub site_description: Option<String>,
    pub modules: Vec<ModuleCard>,
    pub total_lessons: usize,
    pub total_done: usize,
    pub overall_pct: u32,
}

/// Module overview template
#[derive(Template)]
#[template(path = "module.html")]
pub struct ModuleTemplate {
    pub layout: Layout,
    pub module_id: String,
    pub title: String,
    pub description: Option<String>,
    pub lessons: Vec<LessonEntry>,
    pub progress: ModuleProgress,
    pub quiz_url: String,
}

/// A prev/next link on a lesson page
#[derive(Debug, Clone)]
pub struct NavLink {
    pub url: String,
    pub title: String,
}

/// The lesson completion affordance. Rendered inside lesson pages and on
/// its own as the response to a toggle request.
#[derive(Debug, Clone)]
pub struct ProgressToggle {
    pub lesson_id: String,
    pub module_id: String,
    pub lesson_slug: String,
    pub completed: bool,
}

impl ProgressToggle {
    pub fn button_class(&self) -> &'static str {
        if self.completed {
            "btn-success"
        } else {
            "btn-outline"
        }
    }

    pub fn label(&self) -> &'static str {
        if self.completed {
            "✅ Completed"
        } else {
            "Mark Complete"
        }
    }

    /// Value posted back as `currently_completed`
    pub fn state(&self) -> u8 {
        u8::from(self.completed)
    }
}

/// Toggle fragment returned to htmx
#[derive(Template)]
#[template(path = "progress_toggle.html")]
pub struct ProgressToggleTemplate {
    pub toggle: ProgressToggle,
}

/// Lesson page template
#[derive(Template)]
#[template(path = "lesson.html")]
pub struct LessonTemplate {
    pub layout: Layout,
    pub module_id: String,
    pub module_title: String,
    pub module_url: String,
    pub lesson_title: String,
    pub duration: Option<String>,
    /// 1-based position within the module
    pub position: usize,
    pub total_lessons: usize,
    pub content_html: String,
    pub prev: Option<NavLink>,
    pub next: Option<NavLink>,
    pub quiz_url: String,
    pub toggle: ProgressToggle,
}

impl LessonTemplate {
    pub fn new(layout: Layout, view: &LessonView<'_>, completed: bool) -> Self {
        let module = view.module;
        let link = |lesson: &academy_core::Lesson| NavLink {
            url: lesson.url(&module.id),
            title: lesson.title().to_string(),
        };

        Self {
            layout,
            module_id: module.id.clone(),
            module_title: module.title.clone(),
            module_url: module.url(),
            lesson_title: view.lesson.title().to_string(),
            duration: view.lesson.duration.clone(),
            position: view.index + 1,
            total_lessons: view.total_lessons(),
            content_html: view.content_html.clone(),
            prev: view.prev.map(link),
            next: view.next.map(link),
            quiz_url: module.quiz_url(),
            toggle: ProgressToggle {
                lesson_id: view.lesson_id.to_string(),
                module_id: module.id.clone(),
                lesson_slug: view.lesson.slug.clone(),
                completed,
            },
        }
    }
}

/// Best recorded attempt for a quiz
#[derive(Debug, Clone)]
pub struct BestAttempt {
    pub score: i64,
    pub total: i64,
    pub pct: u32,
}

/// Quiz page template, both before and after submission
#[derive(Template)]
#[template(path = "quiz.html")]
pub struct QuizTemplate {
    pub layout: Layout,
    pub module_id: String,
    pub module_title: String,
    pub module_url: String,
    pub quiz_id: String,
    pub quiz_title: String,
    pub quiz_url: String,
    pub passing_score: u32,
    pub questions: Vec<Question>,
    pub best: Option<BestAttempt>,
    pub outcome: Option<QuizOutcome>,
}

impl QuizTemplate {
    /// Answer the learner gave for a question in the graded submission
    pub fn answer_for(&self, question_id: &str) -> &str {
        self.outcome
            .as_ref()
            .and_then(|o| o.results.iter().find(|r| r.question_id == question_id))
            .map(|r| r.user_answer.as_str())
            .unwrap_or("")
    }
}

/// 404 error page template
#[derive(Template)]
#[template(path = "404.html")]
pub struct NotFoundTemplate {
    pub layout: Layout,
    pub message: String,
}
