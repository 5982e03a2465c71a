//! # academy-render
//!
//! HTML page templates for the academy course server.
//!
//! This crate handles HTML template rendering using Askama. Every page shares
//! the [`Layout`] chrome: asset links, the module sidebar with progress
//! badges, and the `main.main-content` container.

pub mod templates;

pub use templates::{
    BestAttempt, Cdn, IndexTemplate, Layout, LessonEntry, LessonTemplate, ModuleCard,
    ModuleTemplate, NavLink, NotFoundTemplate, ProgressToggle, ProgressToggleTemplate,
    QuizTemplate, SidebarModule,
};
