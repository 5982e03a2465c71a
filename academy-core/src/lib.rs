//! # academy-core
//!
//! Core library for the academy course server.
//!
//! This crate provides site configuration, the course content model and its
//! loader, markdown rendering, and quiz grading. Both the live server and the
//! static exporter build on it.

pub mod assets;
pub mod config;
pub mod content;
pub mod markdown;
pub mod models;
pub mod quiz;

pub use assets::{default_vendor_assets, AssetDescriptor};
pub use config::{Config, ConfigError};
pub use content::{enumerate_pages, load_modules, ContentError, Course, LessonView};
pub use markdown::{render_markdown, MarkdownProcessor};
pub use models::{Lesson, LessonId, Module, Page, Question, Quiz, QuizOption};
pub use quiz::{percent, AnswerKey, ModuleProgress, QuestionOutcome, QuizOutcome};
