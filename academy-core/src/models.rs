//! Content model structs for modules, lessons, quizzes and pages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

const DEFAULT_QUIZ_FILE: &str = "quiz.yaml";

fn default_order() -> i64 {
    999
}

/// A top-level course unit, read from `<module-dir>/meta.yaml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Module {
    /// Stable identifier used in URLs (e.g., "module-01-overview")
    pub id: String,

    /// Display title
    pub title: String,

    /// Ordering key; lower sorts first
    #[serde(default = "default_order")]
    pub order: i64,

    #[serde(default)]
    pub description: Option<String>,

    /// Lessons in reading order
    #[serde(default)]
    pub lessons: Vec<Lesson>,

    /// Quiz file relative to the module directory
    #[serde(default)]
    pub quiz_file: Option<String>,

    /// Directory the module was loaded from
    #[serde(skip)]
    pub dir: PathBuf,
}

impl Module {
    /// URL path of the module overview page
    pub fn url(&self) -> String {
        Page::Module {
            module_id: self.id.clone(),
        }
        .path()
    }

    /// URL path of the module quiz page
    pub fn quiz_url(&self) -> String {
        Page::Quiz {
            module_id: self.id.clone(),
        }
        .path()
    }

    /// Location of the quiz file (which may not exist)
    pub fn quiz_path(&self) -> PathBuf {
        self.dir
            .join(self.quiz_file.as_deref().unwrap_or(DEFAULT_QUIZ_FILE))
    }

    /// Find a lesson and its position by slug
    pub fn lesson(&self, slug: &str) -> Option<(usize, &Lesson)> {
        self.lessons.iter().enumerate().find(|(_, l)| l.slug == slug)
    }

    /// Progress keys of every lesson in this module, in order
    pub fn lesson_ids(&self) -> Vec<LessonId> {
        self.lessons
            .iter()
            .map(|l| LessonId::new(&self.id, &l.slug))
            .collect()
    }
}

/// A single content unit within a module
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    /// Unique within the module
    pub slug: String,

    #[serde(default)]
    pub title: Option<String>,

    /// Markdown file relative to the module directory
    pub file: String,

    /// Free-form reading time, e.g. "10 min"
    #[serde(default)]
    pub duration: Option<String>,
}

impl Lesson {
    /// Display title, falling back to the slug
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.slug)
    }

    /// URL path of this lesson within `module_id`
    pub fn url(&self, module_id: &str) -> String {
        Page::Lesson {
            module_id: module_id.to_string(),
            slug: self.slug.clone(),
        }
        .path()
    }

    /// Source file resolved against the module directory
    pub fn source_path(&self, module_dir: &Path) -> PathBuf {
        module_dir.join(&self.file)
    }
}

/// Composite progress key `"<module_id>::<slug>"`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LessonId(String);

impl LessonId {
    pub const SEPARATOR: &'static str = "::";

    pub fn new(module_id: &str, slug: &str) -> Self {
        Self(format!("{}{}{}", module_id, Self::SEPARATOR, slug))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split back into (module_id, slug)
    pub fn parts(&self) -> Option<(&str, &str)> {
        self.0.split_once(Self::SEPARATOR)
    }
}

impl fmt::Display for LessonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A module quiz, read from the module's quiz file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,

    #[serde(default)]
    pub title: Option<String>,

    /// Minimum percentage needed to pass
    #[serde(default = "default_passing_score")]
    pub passing_score: u32,

    #[serde(default)]
    pub questions: Vec<Question>,
}

fn default_passing_score() -> u32 {
    70
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: String,

    #[serde(alias = "question")]
    pub prompt: String,

    #[serde(default)]
    pub options: Vec<QuizOption>,

    /// Key of the correct option
    pub correct: String,

    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizOption {
    pub key: String,
    pub text: String,
}

/// A URL-addressable view derived from the content model
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Page {
    Home,
    Module { module_id: String },
    Lesson { module_id: String, slug: String },
    Quiz { module_id: String },
}

impl Page {
    /// Canonical URL path
    pub fn path(&self) -> String {
        match self {
            Page::Home => "/".to_string(),
            Page::Module { module_id } => format!("/module/{}", module_id),
            Page::Lesson { module_id, slug } => {
                format!("/module/{}/lesson/{}", module_id, slug)
            }
            Page::Quiz { module_id } => format!("/module/{}/quiz", module_id),
        }
    }

    /// Module this page belongs to, if any
    pub fn module_id(&self) -> Option<&str> {
        match self {
            Page::Home => None,
            Page::Module { module_id }
            | Page::Lesson { module_id, .. }
            | Page::Quiz { module_id } => Some(module_id),
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}
