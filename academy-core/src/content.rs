//! Course content loading and page enumeration.
//!
//! The content root holds one directory per module. A directory is a module
//! when it contains `meta.yaml`; everything else is ignored. Modules are
//! visited in file-name order and then stable-sorted by their `order` key, so
//! two modules with the same order keep their directory order.

use crate::markdown::MarkdownProcessor;
use crate::models::{Lesson, LessonId, Module, Page, Quiz};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

const META_FILE: &str = "meta.yaml";

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("content directory not found: {0}")]
    MissingRoot(PathBuf),

    #[error("no modules found under {0}")]
    Empty(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to walk content directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("invalid module metadata {path}: {source}")]
    Meta {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid quiz file {path}: {source}")]
    Quiz {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("duplicate module id: {0}")]
    DuplicateModule(String),

    #[error("duplicate lesson slug '{slug}' in module '{module}'")]
    DuplicateLesson { module: String, slug: String },

    #[error("identifier '{0}' cannot be used in a URL path")]
    UnsafeIdentifier(String),
}

/// Load every module under `content_root`, ordered for display.
pub fn load_modules(content_root: &Path) -> Result<Vec<Module>, ContentError> {
    if !content_root.is_dir() {
        return Err(ContentError::MissingRoot(content_root.to_path_buf()));
    }

    let mut modules = Vec::new();
    for entry in WalkDir::new(content_root)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry?;
        if !entry.file_type().is_dir() {
            continue;
        }

        let meta_path = entry.path().join(META_FILE);
        if !meta_path.is_file() {
            tracing::debug!("Skipping {} (no {})", entry.path().display(), META_FILE);
            continue;
        }

        let raw = fs::read_to_string(&meta_path)?;
        let mut module: Module =
            serde_yaml::from_str(&raw).map_err(|source| ContentError::Meta {
                path: meta_path.clone(),
                source,
            })?;
        module.dir = entry.path().to_path_buf();
        modules.push(module);
    }

    if modules.is_empty() {
        return Err(ContentError::Empty(content_root.to_path_buf()));
    }

    // Vec::sort_by_key is stable
    modules.sort_by_key(|m| m.order);
    validate(&modules)?;

    tracing::info!(
        "Loaded {} modules from {}",
        modules.len(),
        content_root.display()
    );
    Ok(modules)
}

/// Every page reachable from the content model: home first, then for each
/// module its overview, its lessons in order and its quiz.
pub fn enumerate_pages(modules: &[Module]) -> Vec<Page> {
    let mut pages = vec![Page::Home];
    for module in modules {
        pages.push(Page::Module {
            module_id: module.id.clone(),
        });
        for lesson in &module.lessons {
            pages.push(Page::Lesson {
                module_id: module.id.clone(),
                slug: lesson.slug.clone(),
            });
        }
        pages.push(Page::Quiz {
            module_id: module.id.clone(),
        });
    }
    pages
}

/// Ids and slugs become path segments, so each must be distinct and safe
fn validate(modules: &[Module]) -> Result<(), ContentError> {
    let mut seen = HashSet::new();
    for module in modules {
        if !is_path_safe(&module.id) || module.id.contains(LessonId::SEPARATOR) {
            return Err(ContentError::UnsafeIdentifier(module.id.clone()));
        }
        if !seen.insert(module.id.as_str()) {
            return Err(ContentError::DuplicateModule(module.id.clone()));
        }

        let mut slugs = HashSet::new();
        for lesson in &module.lessons {
            if !is_path_safe(&lesson.slug) {
                return Err(ContentError::UnsafeIdentifier(lesson.slug.clone()));
            }
            if !slugs.insert(lesson.slug.as_str()) {
                return Err(ContentError::DuplicateLesson {
                    module: module.id.clone(),
                    slug: lesson.slug.clone(),
                });
            }
        }
    }
    Ok(())
}

fn is_path_safe(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && !segment.contains(['/', '\\', '?', '#'])
        && !segment.chars().any(char::is_whitespace)
}

/// A lesson resolved for display
#[derive(Debug, Clone)]
pub struct LessonView<'a> {
    pub module: &'a Module,
    pub lesson: &'a Lesson,
    pub index: usize,
    pub content_html: String,
    pub prev: Option<&'a Lesson>,
    pub next: Option<&'a Lesson>,
    pub lesson_id: LessonId,
}

impl LessonView<'_> {
    pub fn total_lessons(&self) -> usize {
        self.module.lessons.len()
    }
}

/// The loaded content model plus lookups used by the page handlers
#[derive(Debug, Clone)]
pub struct Course {
    root: PathBuf,
    modules: Vec<Module>,
    processor: MarkdownProcessor,
}

impl Course {
    pub fn load(content_root: &Path) -> Result<Self, ContentError> {
        Ok(Self {
            root: content_root.to_path_buf(),
            modules: load_modules(content_root)?,
            processor: MarkdownProcessor::new(),
        })
    }

    /// Re-read the content tree in place; on error the old model is kept
    pub fn reload(&mut self) -> Result<(), ContentError> {
        self.modules = load_modules(&self.root)?;
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn module(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn pages(&self) -> Vec<Page> {
        enumerate_pages(&self.modules)
    }

    /// Resolve and render a lesson. A missing markdown file renders an
    /// inline notice instead of failing the page.
    pub fn lesson(&self, module_id: &str, slug: &str) -> Option<LessonView<'_>> {
        let module = self.module(module_id)?;
        let (index, lesson) = module.lesson(slug)?;

        let source = lesson.source_path(&module.dir);
        let content_html = match fs::read_to_string(&source) {
            Ok(markdown) => self.processor.convert(&markdown),
            Err(err) => {
                tracing::warn!("Cannot read lesson {}: {}", source.display(), err);
                format!(
                    "<p><em>Content file not found: {}</em></p>",
                    escape_text(&lesson.file)
                )
            }
        };

        Some(LessonView {
            module,
            lesson,
            index,
            content_html,
            prev: index.checked_sub(1).and_then(|i| module.lessons.get(i)),
            next: module.lessons.get(index + 1),
            lesson_id: LessonId::new(&module.id, &lesson.slug),
        })
    }

    /// Load a module's quiz; `Ok(None)` when the module or quiz file is absent
    pub fn quiz(&self, module_id: &str) -> Result<Option<Quiz>, ContentError> {
        let Some(module) = self.module(module_id) else {
            return Ok(None);
        };

        let path = module.quiz_path();
        if !path.is_file() {
            return Ok(None);
        }

        let raw = fs::read_to_string(&path)?;
        let quiz = serde_yaml::from_str(&raw).map_err(|source| ContentError::Quiz {
            path: path.clone(),
            source,
        })?;
        Ok(Some(quiz))
    }
}

fn escape_text(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
