//! Init command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = include_str!("../../../academy.yml.example");
const APP_CSS: &str = include_str!("../../../static/css/app.css");
const APP_JS: &str = include_str!("../../../static/js/app.js");

const SAMPLE_META: &str = r#"id: getting-started
title: Getting Started
order: 1
description: A short tour of how a course is put together.
lessons:
  - slug: welcome
    title: Welcome
    file: welcome.md
    duration: 5 min
  - slug: writing-lessons
    title: Writing Lessons
    file: writing-lessons.md
    duration: 10 min
"#;

const SAMPLE_WELCOME: &str = r#"# Welcome

Every module is a directory under `course/` holding a `meta.yaml`, one
Markdown file per lesson and an optional `quiz.yaml`.

> **Tip:** run `academy serve` and edit this file; the page reloads its
> content on the next request.

```mermaid
graph LR
  Module --> Lesson
  Module --> Quiz
```
"#;

const SAMPLE_WRITING: &str = r#"# Writing Lessons

Lessons are plain Markdown with a few extras:

- fenced code blocks are highlighted in the browser
- `mermaid` blocks become diagrams
- block quotes starting with **Note:**, **Warning:**, **Exercise:** or
  **Tip:** render as callouts

> **Exercise:** add a third lesson to `meta.yaml`.

When you are done, `academy export` writes the whole site to `dist/`.
"#;

const SAMPLE_QUIZ: &str = r#"id: getting-started-quiz
title: Getting Started Quiz
passing_score: 50
questions:
  - id: q1
    prompt: Which file lists a module's lessons?
    options:
      - { key: a, text: meta.yaml }
      - { key: b, text: quiz.yaml }
    correct: a
    explanation: meta.yaml holds the module title, order and lessons.
  - id: q2
    prompt: Which command produces a static site?
    options:
      - { key: a, text: academy serve }
      - { key: b, text: academy export }
    correct: b
"#;

/// Initialize a new course project
pub fn init_project(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("Failed to create {:?}", root))?;

    write_if_missing(&root.join("academy.yml"), DEFAULT_CONFIG)?;
    scaffold_course(root)?;
    write_if_missing(&root.join("static/css/app.css"), APP_CSS)?;
    write_if_missing(&root.join("static/js/app.js"), APP_JS)?;

    println!("✓ academy initialized in {:?}", root);
    println!("  - Edit academy.yml to set the site title");
    println!("  - Add modules under course/, then run `academy serve`");
    Ok(())
}

fn scaffold_course(root: &Path) -> Result<()> {
    let module = root.join("course/01-getting-started");
    write_if_missing(&module.join("meta.yaml"), SAMPLE_META)?;
    write_if_missing(&module.join("welcome.md"), SAMPLE_WELCOME)?;
    write_if_missing(&module.join("writing-lessons.md"), SAMPLE_WRITING)?;
    write_if_missing(&module.join("quiz.yaml"), SAMPLE_QUIZ)?;
    Ok(())
}

fn write_if_missing(path: &Path, contents: &str) -> Result<()> {
    if path.exists() {
        println!("  {:?} already exists", path);
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).with_context(|| format!("Failed to create {:?}", parent))?;
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {:?}", path))?;
    println!("  ✓ Created {:?}", path);
    Ok(())
}
