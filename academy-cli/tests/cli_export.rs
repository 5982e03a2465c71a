use assert_cmd::Command;
use predicates::prelude::*;
use scraper::{Html, Selector};
use std::fs;
use std::path::Path;
use tempfile::tempdir;
use walkdir::WalkDir;

fn write(root: &Path, rel: &str, contents: &str) -> std::io::Result<()> {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

const QUIZ: &str = "id: QUIZ_ID\npassing_score: 50\nquestions:\n  - id: q1\n    prompt: Pick a\n    options: [{ key: a, text: A }, { key: b, text: B }]\n    correct: a\n";

/// Module `a` with one lesson and a quiz, module `b` with a quiz only.
/// `port` must be unique per test since tests run in parallel.
fn course(root: &Path, port: u16, quiz_for_b: bool) -> std::io::Result<()> {
    write(
        root,
        "academy.yml",
        &format!(
            "site:\n  title: Export Test\nexport:\n  port: {}\n  ready_timeout_secs: 20\n  page_timeout_secs: 10\n  vendor_assets: []\n",
            port
        ),
    )?;
    write(
        root,
        "course/01-a/meta.yaml",
        "id: a\ntitle: Module A\norder: 1\nlessons:\n  - { slug: start, title: Start, file: start.md }\n",
    )?;
    write(root, "course/01-a/start.md", "# Start\n\n```rust\nfn main() {}\n```\n")?;
    write(root, "course/01-a/quiz.yaml", &QUIZ.replace("QUIZ_ID", "a-quiz"))?;
    write(root, "course/02-b/meta.yaml", "id: b\ntitle: Module B\norder: 2\n")?;
    if quiz_for_b {
        write(root, "course/02-b/quiz.yaml", &QUIZ.replace("QUIZ_ID", "b-quiz"))?;
    }
    write(root, "static/css/app.css", "body { margin: 0; }\n")?;
    write(root, "static/js/app.js", "// app\n")
}

fn index_files(out: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(out)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_name() == "index.html")
        .filter_map(|e| {
            e.path()
                .strip_prefix(out)
                .ok()
                .map(|p| p.display().to_string())
        })
        .collect();
    files.sort();
    files
}

#[test]
fn export_writes_one_file_per_page() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    course(dir.path(), 18911, true)?;

    #[allow(deprecated)]
    Command::cargo_bin("academy")?
        .current_dir(dir.path())
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::contains("[6/6]"))
        .stdout(predicate::str::contains("Export complete! 6 pages exported."));

    let out = dir.path().join("dist");
    assert_eq!(
        index_files(&out),
        vec![
            "index.html",
            "module/a/index.html",
            "module/a/lesson/start/index.html",
            "module/a/quiz/index.html",
            "module/b/index.html",
            "module/b/quiz/index.html",
        ]
    );
    assert!(out.join("static/css/app.css").is_file());

    let lesson = fs::read_to_string(out.join("module/a/lesson/start/index.html"))?;
    let doc = Html::parse_document(&lesson);
    let progress = Selector::parse("script#static-progress-js").unwrap();
    assert_eq!(doc.select(&progress).count(), 1);
    let api = Selector::parse(r#"a[href^="/api/"]"#).unwrap();
    assert_eq!(doc.select(&api).count(), 0);

    let quiz = fs::read_to_string(out.join("module/a/quiz/index.html"))?;
    let doc = Html::parse_document(&quiz);
    let grader = Selector::parse("script#static-quiz-js").unwrap();
    assert_eq!(doc.select(&grader).count(), 1);

    // A second run reproduces the same pages
    #[allow(deprecated)]
    Command::cargo_bin("academy")?
        .current_dir(dir.path())
        .arg("export")
        .assert()
        .success();
    assert_eq!(
        fs::read_to_string(out.join("module/a/lesson/start/index.html"))?,
        lesson
    );
    Ok(())
}

#[test]
fn export_reports_missing_quiz_as_page_failure() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    course(dir.path(), 18912, false)?;

    #[allow(deprecated)]
    Command::cargo_bin("academy")?
        .current_dir(dir.path())
        .arg("export")
        .assert()
        .code(1)
        .stdout(predicate::str::contains("/module/b/quiz ✗ FAILED"))
        .stdout(predicate::str::contains("1 failure(s)"));

    let out = dir.path().join("dist");
    assert_eq!(index_files(&out).len(), 5);
    assert!(!out.join("module/b/quiz/index.html").exists());
    Ok(())
}

#[test]
fn export_without_content_fails() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    write(dir.path(), "static/css/app.css", "")?;

    #[allow(deprecated)]
    Command::cargo_bin("academy")?
        .current_dir(dir.path())
        .arg("export")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Export failed"));
    Ok(())
}
