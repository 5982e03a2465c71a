use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn help_lists_subcommands() -> Result<(), Box<dyn std::error::Error>> {
    #[allow(deprecated)]
    Command::cargo_bin("academy")?
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("export"))
        .stdout(predicate::str::contains("init"));
    Ok(())
}

#[test]
fn version_flag_succeeds() -> Result<(), Box<dyn std::error::Error>> {
    #[allow(deprecated)]
    Command::cargo_bin("academy")?
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("academy "));
    Ok(())
}

#[test]
fn init_scaffolds_a_loadable_course() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let root = dir.path().join("site");

    #[allow(deprecated)]
    Command::cargo_bin("academy")?
        .arg("init")
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("academy initialized"));

    assert!(root.join("academy.yml").is_file());
    assert!(root.join("static/css/app.css").is_file());
    assert!(root.join("static/js/app.js").is_file());

    let config = academy_core::Config::from_file(root.join("academy.yml"))?;
    let course = academy_core::Course::load(&config.content_dir())?;
    assert_eq!(course.modules().len(), 1);
    assert_eq!(course.pages().len(), 5);
    assert!(course.quiz("getting-started")?.is_some());

    // Re-running leaves existing files alone
    #[allow(deprecated)]
    Command::cargo_bin("academy")?
        .arg("init")
        .arg(&root)
        .assert()
        .success()
        .stdout(predicate::str::contains("already exists"));
    Ok(())
}
