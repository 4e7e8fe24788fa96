//! End-to-end creation flows against scripted collaborators

mod common;

use common::*;
use presto_core::install::Completion;
use presto_core::{
    create_project, CreateError, CreationEvent, CreationOptions, CreationRequest, CreationState,
    Creator, GitOption, OverwriteChoice, PackageManager,
};
use serde_json::Value;
use std::path::Path;

fn read_package_json(dir: &Path) -> Value {
    let raw = std::fs::read_to_string(dir.join("package.json")).unwrap();
    serde_json::from_str(&raw).unwrap()
}

fn request(cwd: &Path, name: &str, options: CreationOptions) -> CreationRequest {
    CreationRequest::resolve(name, cwd, options).unwrap()
}

fn drain(events: &mut tokio::sync::broadcast::Receiver<CreationEvent>) -> Vec<CreationEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}

#[tokio::test]
async fn test_default_preset_without_git() {
    let root = tempfile::tempdir().unwrap();
    let harness = Harness::default_setup();
    let options = CreationOptions {
        default: true,
        git: GitOption::Disabled,
        ..Default::default()
    };

    let mut creator = Creator::new(request(root.path(), "demo-app", options), harness.deps.clone());
    let mut events = creator.subscribe();
    let outcome = creator.create().await.unwrap();

    let target = root.path().join("demo-app");
    let pkg = read_package_json(&target);
    assert_eq!(pkg["name"], "demo-app");
    assert_eq!(pkg["version"], "1.0.0");
    assert!(target.join("index.js").exists());
    assert!(target.join(".gitignore").exists());
    assert!(target.join("README.md").exists());

    assert_eq!(harness.fetcher.calls(), vec!["default"]);
    assert_eq!(
        harness.spawner.calls(),
        vec![(
            "npm".to_string(),
            vec!["install".to_string(), "--loglevel".to_string(), "error".to_string()]
        )]
    );
    assert!(harness.commands.calls().is_empty());
    assert_eq!(
        harness.ui.questions(),
        vec!["Project version", "Project description"]
    );

    assert_eq!(outcome.package_manager, PackageManager::Npm);
    assert!(!outcome.vcs_initialized);
    assert!(outcome.commit_warning.is_none());
    assert_eq!(creator.state(), CreationState::Done);
    assert_eq!(
        drain(&mut events),
        vec![
            CreationEvent::FetchRemotePreset,
            CreationEvent::Creating,
            CreationEvent::Done
        ]
    );
}

#[tokio::test]
async fn test_prompted_metadata_is_written() {
    let root = tempfile::tempdir().unwrap();
    let harness = Harness::new(
        ScriptedUi::new().inputs(&["2.3.0", "a shop front"]),
        ScriptedFetcher::new(FetchScript::NotFound),
        FakeEnv::npm_with_git(),
        ScriptedSpawner::succeeding(),
        RecordingCommands::new(),
    );
    let options = CreationOptions {
        git: GitOption::Disabled,
        ..Default::default()
    };

    create_project(
        request(root.path(), "shop", options),
        harness.deps.clone(),
        "unused".to_string(),
    )
    .await
    .unwrap()
    .unwrap();

    let pkg = read_package_json(&root.path().join("shop"));
    assert_eq!(pkg["version"], "2.3.0");
    assert_eq!(pkg["description"], "a shop front");
}

#[tokio::test]
async fn test_cancel_on_existing_directory_has_no_side_effects() {
    let root = tempfile::tempdir().unwrap();
    let target = root.path().join("demo-app");
    std::fs::create_dir(&target).unwrap();
    std::fs::write(target.join("keep.txt"), "mine").unwrap();

    let harness = Harness::new(
        ScriptedUi::new().overwrite(OverwriteChoice::Cancel),
        ScriptedFetcher::new(FetchScript::NotFound),
        FakeEnv::npm_with_git(),
        ScriptedSpawner::succeeding(),
        RecordingCommands::new(),
    );

    let outcome = create_project(
        request(root.path(), "demo-app", CreationOptions::default()),
        harness.deps.clone(),
        "desc".to_string(),
    )
    .await
    .unwrap();

    assert!(outcome.is_none());
    assert!(harness.fetcher.calls().is_empty());
    assert!(harness.spawner.calls().is_empty());
    assert!(harness.commands.calls().is_empty());
    assert_eq!(std::fs::read_to_string(target.join("keep.txt")).unwrap(), "mine");
}

#[tokio::test]
async fn test_commit_failure_is_a_warning() {
    let root = tempfile::tempdir().unwrap();
    let harness = Harness::new(
        ScriptedUi::new(),
        ScriptedFetcher::new(FetchScript::NotFound),
        FakeEnv::npm_with_git(),
        ScriptedSpawner::succeeding(),
        RecordingCommands::failing("commit"),
    );

    let outcome = create_project(
        request(root.path(), "demo-app", CreationOptions::default()),
        harness.deps.clone(),
        "desc".to_string(),
    )
    .await
    .unwrap()
    .unwrap();

    assert!(outcome.vcs_initialized);
    assert!(matches!(
        outcome.commit_warning,
        Some(CreateError::VcsCommitFailure(_))
    ));
    assert!(root.path().join("demo-app/package.json").exists());
    assert_eq!(harness.ui.warnings().len(), 1);
}

#[tokio::test]
async fn test_commit_message_comes_from_git_option() {
    for (git, expected) in [
        (GitOption::Default, "init"),
        (GitOption::Enabled, "init"),
        (GitOption::Message("feat: bootstrap".to_string()), "feat: bootstrap"),
    ] {
        let root = tempfile::tempdir().unwrap();
        let harness = Harness::default_setup();
        let options = CreationOptions {
            git,
            ..Default::default()
        };

        create_project(
            request(root.path(), "demo-app", options),
            harness.deps.clone(),
            "desc".to_string(),
        )
        .await
        .unwrap()
        .unwrap();

        let calls = harness.commands.calls();
        assert_eq!(calls[0], vec!["git", "init"]);
        assert_eq!(calls[1], vec!["git", "add", "-A"]);
        assert_eq!(calls[2], vec!["git", "commit", "-m", expected]);
    }
}

#[tokio::test]
async fn test_force_git_inside_existing_repository() {
    let root = tempfile::tempdir().unwrap();
    let env = FakeEnv {
        in_repo: true,
        ..FakeEnv::npm_with_git()
    };
    let harness = Harness::new(
        ScriptedUi::new(),
        ScriptedFetcher::new(FetchScript::NotFound),
        env,
        ScriptedSpawner::succeeding(),
        RecordingCommands::new(),
    );
    let options = CreationOptions {
        force_git: true,
        ..Default::default()
    };

    let mut creator = Creator::new(request(root.path(), "demo-app", options), harness.deps.clone());
    let mut events = creator.subscribe();
    let outcome = creator.create().await.unwrap();

    assert!(outcome.vcs_initialized);
    assert!(drain(&mut events).contains(&CreationEvent::GitInit));
    assert_eq!(harness.commands.calls()[0], vec!["git", "init"]);
}

#[tokio::test]
async fn test_existing_repository_skips_git_by_default() {
    let root = tempfile::tempdir().unwrap();
    let env = FakeEnv {
        in_repo: true,
        ..FakeEnv::npm_with_git()
    };
    let harness = Harness::new(
        ScriptedUi::new(),
        ScriptedFetcher::new(FetchScript::NotFound),
        env,
        ScriptedSpawner::succeeding(),
        RecordingCommands::new(),
    );

    let outcome = create_project(
        request(root.path(), "demo-app", CreationOptions::default()),
        harness.deps.clone(),
        "desc".to_string(),
    )
    .await
    .unwrap()
    .unwrap();

    assert!(!outcome.vcs_initialized);
    assert!(harness.commands.calls().is_empty());
}

#[tokio::test]
async fn test_unknown_preset_is_not_found() {
    let root = tempfile::tempdir().unwrap();
    let harness = Harness::default_setup();
    let options = CreationOptions {
        preset: Some("mobx".to_string()),
        ..Default::default()
    };

    let mut creator = Creator::new(request(root.path(), "demo-app", options), harness.deps.clone());
    let err = creator.create().await.unwrap_err();

    assert!(matches!(err, CreateError::PresetNotFound { ref name } if name == "mobx"));
    assert_eq!(creator.state(), CreationState::ResolvingPreset);
    assert!(harness.spawner.calls().is_empty());
    assert!(!root.path().join("demo-app/package.json").exists());
}

#[tokio::test]
async fn test_fetch_failure_propagates_after_notice() {
    let root = tempfile::tempdir().unwrap();
    let harness = Harness::new(
        ScriptedUi::new(),
        ScriptedFetcher::new(FetchScript::Fail("connection reset".to_string())),
        FakeEnv::npm_with_git(),
        ScriptedSpawner::succeeding(),
        RecordingCommands::new(),
    );
    let options = CreationOptions {
        preset: Some("mobx".to_string()),
        ..Default::default()
    };

    let err = create_project(
        request(root.path(), "demo-app", options),
        harness.deps.clone(),
        "desc".to_string(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, CreateError::Fetch { .. }));
    assert_eq!(harness.ui.errors.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_local_preset_files_are_copied() {
    let root = tempfile::tempdir().unwrap();
    let preset_dir = root.path().join("presets/mobx");
    std::fs::create_dir_all(preset_dir.join("src")).unwrap();
    std::fs::write(
        preset_dir.join("package.json"),
        r#"{"name":"template","version":"0.0.0","scripts":{"start":"node src/app.js"}}"#,
    )
    .unwrap();
    std::fs::write(preset_dir.join("src/app.js"), "// app").unwrap();

    let harness = Harness::new(
        ScriptedUi::new(),
        ScriptedFetcher::new(FetchScript::Local(preset_dir.clone())),
        FakeEnv {
            yarn: true,
            ..FakeEnv::npm_with_git()
        },
        ScriptedSpawner::succeeding(),
        RecordingCommands::new(),
    );
    let options = CreationOptions {
        preset: Some("mobx".to_string()),
        git: GitOption::Disabled,
        ..Default::default()
    };

    let outcome = create_project(
        request(root.path(), "shop", options),
        harness.deps.clone(),
        "desc".to_string(),
    )
    .await
    .unwrap()
    .unwrap();

    let target = root.path().join("shop");
    assert!(target.join("src/app.js").exists());
    assert_eq!(read_package_json(&target)["scripts"]["start"], "node src/app.js");
    assert_eq!(outcome.package_manager, PackageManager::Yarn);
    // Local presets belong to the user and stay in place
    assert!(preset_dir.join("package.json").exists());
    let notes = harness.ui.notes.lock().unwrap().clone();
    assert!(notes.iter().any(|line| line.contains("yarn start")));
}

#[tokio::test]
async fn test_install_failure_stops_before_vcs() {
    let root = tempfile::tempdir().unwrap();
    let harness = Harness::new(
        ScriptedUi::new(),
        ScriptedFetcher::new(FetchScript::NotFound),
        FakeEnv::npm_with_git(),
        ScriptedSpawner::new(vec![Completion::exit(Some(1), None)]),
        RecordingCommands::new(),
    );

    let mut creator = Creator::new(
        request(root.path(), "demo-app", CreationOptions::default()),
        harness.deps.clone(),
    );
    let err = creator.create().await.unwrap_err();

    assert!(matches!(err, CreateError::InstallFailure { .. }));
    assert_eq!(creator.state(), CreationState::InstallingDeps);
    assert!(harness.commands.calls().is_empty());
    // Completed steps are not rolled back
    assert!(root.path().join("demo-app/package.json").exists());
}

#[tokio::test]
async fn test_named_preset_wins_over_default_flag() {
    let root = tempfile::tempdir().unwrap();
    let harness = Harness::default_setup();
    let options = CreationOptions {
        preset: Some("mobx".to_string()),
        default: true,
        git: GitOption::Disabled,
        ..Default::default()
    };

    let err = create_project(
        request(root.path(), "demo-app", options),
        harness.deps.clone(),
        "desc".to_string(),
    )
    .await
    .unwrap_err();

    assert_eq!(harness.fetcher.calls(), vec!["mobx"]);
    assert!(matches!(err, CreateError::PresetNotFound { ref name } if name == "mobx"));
}

#[tokio::test]
async fn test_git_init_failure_is_a_warning() {
    let root = tempfile::tempdir().unwrap();
    let harness = Harness::new(
        ScriptedUi::new(),
        ScriptedFetcher::new(FetchScript::NotFound),
        FakeEnv::npm_with_git(),
        ScriptedSpawner::succeeding(),
        RecordingCommands::failing("init"),
    );

    let mut creator = Creator::new(
        request(root.path(), "demo-app", CreationOptions::default()),
        harness.deps.clone(),
    );
    let outcome = creator.create().await.unwrap();

    assert!(!outcome.vcs_initialized);
    assert!(outcome.commit_warning.is_none());
    assert_eq!(creator.state(), CreationState::Done);
    assert_eq!(harness.commands.calls(), vec![vec!["git", "init"]]);
    assert_eq!(harness.ui.warnings().len(), 1);
}

#[tokio::test]
async fn test_staging_failure_skips_commit_with_warning() {
    let root = tempfile::tempdir().unwrap();
    let harness = Harness::new(
        ScriptedUi::new(),
        ScriptedFetcher::new(FetchScript::NotFound),
        FakeEnv::npm_with_git(),
        ScriptedSpawner::succeeding(),
        RecordingCommands::failing("add"),
    );

    let outcome = create_project(
        request(root.path(), "demo-app", CreationOptions::default()),
        harness.deps.clone(),
        "desc".to_string(),
    )
    .await
    .unwrap()
    .unwrap();

    assert!(outcome.vcs_initialized);
    assert!(matches!(
        outcome.commit_warning,
        Some(CreateError::VcsCommitFailure(_))
    ));
    let calls = harness.commands.calls();
    assert_eq!(calls.len(), 2);
    assert!(!calls.iter().any(|call| call.contains(&"commit".to_string())));
    assert_eq!(harness.ui.warnings().len(), 1);
}

#[tokio::test]
async fn test_current_directory_creation() {
    let root = tempfile::tempdir().unwrap();
    let cwd = root.path().join("my-app");
    std::fs::create_dir(&cwd).unwrap();
    std::fs::write(cwd.join("notes.txt"), "keep").unwrap();
    let harness = Harness::default_setup();
    let options = CreationOptions {
        git: GitOption::Disabled,
        ..Default::default()
    };

    let outcome = create_project(request(&cwd, ".", options), harness.deps.clone(), "desc".to_string())
        .await
        .unwrap();

    assert!(outcome.is_some());
    assert_eq!(
        harness.ui.questions()[0],
        "Generate project in current directory?"
    );
    assert_eq!(read_package_json(&cwd)["name"], "my-app");
    assert!(cwd.join("notes.txt").exists());
    let notes = harness.ui.notes.lock().unwrap().clone();
    assert!(notes.iter().any(|line| line.contains("npm start")));
    assert!(!notes.iter().any(|line| line.contains("cd ")));
}
