//! Integration tests for cast-queue
//!
//! Drafts and accounts are set up through the library, then the binary is
//! driven against the same database and token file.

use assert_cmd::Command;
use libcreatorcast::service::accounts::ConnectRequest;
use libcreatorcast::session::SignupRequest;
use libcreatorcast::types::NewDraft;
use libcreatorcast::{Config, CreatorcastService, Platform, SessionManager};
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

struct TestEnv {
    _temp_dir: TempDir,
    config_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let db_path = temp_dir.path().join("creatorcast.db");
        let token_path = temp_dir.path().join("session.token");

        fs::write(
            &config_path,
            format!(
                "[database]\npath = \"{}\"\n\n[session]\nstorage = \"file\"\ntoken_file = \"{}\"\n",
                db_path.to_string_lossy().replace('\\', "\\\\"),
                token_path.to_string_lossy().replace('\\', "\\\\")
            ),
        )
        .unwrap();

        Self {
            _temp_dir: temp_dir,
            config_path,
        }
    }

    async fn service(&self) -> CreatorcastService {
        let config = Config::load_from_path(&self.config_path).unwrap();
        CreatorcastService::from_config(config).await.unwrap()
    }

    async fn logged_in() -> Self {
        let env = Self::new();
        env.service()
            .await
            .session_manager()
            .signup(SignupRequest {
                username: "maya".to_string(),
                email: "maya@example.com".to_string(),
                password: "correct horse".to_string(),
                niche: None,
            })
            .await
            .unwrap();
        env
    }

    async fn resumed(service: &CreatorcastService) -> SessionManager {
        let mut sessions = service.session_manager();
        sessions.resume().await.unwrap();
        sessions
    }

    async fn draft(&self, idea: &str, platform: Platform) -> String {
        let service = self.service().await;
        let sessions = Self::resumed(&service).await;
        let session = sessions.current().unwrap();
        service
            .drafts()
            .create(session, NewDraft::new("", idea, platform))
            .await
            .unwrap()
            .id
    }

    async fn connect(&self, platform: Platform) {
        let service = self.service().await;
        let sessions = Self::resumed(&service).await;
        let session = sessions.current().unwrap();
        service
            .accounts()
            .connect(
                session,
                ConnectRequest {
                    platform,
                    profile_url: format!("https://{}.com/@maya", platform.as_str()),
                },
            )
            .await
            .unwrap();
    }

    async fn draft_status(&self, id: &str) -> String {
        let service = self.service().await;
        let sessions = Self::resumed(&service).await;
        let session = sessions.current().unwrap();
        service
            .drafts()
            .get(session, id)
            .await
            .unwrap()
            .status
            .as_str()
            .to_string()
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("cast-queue").unwrap();
        cmd.env("CREATORCAST_CONFIG", &self.config_path);
        cmd.env_remove("CREATORCAST_DB_PATH");
        cmd
    }

    fn schedule_json(&self, args: &[&str]) -> serde_json::Value {
        let output = self
            .cmd()
            .arg("schedule")
            .args(args)
            .args(["--format", "json"])
            .output()
            .unwrap();
        assert!(
            output.status.success(),
            "schedule failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

#[tokio::test]
async fn test_requires_login() {
    let env = TestEnv::new();

    env.cmd()
        .arg("list")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Not logged in"));
}

#[tokio::test]
async fn test_schedule_uses_draft_platform() {
    let env = TestEnv::logged_in().await;
    env.connect(Platform::Tiktok).await;
    let draft = env.draft("dance trend", Platform::Tiktok).await;

    let post = env.schedule_json(&[&draft, "2h"]);
    assert_eq!(post["platform"], "tiktok");
    assert_eq!(post["draft_id"], draft.as_str());
    assert_eq!(env.draft_status(&draft).await, "scheduled");

    env.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("dance trend"))
        .stdout(predicate::str::contains("in 1h"))
        .stdout(predicate::str::contains("(disconnected)").not());
}

#[tokio::test]
async fn test_schedule_unconnected_platform() {
    let env = TestEnv::logged_in().await;
    let draft = env.draft("dance trend", Platform::Tiktok).await;

    env.cmd()
        .args(["schedule", &draft, "2h"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("Platform not connected"));
    assert_eq!(env.draft_status(&draft).await, "draft");
}

#[tokio::test]
async fn test_schedule_in_the_past() {
    let env = TestEnv::logged_in().await;
    env.connect(Platform::Youtube).await;
    let draft = env.draft("launch video", Platform::Youtube).await;

    env.cmd()
        .args(["schedule", &draft, "2020-01-01 09:00"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("not in the future"));
    assert_eq!(env.draft_status(&draft).await, "draft");
}

#[tokio::test]
async fn test_schedule_unparseable_time() {
    let env = TestEnv::logged_in().await;
    let draft = env.draft("launch video", Platform::Youtube).await;

    env.cmd()
        .args(["schedule", &draft, "whenever"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Could not parse"));
}

#[tokio::test]
async fn test_schedule_twice_is_invalid_state() {
    let env = TestEnv::logged_in().await;
    env.connect(Platform::Youtube).await;
    let draft = env.draft("launch video", Platform::Youtube).await;
    env.schedule_json(&[&draft, "1 day"]);

    env.cmd()
        .args(["schedule", &draft, "2 days"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("only drafts can be scheduled"));
}

#[tokio::test]
async fn test_schedule_missing_draft() {
    let env = TestEnv::logged_in().await;
    env.connect(Platform::Youtube).await;

    env.cmd()
        .args(["schedule", "no-such-draft", "2h", "--platform", "youtube"])
        .assert()
        .code(4)
        .stderr(predicate::str::contains("not found"));
}

#[tokio::test]
async fn test_cancel_returns_draft() {
    let env = TestEnv::logged_in().await;
    env.connect(Platform::Instagram).await;
    let draft = env.draft("meal prep", Platform::Instagram).await;
    let post = env.schedule_json(&[&draft, "3h"]);
    let post_id = post["id"].as_str().unwrap();

    env.cmd()
        .args(["cancel", post_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cancelled"));
    assert_eq!(env.draft_status(&draft).await, "draft");

    env.cmd()
        .args(["cancel", post_id])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Not found"));
}

#[tokio::test]
async fn test_list_flags_disconnected_platform() {
    let env = TestEnv::logged_in().await;
    env.connect(Platform::Linkedin).await;
    let draft = env.draft("hiring post", Platform::Linkedin).await;
    env.schedule_json(&[&draft, "1 day"]);

    {
        let service = env.service().await;
        let sessions = TestEnv::resumed(&service).await;
        service
            .accounts()
            .disconnect(sessions.current().unwrap(), Platform::Linkedin)
            .await
            .unwrap();
    }

    env.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::contains("linkedin"))
        .stdout(predicate::str::contains("(disconnected)"));
}

#[tokio::test]
async fn test_mark_published_and_list_published() {
    let env = TestEnv::logged_in().await;
    env.connect(Platform::Youtube).await;
    let draft = env.draft("launch video", Platform::Youtube).await;
    let post = env.schedule_json(&[&draft, "2h"]);
    let post_id = post["id"].as_str().unwrap();

    env.cmd()
        .args(["mark-published", post_id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Marked"));
    assert_eq!(env.draft_status(&draft).await, "published");

    let output = env
        .cmd()
        .args(["published", "--format", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let published: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let published = published.as_array().unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0]["draft_id"], draft.as_str());

    env.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[tokio::test]
async fn test_published_rejects_zero_days() {
    let env = TestEnv::logged_in().await;

    env.cmd()
        .args(["published", "--days", "0"])
        .assert()
        .code(3);
}
