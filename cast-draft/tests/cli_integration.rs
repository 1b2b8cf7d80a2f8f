//! Integration tests for cast-draft
//!
//! The default template assistant is offline and deterministic, so caption
//! and script generation can be exercised end to end.

use assert_cmd::Command;
use libcreatorcast::session::SignupRequest;
use libcreatorcast::{Config, CreatorcastService};
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
                r#"
[database]
path = "{}"

[session]
storage = "file"
token_file = "{}"

[assistant]
backend = "template"

[defaults]
platform = "tiktok"
"#,
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

    async fn logged_in() -> Self {
        let env = Self::new();
        let config = Config::load_from_path(&env.config_path).unwrap();
        let service = CreatorcastService::from_config(config).await.unwrap();
        service
            .session_manager()
            .signup(SignupRequest {
                username: "maya".to_string(),
                email: "maya@example.com".to_string(),
                password: "correct horse".to_string(),
                niche: Some("cooking".to_string()),
            })
            .await
            .unwrap();
        env
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("cast-draft").unwrap();
        cmd.env("CREATORCAST_CONFIG", &self.config_path);
        cmd.env_remove("CREATORCAST_DB_PATH");
        cmd
    }

    /// Create a draft and return its id
    fn create(&self, args: &[&str]) -> String {
        let output = self.cmd().arg("create").args(args).output().unwrap();
        assert!(
            output.status.success(),
            "create failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }

    fn show_json(&self, id: &str) -> serde_json::Value {
        let output = self
            .cmd()
            .args(["show", id, "--format", "json"])
            .output()
            .unwrap();
        assert!(output.status.success());
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

#[tokio::test]
async fn test_requires_login() {
    let env = TestEnv::new();

    env.cmd()
        .args(["create", "an idea"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Not logged in"));
}

#[tokio::test]
async fn test_create_and_show() {
    let env = TestEnv::logged_in().await;

    let id = env.create(&["launch video", "--platform", "youtube", "--title", "Launch"]);
    assert_eq!(id.len(), 36);

    let item = env.show_json(&id);
    assert_eq!(item["idea"], "launch video");
    assert_eq!(item["platform"], "youtube");
    assert_eq!(item["status"], "draft");
    assert_eq!(item["title"], "Launch");

    env.cmd()
        .args(["show", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Platform: YouTube"))
        .stdout(predicate::str::contains("Status:   draft"));
}

#[tokio::test]
async fn test_create_uses_default_platform() {
    let env = TestEnv::logged_in().await;

    let id = env.create(&["dance trend"]);

    assert_eq!(env.show_json(&id)["platform"], "tiktok");
}

#[tokio::test]
async fn test_create_from_stdin() {
    let env = TestEnv::logged_in().await;

    let output = env
        .cmd()
        .args(["create", "--platform", "instagram"])
        .write_stdin("meal prep tips\n")
        .output()
        .unwrap();
    assert!(output.status.success());
    let id = String::from_utf8(output.stdout).unwrap().trim().to_string();

    assert_eq!(env.show_json(&id)["idea"], "meal prep tips");
}

#[tokio::test]
async fn test_create_empty_idea() {
    let env = TestEnv::logged_in().await;

    env.cmd()
        .args(["create", "   "])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Idea cannot be empty"));
}

#[tokio::test]
async fn test_list_newest_first() {
    let env = TestEnv::logged_in().await;
    let first = env.create(&["first idea"]);
    let second = env.create(&["second idea"]);

    let output = env
        .cmd()
        .args(["list", "--format", "json"])
        .output()
        .unwrap();
    let items: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<_> = items
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec![second, first]);

    env.cmd()
        .args(["list", "--status", "published"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());
}

#[tokio::test]
async fn test_update_fields() {
    let env = TestEnv::logged_in().await;
    let id = env.create(&["launch video", "--caption", "keep me"]);

    env.cmd()
        .args(["update", &id, "--title", "Launch day"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Title:    Launch day"));

    let item = env.show_json(&id);
    assert_eq!(item["title"], "Launch day");
    assert_eq!(item["caption"], "keep me");
}

#[tokio::test]
async fn test_update_json_patch() {
    let env = TestEnv::logged_in().await;
    let id = env.create(&["launch video"]);

    env.cmd()
        .args(["update", &id, "--json", r#"{"platform":"linkedin","script":"Intro"}"#])
        .assert()
        .success();

    let item = env.show_json(&id);
    assert_eq!(item["platform"], "linkedin");
    assert_eq!(item["script"], "Intro");
}

#[tokio::test]
async fn test_update_cannot_set_status() {
    let env = TestEnv::logged_in().await;
    let id = env.create(&["launch video"]);

    env.cmd()
        .args(["update", &id, "--json", r#"{"status":"published"}"#])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Status cannot be set"));

    assert_eq!(env.show_json(&id)["status"], "draft");
}

#[tokio::test]
async fn test_generate_caption_and_script() {
    let env = TestEnv::logged_in().await;
    let id = env.create(&["budget travel tips", "--platform", "youtube"]);

    env.cmd()
        .args(["caption", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Budget travel tips!"))
        .stdout(predicate::str::contains("#budget"));

    env.cmd()
        .args(["script", &id, "--platform", "tiktok"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[HOOK]"))
        .stdout(predicate::str::contains("30 seconds"));

    let item = env.show_json(&id);
    assert!(item["caption"].as_str().unwrap().contains("#travel"));
    assert!(item["script"].as_str().unwrap().contains("[CALL TO ACTION]"));
}

#[tokio::test]
async fn test_delete_twice() {
    let env = TestEnv::logged_in().await;
    let id = env.create(&["short lived"]);

    env.cmd()
        .args(["delete", &id])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted"));

    env.cmd()
        .args(["delete", &id])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Not found"));
}

#[tokio::test]
async fn test_show_missing_draft() {
    let env = TestEnv::logged_in().await;

    env.cmd()
        .args(["show", "does-not-exist"])
        .assert()
        .code(3);
}
