//! Integration tests for CLI commands

use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const INDEX: &str = r#"apiVersion: v1
entries:
  nginx:
    - name: nginx
      version: 1.0.0
      appVersion: 1.24.0
      description: NGINX web server
    - name: nginx
      version: 2.0.0
      appVersion: 1.25.3
      description: NGINX web server
    - name: nginx
      version: 2.1.0-rc.1
      description: NGINX web server
  nginx-ingress:
    - name: nginx-ingress
      version: 4.0.0
      description: Ingress controller backed by NGINX
  redis:
    - name: redis
      version: 7.0.0
      description: In-memory data store
"#;

/// Isolated config, cache and a local chart repository
struct Env {
    home: TempDir,
}

impl Env {
    fn new() -> Self {
        let home = TempDir::new().unwrap();
        let charts = home.path().join("charts");
        std::fs::create_dir_all(&charts).unwrap();
        std::fs::write(charts.join("index.yaml"), INDEX).unwrap();
        Self { home }
    }

    fn path(&self) -> &Path {
        self.home.path()
    }

    fn repo_url(&self) -> String {
        format!("file://{}", self.path().join("charts").display())
    }

    /// Helper to run packdex command
    fn packdex(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_packdex"))
            .args(args)
            .env("PACKDEX_REPOSITORY_CONFIG", self.path().join("repositories.yaml"))
            .env("PACKDEX_REPOSITORY_CACHE", self.path().join("cache"))
            .env_remove("RUST_LOG")
            .env_remove("PACKDEX_DEBUG")
            .output()
            .expect("Failed to execute packdex")
    }

    fn with_local_repo(self) -> Self {
        let url = self.repo_url();
        let output = self.packdex(&["repo", "add", "local", &url]);
        assert!(output.status.success(), "repo add failed: {:?}", output);
        self
    }

    fn updated(self) -> Self {
        let output = self.packdex(&["repo", "update"]);
        assert!(output.status.success(), "repo update failed: {:?}", output);
        self
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn json(output: &Output) -> serde_json::Value {
    serde_json::from_str(&stdout(output)).expect("Output should be valid JSON")
}

mod repo_command {
    use super::*;

    #[test]
    fn test_list_without_config() {
        let env = Env::new();
        let output = env.packdex(&["repo", "list"]);

        assert!(output.status.success());
        assert!(stdout(&output).contains("No repositories configured"));
    }

    #[test]
    fn test_add_and_list() {
        let env = Env::new().with_local_repo();

        let output = env.packdex(&["repo", "list", "--output", "json"]);
        assert!(output.status.success());

        let listing = json(&output);
        assert_eq!(listing[0]["name"], "local");
        assert_eq!(listing[0]["url"], env.repo_url());
        assert!(env.path().join("repositories.yaml").exists());
    }

    #[test]
    fn test_add_duplicate_fails() {
        let env = Env::new().with_local_repo();
        let url = env.repo_url();

        let output = env.packdex(&["repo", "add", "local", &url]);

        assert_eq!(output.status.code(), Some(3));
        assert!(String::from_utf8_lossy(&output.stderr).contains("already exists"));
    }

    #[test]
    fn test_add_rejects_bad_url() {
        let env = Env::new();
        let output = env.packdex(&["repo", "add", "bad", "ftp://example.com/charts"]);

        assert_eq!(output.status.code(), Some(2));
    }

    #[test]
    fn test_hand_edited_duplicate_is_rejected() {
        let env = Env::new();
        std::fs::write(
            env.path().join("repositories.yaml"),
            "repositories:\n  - name: dup\n    url: https://a.example.com\n  - name: dup\n    url: https://b.example.com\n",
        )
        .unwrap();

        let output = env.packdex(&["repo", "list"]);

        assert_eq!(output.status.code(), Some(3));
        assert!(String::from_utf8_lossy(&output.stderr).contains("defined more than once"));
    }

    #[test]
    fn test_update_writes_cache() {
        let env = Env::new().with_local_repo();
        let output = env.packdex(&["repo", "update"]);

        assert!(output.status.success());
        assert!(stdout(&output).contains("Successfully got an update"));
        assert!(env.path().join("cache/local-index.yaml").exists());

        let charts = std::fs::read_to_string(env.path().join("cache/local-charts.txt")).unwrap();
        assert_eq!(charts, "nginx\nnginx-ingress\nredis\n");
    }

    #[test]
    fn test_update_reports_unreachable_repository() {
        let env = Env::new().with_local_repo();
        let missing = format!("file://{}", env.path().join("nowhere").display());
        assert!(env.packdex(&["repo", "add", "broken", &missing]).status.success());

        let output = env.packdex(&["repo", "update"]);

        assert!(output.status.success());
        let out = stdout(&output);
        assert!(out.contains("Successfully got an update from the"));
        assert!(out.contains("Unable to get an update"));
        assert!(env.path().join("cache/local-index.yaml").exists());
    }

    #[test]
    fn test_update_without_repositories_fails() {
        let env = Env::new();
        let output = env.packdex(&["repo", "update"]);

        assert!(!output.status.success());
    }

    #[test]
    fn test_remove_purges_cache() {
        let env = Env::new().with_local_repo().updated();

        let output = env.packdex(&["repo", "remove", "local"]);

        assert!(output.status.success());
        assert!(stdout(&output).contains("has been removed"));
        assert!(!env.path().join("cache/local-index.yaml").exists());
        assert!(!env.path().join("cache/local-charts.txt").exists());
    }

    #[test]
    fn test_remove_unknown_repository() {
        let env = Env::new().with_local_repo();
        let output = env.packdex(&["repo", "remove", "nope"]);

        assert_eq!(output.status.code(), Some(3));
        assert!(String::from_utf8_lossy(&output.stderr).contains("No repo named"));
    }
}

mod search_command {
    use super::*;

    #[test]
    fn test_search_newest_stable() {
        let env = Env::new().with_local_repo().updated();
        let output = env.packdex(&["search", "nginx", "--output", "json"]);

        assert!(output.status.success());
        let hits = json(&output);
        assert_eq!(hits[0]["name"], "local/nginx");
        assert_eq!(hits[0]["version"], "2.0.0");
        assert_eq!(hits[0]["app_version"], "1.25.3");
        assert_eq!(hits[1]["name"], "local/nginx-ingress");
        assert_eq!(hits.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_search_devel_and_versions() {
        let env = Env::new().with_local_repo().updated();

        let devel = json(&env.packdex(&["search", "nginx", "--devel", "--output", "json"]));
        assert_eq!(devel[0]["version"], "2.1.0-rc.1");

        let all = json(&env.packdex(&["search", "^nginx$", "--regexp", "--versions", "-o", "json"]));
        let versions: Vec<_> = all
            .as_array()
            .unwrap()
            .iter()
            .map(|hit| hit["version"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(versions, vec!["2.0.0", "1.0.0"]);
    }

    #[test]
    fn test_search_version_constraint() {
        let env = Env::new().with_local_repo().updated();
        let hits = json(&env.packdex(&["search", "nginx", "--version", "<2.0.0", "-o", "json"]));

        assert_eq!(hits[0]["name"], "local/nginx");
        assert_eq!(hits[0]["version"], "1.0.0");
    }

    #[test]
    fn test_search_table_output() {
        let env = Env::new().with_local_repo().updated();
        let output = env.packdex(&["search", "redis"]);

        assert!(output.status.success());
        let out = stdout(&output);
        assert!(out.contains("CHART VERSION"));
        assert!(out.contains("local/redis"));
        assert!(out.contains("In-memory data store"));
    }

    #[test]
    fn test_search_yaml_output() {
        let env = Env::new().with_local_repo().updated();
        let output = env.packdex(&["search", "redis", "--output", "yaml"]);

        assert!(output.status.success());
        assert!(stdout(&output).contains("name: local/redis"));
    }

    #[test]
    fn test_search_no_results() {
        let env = Env::new().with_local_repo().updated();
        let output = env.packdex(&["search", "zzzzzzzzzzzz"]);

        assert!(output.status.success());
        assert!(stdout(&output).contains("No results found"));
    }

    #[test]
    fn test_search_invalid_regex() {
        let env = Env::new().with_local_repo().updated();
        let output = env.packdex(&["search", "(unclosed", "--regexp"]);

        assert_eq!(output.status.code(), Some(2));
    }

    #[test]
    fn test_search_invalid_constraint() {
        let env = Env::new().with_local_repo().updated();
        let output = env.packdex(&["search", "nginx", "--version", "not-a-version"]);

        assert_eq!(output.status.code(), Some(2));
    }

    #[test]
    fn test_search_without_update_warns() {
        let env = Env::new().with_local_repo();
        let output = env.packdex(&["search", "nginx"]);

        assert!(output.status.success());
        assert!(String::from_utf8_lossy(&output.stderr).contains("is corrupt or missing"));
    }
}
