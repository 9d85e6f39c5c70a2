#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use git2::{IndexAddOption, Repository, Signature};
use mockito::{Matcher, Mock, Server};
use tempfile::TempDir;

use rolelock_core::context::ProjectContext;

const COLLECTION_INDEX: &str = "/api/v3/plugin/ansible/content/published/collections/index";

/// A throwaway project directory with no user config layer.
pub struct TestProject {
    dir: TempDir,
}

impl TestProject {
    pub fn new(manifest: &str) -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("rolelock.toml"), manifest).unwrap();
        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, content: &str) {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    pub fn lock_path(&self) -> PathBuf {
        self.dir.path().join("rolelock.lock.json")
    }

    pub fn context(&self) -> ProjectContext {
        ProjectContext::with_user_config_dir(self.dir.path().to_path_buf(), None)
    }
}

/// `[registry]` table pointing both indexes at `server`, with fast git retries.
pub fn registry_table(server: &Server) -> String {
    format!(
        "[registry]\npypi_url = \"{url}\"\ngalaxy_url = \"{url}\"\ngit_retries = 1\ngit_retry_delay_ms = 10\n",
        url = server.url()
    )
}

fn releases_json(versions: &[&str]) -> String {
    let releases: Vec<String> = versions
        .iter()
        .map(|v| format!("\"{}\": [{{\"yanked\": false}}]", v))
        .collect();
    format!("{{\"releases\": {{{}}}}}", releases.join(", "))
}

pub async fn mock_package(server: &mut Server, name: &str, versions: &[&str]) -> Mock {
    server
        .mock("GET", format!("/pypi/{}/json", name).as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(releases_json(versions))
        .create_async()
        .await
}

/// Mock every tooling package with the same listing.
pub async fn mock_all_tools(server: &mut Server) -> Vec<Mock> {
    let mut mocks = Vec::new();
    mocks.push(mock_package(server, "ansible", &["9.0.0", "10.0.0", "11.1.0"]).await);
    mocks.push(mock_package(server, "ansible-lint", &["24.2.0", "25.1.0"]).await);
    mocks.push(mock_package(server, "molecule", &["24.2.0", "25.1.0"]).await);
    mocks.push(mock_package(server, "yamllint", &["1.35.1", "1.37.0"]).await);
    mocks
}

/// Mock a collection listing plus per-version metadata with `dependencies`.
pub async fn mock_collection(
    server: &mut Server,
    name: &str,
    versions: &[&str],
    dependencies: &str,
) -> Vec<Mock> {
    let (namespace, leaf) = name.split_once('.').unwrap();
    let base = format!("{}/{}/{}/versions/", COLLECTION_INDEX, namespace, leaf);
    let data: Vec<String> = versions
        .iter()
        .map(|v| format!("{{\"version\": \"{}\"}}", v))
        .collect();

    let mut mocks = vec![
        server
            .mock("GET", base.as_str())
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                "{{\"data\": [{}], \"links\": {{\"next\": null}}}}",
                data.join(", ")
            ))
            .create_async()
            .await,
    ];
    for version in versions {
        mocks.push(
            server
                .mock("GET", format!("{}{}/", base, version).as_str())
                .with_status(200)
                .with_header("content-type", "application/json")
                .with_body(format!(
                    "{{\"version\": \"{}\", \"metadata\": {{\"dependencies\": {}}}}}",
                    version, dependencies
                ))
                .create_async()
                .await,
        );
    }
    mocks
}

pub async fn mock_unavailable_collection(server: &mut Server, name: &str) -> Mock {
    let (namespace, leaf) = name.split_once('.').unwrap();
    server
        .mock(
            "GET",
            format!("{}/{}/{}/versions/", COLLECTION_INDEX, namespace, leaf).as_str(),
        )
        .match_query(Matcher::Any)
        .with_status(503)
        .create_async()
        .await
}

pub async fn mock_role(server: &mut Server, name: &str, versions: &[&str]) -> Mock {
    let (namespace, leaf) = name.split_once('.').unwrap();
    let entries: Vec<String> = versions
        .iter()
        .map(|v| format!("{{\"name\": \"{}\"}}", v))
        .collect();
    server
        .mock("GET", "/api/v1/roles/")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("owner__username".to_string(), namespace.to_string()),
            Matcher::UrlEncoded("name".to_string(), leaf.to_string()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(format!(
            "{{\"count\": 1, \"results\": [{{\"summary_fields\": {{\"versions\": [{}]}}}}]}}",
            entries.join(", ")
        ))
        .create_async()
        .await
}

/// A local git repository with one commit carrying every tag in `tags`.
pub fn tagged_repo(tags: &[&str]) -> TempDir {
    let dir = TempDir::new().unwrap();
    let repo = Repository::init(dir.path()).unwrap();
    fs::write(dir.path().join("README.md"), "role").unwrap();

    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), IndexAddOption::DEFAULT, None)
        .unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = Signature::now("rolelock", "rolelock@example.com").unwrap();
    let oid = repo
        .commit(Some("HEAD"), &sig, &sig, "initial", &tree, &[])
        .unwrap();
    let commit = repo.find_object(oid, None).unwrap();
    for tag in tags {
        repo.tag_lightweight(tag, &commit, false).unwrap();
    }
    dir
}

pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}
