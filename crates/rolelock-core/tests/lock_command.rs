mod support;

use rolelock_core::commands::{LockCommand, LockOptions};
use rolelock_core::error::ResolveError;
use rolelock_core::resolve::{CancelToken, cancellation};

use support::{
    TestProject, file_url, mock_all_tools, mock_collection, mock_package, mock_role,
    mock_unavailable_collection, registry_table, tagged_repo,
};

#[tokio::test]
async fn lock_resolves_all_three_layers() {
    let mut server = mockito::Server::new_async().await;
    let _tools = mock_all_tools(&mut server).await;
    let _general = mock_collection(
        &mut server,
        "community.general",
        &["7.0.0", "8.0.0", "8.1.0"],
        r#"{"ansible.utils": ">=2.0.0"}"#,
    )
    .await;
    let _utils = mock_collection(&mut server, "ansible.utils", &["2.0.0", "2.1.0"], "{}").await;
    let _web = mock_role(&mut server, "acme.web", &["1.0.0", "2.0.0"]).await;
    let repo = tagged_repo(&["v1.0.0", "v1.2.0"]);

    let project = TestProject::new(&format!(
        r#"[python]
max = "3.12"

[tools]
ansible = ">=10.0.0"

[[collections]]
name = "community.general"
version = ">=8.0.0"

{}"#,
        registry_table(&server)
    ));
    project.write(
        "requirements.yml",
        r#"collections:
  - community.general==7.0.0
  - name: ansible.utils
    version: "2.0.0"
roles:
  - name: acme.web
    version: "2.0.0"
"#,
    );
    project.write(
        "meta/main.yml",
        &format!(
            r#"galaxy_info:
  author: test
collections:
  - community.general
dependencies:
  - role: acme.web
    version: "1.0.0"
  - src: "{}"
"#,
            file_url(repo.path())
        ),
    );

    let report = LockCommand::new(project.context())
        .execute(&LockOptions::default(), CancelToken::never())
        .await
        .unwrap();

    assert!(report.written);
    assert!(project.lock_path().exists());
    assert!(report.warnings.is_empty(), "warnings: {:?}", report.warnings);

    let doc = &report.document;
    assert_eq!(doc.python.pinned, "3.12.8");

    let tools: Vec<(&str, &str, &str)> = doc
        .tools
        .iter()
        .map(|t| (t.name.as_str(), t.constraint.as_str(), t.resolved_version.as_str()))
        .collect();
    assert_eq!(
        tools,
        [
            ("ansible", ">=10.0.0", "11.1.0"),
            ("ansible-lint", "latest", "25.1.0"),
            ("molecule", "latest", "25.1.0"),
            ("yamllint", "latest", "1.37.0"),
        ]
    );
    assert!(doc.tools.iter().all(|t| t.source == "pypi"));

    assert_eq!(doc.collections.len(), 2);
    let utils = &doc.collections[0];
    assert_eq!(utils.name, "ansible.utils");
    assert_eq!(utils.constraint, "==2.0.0");
    assert_eq!(utils.resolved_version, "2.0.0");
    assert!(utils.dependencies.is_empty());

    let general = &doc.collections[1];
    assert_eq!(general.name, "community.general");
    assert_eq!(general.constraint, ">=8.0.0");
    assert_eq!(general.resolved_version, "8.1.0");
    assert_eq!(general.source, "galaxy");
    assert_eq!(general.dependencies["ansible.utils"], ">=2.0.0");

    assert_eq!(doc.roles.len(), 2);
    let web = doc.roles.iter().find(|r| r.name == "acme.web").unwrap();
    assert_eq!(web.resolved_version, "2.0.0");
    assert_eq!(web.source, "galaxy");
    assert_eq!(web.src, None);

    let git_role = doc.roles.iter().find(|r| r.source == "git").unwrap();
    assert_eq!(git_role.resolved_version, "v1.2.0");
    assert_eq!(git_role.constraint, "latest");
    assert_eq!(git_role.src.as_deref(), Some(file_url(repo.path()).as_str()));
    assert_eq!(git_role.scm.as_deref(), Some("git"));
}

#[tokio::test]
async fn lock_applies_compatibility_adjustment() {
    let mut server = mockito::Server::new_async().await;
    let _tools = mock_all_tools(&mut server).await;
    let project = TestProject::new(&format!(
        "[python]\nmax = \"3.10\"\n\n[tools]\nansible = \">=10.0.0\"\n\n{}",
        registry_table(&server)
    ));

    let report = LockCommand::new(project.context())
        .execute(&LockOptions::default(), CancelToken::never())
        .await
        .unwrap();

    assert_eq!(report.document.python.pinned, "3.10.16");
    let tools: Vec<(&str, &str, &str)> = report
        .document
        .tools
        .iter()
        .map(|t| (t.name.as_str(), t.constraint.as_str(), t.resolved_version.as_str()))
        .collect();
    assert_eq!(
        tools,
        [
            ("ansible", "==9.0.0", "9.0.0"),
            ("ansible-lint", "<25.0.0", "24.2.0"),
            ("molecule", "<25.0.0", "24.2.0"),
            ("yamllint", "latest", "1.37.0"),
        ]
    );
    assert_eq!(report.warnings.len(), 3);
    assert!(report.warnings[0].starts_with("ansible >=10.0.0"));
    assert!(report.warnings[1].starts_with("ansible-lint latest"));
    assert!(report.warnings[2].starts_with("molecule latest"));
}

#[tokio::test]
async fn lock_dry_run_does_not_write() {
    let mut server = mockito::Server::new_async().await;
    let _tools = mock_all_tools(&mut server).await;
    let project = TestProject::new(&registry_table(&server));

    let report = LockCommand::new(project.context())
        .execute(&LockOptions::default().with_dry_run(true), CancelToken::never())
        .await
        .unwrap();

    assert!(!report.written);
    assert!(!project.lock_path().exists());
    assert_eq!(report.lock_path, project.lock_path());
    assert_eq!(report.document.tools.len(), 4);
}

#[tokio::test]
async fn lock_is_deterministic_apart_from_timestamp() {
    let mut server = mockito::Server::new_async().await;
    let _tools = mock_all_tools(&mut server).await;
    let _general =
        mock_collection(&mut server, "community.general", &["8.0.0", "8.1.0"], "{}").await;
    let project = TestProject::new(&format!(
        "[[collections]]\nname = \"community.general\"\n\n{}",
        registry_table(&server)
    ));

    let command = LockCommand::new(project.context());
    let first = command
        .execute(&LockOptions::default(), CancelToken::never())
        .await
        .unwrap();
    let mut second = command
        .execute(&LockOptions::default(), CancelToken::never())
        .await
        .unwrap();

    assert_eq!(first.document.content_hash, second.document.content_hash);
    second.document.generated_at = first.document.generated_at;
    assert_eq!(
        first.document.to_json_pretty().unwrap(),
        second.document.to_json_pretty().unwrap()
    );
}

#[tokio::test]
async fn lock_degrades_unavailable_registry() {
    let mut server = mockito::Server::new_async().await;
    let _tools = mock_all_tools(&mut server).await;
    let _down = mock_unavailable_collection(&mut server, "community.general").await;
    let project = TestProject::new(&format!(
        "[[collections]]\nname = \"community.general\"\nversion = \">=8.0.0\"\n\n{}",
        registry_table(&server)
    ));

    let report = LockCommand::new(project.context())
        .execute(&LockOptions::default(), CancelToken::never())
        .await
        .unwrap();

    assert!(report.written);
    let general = &report.document.collections[0];
    assert_eq!(general.resolved_version, ">=8.0.0");
    assert_eq!(report.warnings.len(), 1);
    assert!(report.warnings[0].contains("community.general"));
}

#[tokio::test]
async fn lock_fails_when_pin_is_not_published() {
    let mut server = mockito::Server::new_async().await;
    let _ansible = mock_package(&mut server, "ansible", &["10.0.0", "11.1.0"]).await;
    let _lint = mock_package(&mut server, "ansible-lint", &["25.1.0"]).await;
    let _molecule = mock_package(&mut server, "molecule", &["25.1.0"]).await;
    let _yamllint = mock_package(&mut server, "yamllint", &["1.37.0"]).await;
    let project = TestProject::new(&format!(
        "[tools]\nansible = \"==99.0.0\"\n\n{}",
        registry_table(&server)
    ));

    let err = LockCommand::new(project.context())
        .execute(&LockOptions::default(), CancelToken::never())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ResolveError>(),
        Some(ResolveError::NoSatisfyingVersion { .. })
    ));
    assert!(!project.lock_path().exists());
}

#[tokio::test]
async fn lock_cancelled_writes_nothing() {
    let server = mockito::Server::new_async().await;
    let project = TestProject::new(&registry_table(&server));
    let (canceller, token) = cancellation();
    canceller.cancel();

    let err = LockCommand::new(project.context())
        .execute(&LockOptions::default(), token)
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ResolveError>(),
        Some(ResolveError::Cancelled(_))
    ));
    assert!(!project.lock_path().exists());
}

#[tokio::test]
async fn lock_rejects_unsupported_python() {
    let server = mockito::Server::new_async().await;
    let project = TestProject::new(&format!(
        "[python]\npinned = \"3.9.18\"\n\n{}",
        registry_table(&server)
    ));

    let err = LockCommand::new(project.context())
        .execute(&LockOptions::default(), CancelToken::never())
        .await
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ResolveError>(),
        Some(ResolveError::IncompatibleVersion { .. })
    ));
}

#[tokio::test]
async fn lock_rejects_unknown_tool_before_any_request() {
    let mut server = mockito::Server::new_async().await;
    let untouched = server
        .mock("GET", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;
    let project = TestProject::new(&format!(
        "[tools]\nansible = \">=10.0.0\"\npytest = \"latest\"\n\n{}",
        registry_table(&server)
    ));

    let err = LockCommand::new(project.context())
        .execute(&LockOptions::default(), CancelToken::never())
        .await
        .unwrap_err();

    match err.downcast_ref::<ResolveError>() {
        Some(ResolveError::DeclarationParse { message, .. }) => {
            assert!(message.contains("unknown tool 'pytest'"));
        }
        other => panic!("expected declaration error, got {:?}", other),
    }
    assert!(!project.lock_path().exists());
    untouched.assert_async().await;
}
