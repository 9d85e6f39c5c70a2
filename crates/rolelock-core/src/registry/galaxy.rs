//! Content index client for collections (v3 API) and roles (v1 API).

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use super::{ContentIndex, source};
use crate::error::ResolveError;

const COLLECTION_INDEX_PATH: &str = "api/v3/plugin/ansible/content/published/collections/index";
const PAGE_SIZE: u32 = 100;
const MAX_PAGES: usize = 50;

#[derive(Debug, Deserialize)]
struct VersionPage {
    #[serde(default)]
    data: Vec<VersionSummary>,
    #[serde(default)]
    links: PageLinks,
}

#[derive(Debug, Default, Deserialize)]
struct PageLinks {
    #[serde(default)]
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VersionSummary {
    version: String,
}

#[derive(Debug, Deserialize)]
struct VersionDetail {
    #[serde(default)]
    metadata: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct RoleSearch {
    #[serde(default)]
    results: Vec<RoleSummary>,
}

#[derive(Debug, Deserialize)]
struct RoleSummary {
    #[serde(default)]
    summary_fields: RoleSummaryFields,
}

#[derive(Debug, Default, Deserialize)]
struct RoleSummaryFields {
    #[serde(default)]
    versions: Vec<RoleVersion>,
}

#[derive(Debug, Deserialize)]
struct RoleVersion {
    name: String,
}

/// Client for the collection and role index.
#[derive(Debug, Clone)]
pub struct GalaxyClient {
    http: reqwest::Client,
    base_url: Url,
}

impl GalaxyClient {
    pub fn new(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    fn join(&self, path: &str, subject: &str) -> Result<Url, ResolveError> {
        self.base_url
            .join(path)
            .map_err(|e| ResolveError::registry(source::GALAXY, subject, e))
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, subject: &str) -> Result<T, ResolveError> {
        debug!("Fetching {}", url);
        let response = self
            .http
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ResolveError::registry(source::GALAXY, subject, e))?;

        if !response.status().is_success() {
            return Err(ResolveError::registry(
                source::GALAXY,
                subject,
                format!("HTTP {} from {}", response.status(), url),
            ));
        }

        response.json().await.map_err(|e| {
            ResolveError::registry(source::GALAXY, subject, format!("invalid response: {}", e))
        })
    }
}

impl ContentIndex for GalaxyClient {
    async fn collection_versions(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Vec<String>, ResolveError> {
        let subject = format!("{}.{}", namespace, name);
        let mut next = Some(self.join(
            &format!(
                "{}/{}/{}/versions/?limit={}",
                COLLECTION_INDEX_PATH, namespace, name, PAGE_SIZE
            ),
            &subject,
        )?);

        let mut versions = Vec::new();
        let mut pages = 0;
        while let Some(url) = next.take() {
            pages += 1;
            if pages > MAX_PAGES {
                return Err(ResolveError::registry(
                    source::GALAXY,
                    &subject,
                    format!("more than {} pages of versions", MAX_PAGES),
                ));
            }
            let page: VersionPage = self.get_json(url.clone(), &subject).await?;
            versions.extend(page.data.into_iter().map(|v| v.version));
            next = match page.links.next.filter(|link| !link.is_empty()) {
                Some(link) => Some(
                    url.join(&link)
                        .map_err(|e| ResolveError::registry(source::GALAXY, &subject, e))?,
                ),
                None => None,
            };
        }
        Ok(versions)
    }

    async fn collection_metadata(
        &self,
        namespace: &str,
        name: &str,
        version: &str,
    ) -> Result<Map<String, Value>, ResolveError> {
        let subject = format!("{}.{}", namespace, name);
        let url = self.join(
            &format!(
                "{}/{}/{}/versions/{}/",
                COLLECTION_INDEX_PATH, namespace, name, version
            ),
            &subject,
        )?;
        let detail: VersionDetail = self.get_json(url, &subject).await?;
        Ok(detail.metadata)
    }

    async fn role_versions(&self, namespace: &str, name: &str) -> Result<Vec<String>, ResolveError> {
        let subject = format!("{}.{}", namespace, name);
        let mut url = self.join("api/v1/roles/", &subject)?;
        url.query_pairs_mut()
            .append_pair("owner__username", namespace)
            .append_pair("name", name);

        let search: RoleSearch = self.get_json(url, &subject).await?;
        Ok(search
            .results
            .into_iter()
            .next()
            .map(|role| {
                role.summary_fields
                    .versions
                    .into_iter()
                    .map(|v| v.name)
                    .collect()
            })
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client(server: &mockito::Server) -> GalaxyClient {
        let base = Url::parse(&format!("{}/", server.url())).unwrap();
        GalaxyClient::new(reqwest::Client::new(), base)
    }

    const VERSIONS_PATH: &str =
        "/api/v3/plugin/ansible/content/published/collections/index/community/general/versions/";

    #[tokio::test]
    async fn test_collection_versions_follows_pagination() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("GET", VERSIONS_PATH)
            .match_query(Matcher::Exact("limit=100".to_string()))
            .with_status(200)
            .with_body(format!(
                r#"{{"data": [{{"version": "8.1.0"}}, {{"version": "8.0.0"}}],
                    "links": {{"next": "{}?limit=100&offset=100"}}}}"#,
                VERSIONS_PATH
            ))
            .create_async()
            .await;
        let second = server
            .mock("GET", VERSIONS_PATH)
            .match_query(Matcher::Exact("limit=100&offset=100".to_string()))
            .with_status(200)
            .with_body(r#"{"data": [{"version": "7.5.0"}], "links": {"next": null}}"#)
            .create_async()
            .await;

        let versions = client(&server)
            .collection_versions("community", "general")
            .await
            .unwrap();
        assert_eq!(versions, ["8.1.0", "8.0.0", "7.5.0"]);
        first.assert_async().await;
        second.assert_async().await;
    }

    #[tokio::test]
    async fn test_collection_metadata_is_opaque() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", format!("{}8.1.0/", VERSIONS_PATH).as_str())
            .with_status(200)
            .with_body(
                r#"{"version": "8.1.0",
                    "metadata": {"dependencies": {"ansible.utils": ">=2.0.0"}, "tags": ["tools"]}}"#,
            )
            .create_async()
            .await;

        let metadata = client(&server)
            .collection_metadata("community", "general", "8.1.0")
            .await
            .unwrap();
        assert_eq!(metadata["dependencies"]["ansible.utils"], ">=2.0.0");
        assert!(metadata.contains_key("tags"));
    }

    #[tokio::test]
    async fn test_role_versions_from_first_result() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/roles/")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("owner__username".to_string(), "geerlingguy".to_string()),
                Matcher::UrlEncoded("name".to_string(), "java".to_string()),
            ]))
            .with_status(200)
            .with_body(
                r#"{"count": 1, "results": [{"id": 7, "summary_fields":
                    {"versions": [{"name": "2.3.0"}, {"name": "2.4.0"}]}}]}"#,
            )
            .create_async()
            .await;

        let versions = client(&server).role_versions("geerlingguy", "java").await.unwrap();
        assert_eq!(versions, ["2.3.0", "2.4.0"]);
    }

    #[tokio::test]
    async fn test_role_not_found_is_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/v1/roles/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"count": 0, "results": []}"#)
            .create_async()
            .await;

        let versions = client(&server).role_versions("nobody", "nothing").await.unwrap();
        assert!(versions.is_empty());
    }

    #[tokio::test]
    async fn test_server_error_is_registry_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", VERSIONS_PATH)
            .match_query(Matcher::Any)
            .with_status(500)
            .create_async()
            .await;

        let err = client(&server)
            .collection_versions("community", "general")
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }
}
