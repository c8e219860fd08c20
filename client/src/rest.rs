//! The tenant REST API surface.
//!
//! [`TenantApi`] is the seam between reconciliation logic and the wire: the
//! engine is generic over it, tests substitute an in-memory fake, and
//! [`RestClient`] implements it over signed HTTP with the retry policy from
//! [`crate::retry`].

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::Deserialize;
use serde_json::Value;

use busync_types::{AppGuid, Application, BuGuid, BusinessUnit, UnitKey};

use crate::credentials::ApiCredentials;
use crate::error::{ApiError, ClientError};
use crate::retry::{self, RetryConfig, RetryOutcome};
use crate::signing;

/// Applications fetched per listing page.
pub const PAGE_SIZE: u32 = 50;

const APPS_PATH: &str = "appsec/v1/applications";
const BU_PATH: &str = "api/authn/v2/business_units";

const MAX_ERROR_BODY_BYTES: usize = 32 * 1024;

/// Operations the reconciliation engine needs from the remote tenant.
#[async_trait]
pub trait TenantApi {
    /// One page of the application listing. An empty page means the listing
    /// is exhausted.
    async fn list_applications_page(
        &self,
        page: u32,
        size: u32,
    ) -> Result<Vec<Application>, ApiError>;

    /// Full application document, fetched for full-fidelity updates.
    async fn get_application(&self, guid: &AppGuid) -> Result<Value, ApiError>;

    /// Replace an application's profile. `profile` must be the complete
    /// profile object, not a partial patch.
    async fn update_application(&self, guid: &AppGuid, profile: Value) -> Result<(), ApiError>;

    /// Look up a business unit by exact (case-insensitive) name.
    async fn find_business_unit(
        &self,
        name: &UnitKey,
    ) -> Result<Option<BusinessUnit>, ApiError>;

    /// Create a business unit named after the key.
    async fn create_business_unit(&self, name: &UnitKey) -> Result<BusinessUnit, ApiError>;
}

/// Signed HTTP implementation of [`TenantApi`].
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
    credentials: ApiCredentials,
    retry: RetryConfig,
}

impl RestClient {
    /// Client against the canonical tenant host.
    pub fn new(credentials: ApiCredentials) -> Result<Self, ClientError> {
        let base_url =
            Url::parse(crate::DEFAULT_API_BASE).expect("default API base is a valid URL");
        Self::with_base_url(credentials, base_url)
    }

    /// Client against a non-default host (tests, regional tenants).
    pub fn with_base_url(
        credentials: ApiCredentials,
        base_url: Url,
    ) -> Result<Self, ClientError> {
        if base_url.host_str().is_none() {
            return Err(ClientError::MissingHost);
        }
        Ok(Self {
            http: crate::http_client()?,
            base_url,
            credentials,
            retry: RetryConfig::default(),
        })
    }

    #[must_use]
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    fn endpoint(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        url
    }

    /// One signed request attempt. The constructor guarantees a host, so
    /// signing can only fail on a pre-epoch system clock; in that case the
    /// request goes out unsigned and the tenant rejects it with a 401.
    fn signed_request(&self, method: &Method, url: &Url) -> reqwest::RequestBuilder {
        let builder = self.http.request(method.clone(), url.clone());
        match signing::authorization_header(&self.credentials, method, url) {
            Ok(header) => builder.header(reqwest::header::AUTHORIZATION, header),
            Err(e) => {
                tracing::error!(error = %e, "failed to sign request");
                builder
            }
        }
    }

    async fn execute(
        &self,
        method: Method,
        url: Url,
        body: Option<Value>,
        context: &'static str,
    ) -> Result<reqwest::Response, ApiError> {
        let outcome = retry::send_with_retry(
            || {
                let mut builder = self.signed_request(&method, &url);
                if let Some(body) = &body {
                    builder = builder.json(body);
                }
                builder
            },
            &self.retry,
        )
        .await;

        match outcome {
            RetryOutcome::Success(response) => Ok(response),
            RetryOutcome::HttpError(response) => {
                let status = response.status();
                let body = read_capped_body(response).await;
                tracing::warn!(%status, context, "tenant API returned an error");
                Err(ApiError::Http { status, body })
            }
            RetryOutcome::Transport { attempts, source } => {
                Err(ApiError::Transport { attempts, source })
            }
        }
    }
}

#[async_trait]
impl TenantApi for RestClient {
    async fn list_applications_page(
        &self,
        page: u32,
        size: u32,
    ) -> Result<Vec<Application>, ApiError> {
        let mut url = self.endpoint(APPS_PATH);
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("size", &size.to_string());

        let response = self
            .execute(Method::GET, url, None, "application listing")
            .await?;
        let doc: AppPage = decode(response, "application listing").await?;
        Ok(doc.into_applications())
    }

    async fn get_application(&self, guid: &AppGuid) -> Result<Value, ApiError> {
        let url = self.endpoint(&format!("{APPS_PATH}/{guid}"));
        let response = self
            .execute(Method::GET, url, None, "application detail")
            .await?;
        decode(response, "application detail").await
    }

    async fn update_application(&self, guid: &AppGuid, profile: Value) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("{APPS_PATH}/{guid}"));
        let body = serde_json::json!({ "profile": profile });
        self.execute(Method::PUT, url, Some(body), "application update")
            .await?;
        Ok(())
    }

    async fn find_business_unit(
        &self,
        name: &UnitKey,
    ) -> Result<Option<BusinessUnit>, ApiError> {
        let mut url = self.endpoint(BU_PATH);
        url.query_pairs_mut().append_pair("bu_name", name.as_str());

        let response = self
            .execute(Method::GET, url, None, "business unit lookup")
            .await?;
        let doc: BuListDoc = decode(response, "business unit lookup").await?;

        // The endpoint's matching is a server detail; filter by exact
        // (case-insensitive) name so lookalike units never leak through.
        Ok(doc
            .into_units()
            .into_iter()
            .find(|unit| unit.name.eq_ignore_ascii_case(name.as_str())))
    }

    async fn create_business_unit(&self, name: &UnitKey) -> Result<BusinessUnit, ApiError> {
        let url = self.endpoint(BU_PATH);
        let body = serde_json::json!({ "bu_name": name.as_str() });

        let response = self
            .execute(Method::POST, url, Some(body), "business unit create")
            .await?;
        let doc: BuDoc = decode(response, "business unit create").await?;

        let guid = doc.guid_from_links().ok_or(ApiError::Malformed {
            context: "business unit create",
            detail: "response is missing a self link".to_string(),
        })?;
        let unit = BusinessUnit {
            guid: BuGuid::new(guid),
            name: doc.bu_name.unwrap_or_else(|| name.as_str().to_string()),
        };
        tracing::info!(unit = %unit.name, guid = %unit.guid, "created business unit");
        Ok(unit)
    }
}

async fn decode<T>(response: reqwest::Response, context: &'static str) -> Result<T, ApiError>
where
    T: serde::de::DeserializeOwned,
{
    response.json::<T>().await.map_err(|e| ApiError::Malformed {
        context,
        detail: e.to_string(),
    })
}

async fn read_capped_body(response: reqwest::Response) -> String {
    let mut body = response.text().await.unwrap_or_default();
    if body.len() > MAX_ERROR_BODY_BYTES {
        let mut end = MAX_ERROR_BODY_BYTES;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
        body.push_str("...(truncated)");
    }
    body
}

// Wire documents. The listing nests applications under `_embedded`; business
// units appear either at the top level or under `_embedded` depending on the
// endpoint, and carry their guid only as the trailing segment of the self
// link.

#[derive(Deserialize)]
struct AppPage {
    #[serde(rename = "_embedded", default)]
    embedded: Option<EmbeddedApps>,
}

#[derive(Deserialize)]
struct EmbeddedApps {
    #[serde(default)]
    applications: Vec<AppDoc>,
}

#[derive(Deserialize)]
struct AppDoc {
    guid: Option<String>,
    #[serde(default)]
    profile: Option<ProfileDoc>,
}

#[derive(Deserialize, Default)]
struct ProfileDoc {
    name: Option<String>,
    business_unit: Option<BuRef>,
}

#[derive(Deserialize)]
struct BuRef {
    guid: Option<String>,
}

impl AppPage {
    fn into_applications(self) -> Vec<Application> {
        self.embedded
            .map(|embedded| embedded.applications)
            .unwrap_or_default()
            .into_iter()
            .map(AppDoc::into_application)
            .collect()
    }
}

impl AppDoc {
    fn into_application(self) -> Application {
        let profile = self.profile.unwrap_or_default();
        Application {
            guid: self.guid.map(AppGuid::new),
            name: profile.name.unwrap_or_else(|| "<no-name>".to_string()),
            business_unit: profile
                .business_unit
                .and_then(|unit| unit.guid)
                .map(BuGuid::new),
        }
    }
}

#[derive(Deserialize)]
struct BuListDoc {
    #[serde(default)]
    business_units: Option<Vec<BuDoc>>,
    #[serde(rename = "_embedded", default)]
    embedded: Option<EmbeddedUnits>,
}

#[derive(Deserialize)]
struct EmbeddedUnits {
    #[serde(default)]
    business_units: Vec<BuDoc>,
}

#[derive(Deserialize)]
struct BuDoc {
    bu_name: Option<String>,
    #[serde(rename = "_links", default)]
    links: Option<Links>,
}

#[derive(Deserialize)]
struct Links {
    #[serde(rename = "self")]
    self_link: Option<Href>,
}

#[derive(Deserialize)]
struct Href {
    href: Option<String>,
}

impl BuListDoc {
    fn into_units(self) -> Vec<BusinessUnit> {
        let docs = match (self.business_units, self.embedded) {
            (Some(units), _) => units,
            (None, Some(embedded)) => embedded.business_units,
            (None, None) => Vec::new(),
        };
        docs.into_iter().filter_map(BuDoc::into_unit).collect()
    }
}

impl BuDoc {
    fn guid_from_links(&self) -> Option<String> {
        let href = self.links.as_ref()?.self_link.as_ref()?.href.as_deref()?;
        let guid = href.trim_end_matches('/').rsplit('/').next()?;
        (!guid.is_empty()).then(|| guid.to_string())
    }

    fn into_unit(self) -> Option<BusinessUnit> {
        let guid = self.guid_from_links()?;
        let name = self.bu_name?;
        Some(BusinessUnit {
            guid: BuGuid::new(guid),
            name,
        })
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_retry_config() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            jitter_factor: 0.0,
        }
    }

    fn test_client(server: &MockServer) -> RestClient {
        let credentials = ApiCredentials::new("test-id", "deadbeef0102").unwrap();
        RestClient::with_base_url(credentials, Url::parse(&server.uri()).unwrap())
            .unwrap()
            .with_retry_config(fast_retry_config())
    }

    fn key(name: &str) -> UnitKey {
        UnitKey::new(name).unwrap()
    }

    #[tokio::test]
    async fn listing_page_parses_applications() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/appsec/v1/applications"))
            .and(query_param("page", "0"))
            .and(query_param("size", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_embedded": {
                    "applications": [
                        {
                            "guid": "app-1",
                            "profile": {
                                "name": "ENGN-payments",
                                "business_unit": { "guid": "bu-1" }
                            }
                        },
                        {
                            "guid": "app-2",
                            "profile": { "name": "loginservice" }
                        },
                        {
                            "profile": { "name": "SALE-crm" }
                        }
                    ]
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let apps = test_client(&server)
            .list_applications_page(0, 50)
            .await
            .unwrap();

        assert_eq!(apps.len(), 3);
        assert_eq!(apps[0].guid, Some(AppGuid::new("app-1")));
        assert_eq!(apps[0].name, "ENGN-payments");
        assert_eq!(apps[0].business_unit, Some(BuGuid::new("bu-1")));
        assert_eq!(apps[1].business_unit, None);
        assert_eq!(apps[2].guid, None);
    }

    #[tokio::test]
    async fn listing_without_embedded_is_empty() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/appsec/v1/applications"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "page": {} })))
            .mount(&server)
            .await;

        let apps = test_client(&server)
            .list_applications_page(3, 50)
            .await
            .unwrap();
        assert!(apps.is_empty());
    }

    #[tokio::test]
    async fn requests_carry_hmac_authorization() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/appsec/v1/applications"))
            .respond_with(|req: &wiremock::Request| {
                let auth = req
                    .headers
                    .get("authorization")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("");
                assert!(
                    auth.starts_with("VERACODE-HMAC-SHA-256 id=test-id,"),
                    "unexpected authorization header: {auth}"
                );
                ResponseTemplate::new(200).set_body_json(json!({}))
            })
            .expect(1)
            .mount(&server)
            .await;

        test_client(&server)
            .list_applications_page(0, 50)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn find_business_unit_matches_by_name() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/authn/v2/business_units"))
            .and(query_param("bu_name", "ENGN"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "business_units": [
                    {
                        "bu_name": "ENGNEERING",
                        "_links": { "self": { "href": "https://x/api/authn/v2/business_units/other" } }
                    },
                    {
                        "bu_name": "engn",
                        "_links": { "self": { "href": "https://x/api/authn/v2/business_units/bu-42/" } }
                    }
                ]
            })))
            .mount(&server)
            .await;

        let unit = test_client(&server)
            .find_business_unit(&key("ENGN"))
            .await
            .unwrap()
            .expect("unit should be found");
        assert_eq!(unit.guid, BuGuid::new("bu-42"));
    }

    #[tokio::test]
    async fn find_business_unit_reads_embedded_shape() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/authn/v2/business_units"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_embedded": {
                    "business_units": [
                        {
                            "bu_name": "SALE",
                            "_links": { "self": { "href": "https://x/business_units/bu-7" } }
                        }
                    ]
                }
            })))
            .mount(&server)
            .await;

        let unit = test_client(&server)
            .find_business_unit(&key("SALE"))
            .await
            .unwrap();
        assert_eq!(unit.map(|u| u.guid), Some(BuGuid::new("bu-7")));
    }

    #[tokio::test]
    async fn find_business_unit_absent_is_none() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/api/authn/v2/business_units"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "business_units": [] })),
            )
            .mount(&server)
            .await;

        let unit = test_client(&server)
            .find_business_unit(&key("ENGN"))
            .await
            .unwrap();
        assert!(unit.is_none());
    }

    #[tokio::test]
    async fn create_business_unit_posts_name_and_parses_guid() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/authn/v2/business_units"))
            .and(body_json(json!({ "bu_name": "ENGN" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "bu_name": "ENGN",
                "_links": { "self": { "href": "https://x/api/authn/v2/business_units/bu-new" } }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let unit = test_client(&server)
            .create_business_unit(&key("ENGN"))
            .await
            .unwrap();
        assert_eq!(unit.guid, BuGuid::new("bu-new"));
        assert_eq!(unit.name, "ENGN");
    }

    #[tokio::test]
    async fn create_without_self_link_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/authn/v2/business_units"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "bu_name": "ENGN" })))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .create_business_unit(&key("ENGN"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Malformed { .. }));
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn update_application_puts_wrapped_profile() {
        let server = MockServer::start().await;
        let profile = json!({
            "name": "ENGN-payments",
            "business_criticality": "HIGH",
            "business_unit": { "guid": "bu-1" }
        });

        Mock::given(method("PUT"))
            .and(path("/appsec/v1/applications/app-1"))
            .and(body_json(json!({ "profile": profile.clone() })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        test_client(&server)
            .update_application(&AppGuid::new("app-1"), profile)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn client_error_is_permanent_and_not_retried() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/appsec/v1/applications/app-404"))
            .respond_with(ResponseTemplate::new(404).set_body_string("no such app"))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server)
            .get_application(&AppGuid::new("app-404"))
            .await
            .unwrap_err();
        match &err {
            ApiError::Http { status, body } => {
                assert_eq!(status.as_u16(), 404);
                assert_eq!(body, "no such app");
            }
            other => panic!("expected Http error, got {other:?}"),
        }
        assert!(!err.is_transient());
    }

    #[tokio::test]
    async fn server_error_is_retried_then_transient() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/appsec/v1/applications"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3) // initial + 2 retries from the fast config
            .mount(&server)
            .await;

        let err = test_client(&server)
            .list_applications_page(0, 50)
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn undecodable_body_is_malformed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/appsec/v1/applications"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .list_applications_page(0, 50)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Malformed { .. }));
    }
}
