//! Integration test support for the Shpfy discount admin.
//!
//! Tests drive the real admin router with `tower::ServiceExt::oneshot`. The
//! Shopify Admin GraphQL endpoint, the signed upload target and the discount
//! backend are replaced by one in-process axum server on `127.0.0.1:0`
//! that records every request it receives.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shpfy-integration-tests
//! ```

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use axum::{
    Json, Router,
    body::Body,
    extract::{Multipart, State},
    http::{HeaderMap, Request, StatusCode, header},
    routing::post,
};
use chrono::Utc;
use secrecy::SecretString;
use serde_json::{Value, json};
use shpfy_admin::{
    config::{AdminConfig, DiscountApiConfig, ShopifyAdminConfig},
    middleware::launch_signature,
    services::{DiscountApiClient, DraftStore},
    shopify::AdminClient,
    state::AppState,
};
use shpfy_core::ShopDomain;
use tower::ServiceExt;

/// Store the app is configured for.
pub const STORE: &str = "acme.myshopify.com";
/// App API secret used to sign launches.
pub const API_SECRET: &str = "shpss_integration_secret_value";
/// Bearer token the admin sends to the discount backend.
pub const DISCOUNT_TOKEN: &str = "backend-bearer-token-for-tests";
/// Admin API token the admin sends to Shopify.
pub const ADMIN_TOKEN: &str = "shpat_integration_admin_token";
/// File id returned by the fake `fileCreate`.
pub const UPLOADED_FILE_ID: &str = "gid://shopify/MediaImage/42";

// =============================================================================
// Fake upstream
// =============================================================================

/// Status codes the fake upstream answers with.
#[derive(Debug, Clone, Copy)]
pub struct UpstreamBehavior {
    /// Status for `POST /discount`.
    pub discount_status: u16,
    /// Status for `POST /upload`.
    pub upload_status: u16,
}

impl Default for UpstreamBehavior {
    fn default() -> Self {
        Self {
            discount_status: 200,
            upload_status: 204,
        }
    }
}

/// A discount POST as the backend saw it.
#[derive(Debug, Clone)]
pub struct RecordedDiscount {
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub body: Value,
}

/// Everything the fake upstream received.
#[derive(Debug, Clone, Default)]
pub struct Recorded {
    /// `operationName` of each GraphQL request, in order.
    pub graphql_operations: Vec<String>,
    /// Access token header of each GraphQL request.
    pub graphql_tokens: Vec<String>,
    /// Multipart field names of each upload, in order.
    pub upload_fields: Vec<Vec<String>>,
    /// Bytes received in the `file` part of each upload.
    pub uploaded_bytes: Vec<usize>,
    pub discounts: Vec<RecordedDiscount>,
}

struct UpstreamInner {
    base_url: String,
    behavior: UpstreamBehavior,
    recorded: Mutex<Recorded>,
}

impl UpstreamInner {
    fn record(&self, f: impl FnOnce(&mut Recorded)) {
        let mut recorded = self.recorded.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut recorded);
    }
}

/// In-process stand-in for Shopify and the discount backend.
pub struct FakeUpstream {
    inner: Arc<UpstreamInner>,
}

impl FakeUpstream {
    /// Start a fake upstream with default (successful) behavior.
    pub async fn start() -> Self {
        Self::start_with(UpstreamBehavior::default()).await
    }

    /// Start a fake upstream with the given behavior.
    pub async fn start_with(behavior: UpstreamBehavior) -> Self {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr: SocketAddr = listener.local_addr().unwrap();

        let inner = Arc::new(UpstreamInner {
            base_url: format!("http://{addr}"),
            behavior,
            recorded: Mutex::new(Recorded::default()),
        });

        let app = Router::new()
            .route("/graphql.json", post(graphql))
            .route("/upload", post(upload))
            .route("/discount", post(discount))
            .with_state(Arc::clone(&inner));

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { inner }
    }

    #[must_use]
    pub fn graphql_url(&self) -> String {
        format!("{}/graphql.json", self.inner.base_url)
    }

    #[must_use]
    pub fn discount_url(&self) -> String {
        format!("{}/discount", self.inner.base_url)
    }

    /// Snapshot of everything received so far.
    #[must_use]
    pub fn recorded(&self) -> Recorded {
        self.inner
            .recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

async fn graphql(
    State(upstream): State<Arc<UpstreamInner>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let operation = body["operationName"].as_str().unwrap_or_default().to_string();
    let token = headers
        .get("X-Shopify-Access-Token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    upstream.record(|r| {
        r.graphql_operations.push(operation.clone());
        r.graphql_tokens.push(token);
    });

    let base = &upstream.base_url;
    let response = match operation.as_str() {
        "StagedUploadsCreate" => json!({
            "data": {
                "stagedUploadsCreate": {
                    "stagedTargets": [{
                        "url": format!("{base}/upload"),
                        "resourceUrl": format!("{base}/tmp/banner.png"),
                        "parameters": [
                            { "name": "key", "value": "tmp/banner.png" },
                            { "name": "policy", "value": "signed-policy" }
                        ]
                    }],
                    "userErrors": []
                }
            }
        }),
        "FileCreate" => json!({
            "data": {
                "fileCreate": {
                    "files": [{
                        "id": UPLOADED_FILE_ID,
                        "alt": body["variables"]["files"][0]["alt"],
                        "fileStatus": "UPLOADED"
                    }],
                    "userErrors": []
                }
            }
        }),
        other => json!({ "errors": [{ "message": format!("unknown operation {other}") }] }),
    };

    Json(response)
}

async fn upload(State(upstream): State<Arc<UpstreamInner>>, mut multipart: Multipart) -> StatusCode {
    let mut fields = Vec::new();
    let mut file_size = 0;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let bytes = field.bytes().await.unwrap_or_default();
        if name == "file" {
            file_size = bytes.len();
        }
        fields.push(name);
    }

    upstream.record(|r| {
        r.upload_fields.push(fields);
        r.uploaded_bytes.push(file_size);
    });

    StatusCode::from_u16(upstream.behavior.upload_status).unwrap()
}

async fn discount(
    State(upstream): State<Arc<UpstreamInner>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, Json<Value>) {
    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    upstream.record(|r| {
        r.discounts.push(RecordedDiscount {
            authorization: header_value(header::AUTHORIZATION),
            content_type: header_value(header::CONTENT_TYPE),
            body: serde_json::from_str(&body).unwrap_or(Value::Null),
        });
    });

    let status = StatusCode::from_u16(upstream.behavior.discount_status).unwrap();
    let body = if status.is_success() {
        json!({ "id": "gid://shopify/DiscountAutomaticNode/1" })
    } else {
        json!({ "error": "backend exploded" })
    };
    (status, Json(body))
}

// =============================================================================
// Admin app
// =============================================================================

/// Configuration pointing at a fake upstream.
#[must_use]
pub fn test_config(upstream: &FakeUpstream, require_signed_launch: bool) -> AdminConfig {
    AdminConfig {
        host: "127.0.0.1".parse().unwrap(),
        port: 0,
        shopify: ShopifyAdminConfig {
            store: ShopDomain::parse(STORE).unwrap(),
            api_version: "2026-01".to_string(),
            access_token: SecretString::from(ADMIN_TOKEN.to_string()),
            api_secret: SecretString::from(API_SECRET.to_string()),
        },
        discount_api: DiscountApiConfig {
            url: upstream.discount_url().parse().unwrap(),
            token: SecretString::from(DISCOUNT_TOKEN.to_string()),
        },
        draft_ttl: Duration::from_secs(300),
        draft_max_bytes: 64 * 1024 * 1024,
        http_timeout: Duration::from_secs(5),
        require_signed_launch,
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 0.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Admin router wired to a fake upstream.
#[must_use]
pub fn test_app(upstream: &FakeUpstream, require_signed_launch: bool) -> Router {
    let config = test_config(upstream, require_signed_launch);

    let shopify = AdminClient::with_endpoint(
        upstream.graphql_url(),
        config.shopify.access_token.clone(),
        config.http_timeout,
    )
    .unwrap();
    let discount_api = DiscountApiClient::new(&config.discount_api, config.http_timeout).unwrap();
    let drafts = DraftStore::new(config.draft_ttl, config.draft_max_bytes);

    shpfy_admin::app(AppState::from_parts(config, shopify, discount_api, drafts))
}

/// Launch query string signed the way Shopify signs it, issued now.
#[must_use]
pub fn signed_launch_query(shop: &str) -> String {
    signed_launch_query_at(shop, Utc::now().timestamp())
}

/// Launch query string signed with an explicit `timestamp`.
#[must_use]
pub fn signed_launch_query_at(shop: &str, timestamp: i64) -> String {
    let timestamp = timestamp.to_string();
    let params = [
        ("embedded", "1"),
        ("host", "YWRtaW4uc2hvcGlmeS5jb20vc3RvcmUvYWNtZQ"),
        ("shop", shop),
        ("timestamp", timestamp.as_str()),
    ];
    let hmac = launch_signature(&params, API_SECRET);

    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.extend_pairs(params);
    query.append_pair("hmac", &hmac);
    query.finish()
}

// =============================================================================
// Requests
// =============================================================================

/// A response with its body read to a string.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl TestResponse {
    /// Body parsed as JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap()
    }

    /// Header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// Send one request through the router.
pub async fn send(app: &Router, request: Request<Body>) -> TestResponse {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    TestResponse {
        status,
        headers,
        body: String::from_utf8_lossy(&bytes).into_owned(),
    }
}

/// `GET` request.
#[must_use]
pub fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

/// URL-encoded form `POST`, optionally marked as an HTMX request.
#[must_use]
pub fn form_post(uri: &str, fields: &[(&str, &str)], htmx: bool) -> Request<Body> {
    let mut body = url::form_urlencoded::Serializer::new(String::new());
    body.extend_pairs(fields);

    let mut request = Request::post(uri).header(
        header::CONTENT_TYPE,
        "application/x-www-form-urlencoded",
    );
    if htmx {
        request = request.header("HX-Request", "true");
    }
    request.body(Body::from(body.finish())).unwrap()
}

/// JSON `POST`.
#[must_use]
pub fn json_post(uri: &str, body: &Value) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Multipart `POST` of the banner card.
#[must_use]
pub fn banner_post(
    uri: &str,
    file: Option<(&str, &str, &[u8])>,
    description: Option<&str>,
) -> Request<Body> {
    const BOUNDARY: &str = "shpfy-test-boundary";

    let mut body = Vec::new();
    if let Some((filename, mime_type, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"banner_file\"; filename=\"{filename}\"\r\nContent-Type: {mime_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    if let Some(description) = description {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"banner_description\"\r\n\r\n{description}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::post(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("HX-Request", "true")
        .body(Body::from(body))
        .unwrap()
}

/// Draft id embedded in the rendered page.
#[must_use]
pub fn draft_id_from_page(html: &str) -> String {
    const PREFIX: &str = "/discounts/order/";
    let start = html.find(PREFIX).unwrap() + PREFIX.len();
    html.get(start..start + 36).unwrap().to_string()
}

/// Open the page with a signed launch and return the draft id.
pub async fn open_page(app: &Router) -> String {
    let response = send(
        app,
        get(&format!("/discounts/order/new?{}", signed_launch_query(STORE))),
    )
    .await;
    assert_eq!(response.status, StatusCode::OK, "{}", response.body);
    draft_id_from_page(&response.body)
}
