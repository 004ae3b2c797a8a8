//! Mock data API client.
//!
//! Fetches the static JSON catalog collections, backing off on HTTP 429 and
//! unwrapping the `{"record": ...}` envelope used by the remote storage host.

use std::fmt;
use std::time::Duration;

use reqwest::{header, Client, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinHandle;

use crate::models::{City, Skill, User, UsersData};

/// Errors surfaced while fetching mock API resources.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Non-success response, including 429 after the retry budget ran out.
    #[error("Failed to fetch {url}: {status_text}")]
    Status {
        url: String,
        status: u16,
        status_text: String,
    },
    /// The request never produced a response.
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },
    /// The body was not the expected JSON.
    #[error("Invalid JSON from {url}: {message}")]
    Decode { url: String, message: String },
    /// A fan-out task panicked or was aborted.
    #[error("Fetch task failed: {0}")]
    Task(String),
}

/// One collection exposed by the mock API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Categories,
    Subcategories,
    Cities,
    Likes,
    Skills,
    Users,
}

impl Resource {
    pub const ALL: [Resource; 6] = [
        Resource::Categories,
        Resource::Subcategories,
        Resource::Cities,
        Resource::Likes,
        Resource::Skills,
        Resource::Users,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Resource::Categories => "categories",
            Resource::Subcategories => "subcategories",
            Resource::Cities => "cities",
            Resource::Likes => "likes",
            Resource::Skills => "skills",
            Resource::Users => "users",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.name() == name)
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Where resources are read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DataSource {
    /// Static files at `{base}/db/{resource}.json`.
    #[default]
    Local,
    /// Remote storage bins at `{base}/b/{resource}/latest`, wrapped in `record`.
    Remote,
}

impl DataSource {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "local" => Some(DataSource::Local),
            "remote" => Some(DataSource::Remote),
            _ => None,
        }
    }
}

/// Backoff schedule for rate-limited responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries allowed after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on every subsequent retry.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (zero-based): 1s, 2s, 4s by default.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(retry)
    }
}

/// Client for the mock data API.
#[derive(Debug, Clone)]
pub struct MockDataClient {
    http: Client,
    base_url: String,
    source: DataSource,
    retry: RetryPolicy,
}

impl MockDataClient {
    /// Build a client with the default retry policy and an explicit request timeout.
    pub fn new(base_url: &str, source: DataSource, timeout: Duration) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport {
                url: base_url.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            source,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// URL of `resource` under the configured data source.
    pub fn resource_url(&self, resource: Resource) -> String {
        match self.source {
            DataSource::Local => format!("{}/db/{}.json", self.base_url, resource),
            DataSource::Remote => format!("{}/b/{}/latest", self.base_url, resource),
        }
    }

    /// GET `url` and return its JSON body, unwrapped from a `record` envelope
    /// when present.
    pub async fn fetch(&self, url: &str) -> Result<Value, FetchError> {
        let mut retry = 0;

        loop {
            let response = self
                .http
                .get(url)
                .header(header::ACCEPT, "application/json")
                .send()
                .await
                .map_err(|e| FetchError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;

            let status = response.status();
            if status.is_success() {
                let body = response.bytes().await.map_err(|e| FetchError::Transport {
                    url: url.to_string(),
                    message: e.to_string(),
                })?;
                let parsed: Value =
                    serde_json::from_slice(&body).map_err(|e| FetchError::Decode {
                        url: url.to_string(),
                        message: e.to_string(),
                    })?;
                return Ok(unwrap_record(parsed));
            }

            if status == StatusCode::TOO_MANY_REQUESTS && retry < self.retry.max_retries {
                let delay = self.retry.delay_for(retry);
                retry += 1;
                tracing::warn!(
                    url,
                    retry,
                    delay_ms = delay.as_millis() as u64,
                    "Rate limited, backing off"
                );
                tokio::time::sleep(delay).await;
                continue;
            }

            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
                status_text: status
                    .canonical_reason()
                    .unwrap_or("Unknown Status")
                    .to_string(),
            });
        }
    }

    /// Fetch one resource and decode it into `T`.
    pub async fn fetch_resource<T: DeserializeOwned>(
        &self,
        resource: Resource,
    ) -> Result<T, FetchError> {
        let url = self.resource_url(resource);
        let value = self.fetch(&url).await?;
        serde_json::from_value(value).map_err(|e| FetchError::Decode {
            url,
            message: e.to_string(),
        })
    }

    /// Fetch the cities collection, which may arrive as a bare array or as an
    /// object wrapping one.
    pub async fn fetch_cities(&self) -> Result<Vec<City>, FetchError> {
        let url = self.resource_url(Resource::Cities);
        let value = self.fetch(&url).await?;
        normalize_cities(value).map_err(|message| FetchError::Decode { url, message })
    }

    /// Fetch users, cities and skills concurrently.
    ///
    /// The first failure is returned immediately. The remaining requests are
    /// not cancelled; they run to completion and their results are dropped.
    pub async fn fetch_all_users_data(&self) -> Result<UsersData, FetchError> {
        let users: JoinHandle<Result<Vec<User>, FetchError>> = {
            let client = self.clone();
            tokio::spawn(async move { client.fetch_resource(Resource::Users).await })
        };
        let cities: JoinHandle<Result<Vec<City>, FetchError>> = {
            let client = self.clone();
            tokio::spawn(async move { client.fetch_cities().await })
        };
        let skills: JoinHandle<Result<Vec<Skill>, FetchError>> = {
            let client = self.clone();
            tokio::spawn(async move { client.fetch_resource(Resource::Skills).await })
        };

        let (users, cities, skills) =
            tokio::try_join!(joined(users), joined(cities), joined(skills))?;

        Ok(UsersData {
            users,
            cities,
            skills,
        })
    }
}

async fn joined<T>(handle: JoinHandle<Result<T, FetchError>>) -> Result<T, FetchError> {
    handle.await.map_err(|e| FetchError::Task(e.to_string()))?
}

/// Return the `record` field of an object body, or the body itself.
fn unwrap_record(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("record") => {
            map.remove("record").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Accept cities as a bare array or as an object wrapping one array.
fn normalize_cities(value: Value) -> Result<Vec<City>, String> {
    let list = match value {
        Value::Array(items) => items,
        Value::Object(map) => map
            .into_iter()
            .find_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            })
            .ok_or_else(|| "cities object does not contain an array".to_string())?,
        other => return Err(format!("unexpected cities payload: {}", other)),
    };

    serde_json::from_value(Value::Array(list)).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    use axum::{extract::State, http::StatusCode as AxumStatus, routing::get, Json, Router};
    use serde_json::json;

    /// Stub upstream: answers 429 for the first `rate_limited` hits on
    /// `/db/users.json`, then the users payload.
    #[derive(Clone)]
    struct Stub {
        hits: Arc<AtomicUsize>,
        arrivals: Arc<Mutex<Vec<Instant>>>,
        rate_limited: usize,
    }

    async fn users_handler(State(stub): State<Stub>) -> Result<Json<Value>, AxumStatus> {
        stub.arrivals.lock().unwrap().push(Instant::now());
        let hit = stub.hits.fetch_add(1, Ordering::SeqCst);
        if hit < stub.rate_limited {
            return Err(AxumStatus::TOO_MANY_REQUESTS);
        }
        Ok(Json(json!([{ "id": "u1", "name": "Alice" }])))
    }

    async fn spawn_stub(rate_limited: usize) -> (String, Stub) {
        let stub = Stub {
            hits: Arc::new(AtomicUsize::new(0)),
            arrivals: Arc::new(Mutex::new(Vec::new())),
            rate_limited,
        };

        let app = Router::new()
            .route("/db/users.json", get(users_handler))
            .route(
                "/db/cities.json",
                get(|| async { Json(json!({ "cities": [{ "id": 1, "name": "Berlin" }] })) }),
            )
            .route(
                "/db/skills.json",
                get(|| async { Json(json!([{ "id": "s1", "title": "Guitar" }])) }),
            )
            .route(
                "/db/likes.json",
                get(|| async { AxumStatus::INTERNAL_SERVER_ERROR }),
            )
            .route(
                "/b/categories/latest",
                get(|| async { Json(json!({ "record": [{ "id": "c1", "name": "Music" }], "metadata": {} })) }),
            )
            .with_state(stub.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), stub)
    }

    fn fast_client(base: &str, source: DataSource) -> MockDataClient {
        MockDataClient::new(base, source, Duration::from_secs(5))
            .unwrap()
            .with_retry_policy(RetryPolicy {
                max_retries: 3,
                base_delay: Duration::from_millis(20),
            })
    }

    #[test]
    fn test_default_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn test_unwrap_record() {
        assert_eq!(unwrap_record(json!({ "record": [1, 2] })), json!([1, 2]));
        assert_eq!(unwrap_record(json!([1, 2])), json!([1, 2]));
        assert_eq!(unwrap_record(json!({ "other": 1 })), json!({ "other": 1 }));
    }

    #[test]
    fn test_normalize_cities_shapes() {
        let bare = normalize_cities(json!([{ "id": "1", "name": "Oslo" }])).unwrap();
        let wrapped = normalize_cities(json!({ "data": [{ "id": "1", "name": "Oslo" }] })).unwrap();
        assert_eq!(bare, wrapped);
        assert!(normalize_cities(json!("Oslo")).is_err());
        assert!(normalize_cities(json!({ "count": 3 })).is_err());
    }

    #[test]
    fn test_resource_urls() {
        let local = MockDataClient::new("http://host/", DataSource::Local, Duration::from_secs(1))
            .unwrap();
        let remote =
            MockDataClient::new("http://host", DataSource::Remote, Duration::from_secs(1)).unwrap();

        assert_eq!(
            local.resource_url(Resource::Skills),
            "http://host/db/skills.json"
        );
        assert_eq!(
            remote.resource_url(Resource::Skills),
            "http://host/b/skills/latest"
        );
        assert_eq!(Resource::from_name("likes"), Some(Resource::Likes));
        assert_eq!(Resource::from_name("exchanges"), None);
    }

    #[tokio::test]
    async fn test_retries_twice_then_succeeds() {
        let (base, stub) = spawn_stub(2).await;
        let client = fast_client(&base, DataSource::Local);

        let users: Vec<User> = client.fetch_resource(Resource::Users).await.unwrap();

        assert_eq!(users.len(), 1);
        assert_eq!(users[0].name, "Alice");
        assert_eq!(stub.hits.load(Ordering::SeqCst), 3);

        let arrivals = stub.arrivals.lock().unwrap().clone();
        let first_gap = arrivals[1] - arrivals[0];
        let second_gap = arrivals[2] - arrivals[1];
        assert!(first_gap >= Duration::from_millis(20));
        assert!(second_gap >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_rate_limit_budget_exhausted() {
        let (base, stub) = spawn_stub(usize::MAX).await;
        let client = fast_client(&base, DataSource::Local);

        let err = client
            .fetch(&client.resource_url(Resource::Users))
            .await
            .unwrap_err();

        match err {
            FetchError::Status {
                status,
                status_text,
                url,
            } => {
                assert_eq!(status, 429);
                assert_eq!(status_text, "Too Many Requests");
                assert!(url.ends_with("/db/users.json"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(stub.hits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_other_status_is_not_retried() {
        let (base, _stub) = spawn_stub(0).await;
        let client = fast_client(&base, DataSource::Local);

        let err = client
            .fetch(&client.resource_url(Resource::Likes))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 500, .. }));
        assert_eq!(
            err.to_string(),
            format!("Failed to fetch {}/db/likes.json: Internal Server Error", base)
        );
    }

    #[tokio::test]
    async fn test_remote_envelope_unwrapped() {
        let (base, _stub) = spawn_stub(0).await;
        let client = fast_client(&base, DataSource::Remote);

        let value = client
            .fetch(&client.resource_url(Resource::Categories))
            .await
            .unwrap();

        assert_eq!(value, json!([{ "id": "c1", "name": "Music" }]));
    }

    #[tokio::test]
    async fn test_fetch_all_users_data() {
        let (base, _stub) = spawn_stub(1).await;
        let client = fast_client(&base, DataSource::Local);

        let data = client.fetch_all_users_data().await.unwrap();

        assert_eq!(data.users.len(), 1);
        assert_eq!(data.cities.len(), 1);
        assert_eq!(data.cities[0].id, "1");
        assert_eq!(data.skills[0].title, "Guitar");
    }

    #[tokio::test]
    async fn test_fetch_all_users_data_fails_as_a_whole() {
        let (base, _stub) = spawn_stub(usize::MAX).await;
        let client = fast_client(&base, DataSource::Local);

        let err = client.fetch_all_users_data().await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 429, .. }));
    }

    #[tokio::test]
    async fn test_fan_out_returns_first_error_without_cancelling_others() {
        let skills_done = Arc::new(AtomicBool::new(false));
        let flag = skills_done.clone();

        let app = Router::new()
            .route(
                "/db/users.json",
                get(|| async { AxumStatus::INTERNAL_SERVER_ERROR }),
            )
            .route(
                "/db/cities.json",
                get(|| async { Json(json!([{ "id": 1, "name": "Berlin" }])) }),
            )
            .route(
                "/db/skills.json",
                get(move || {
                    let flag = flag.clone();
                    async move {
                        tokio::time::sleep(Duration::from_millis(500)).await;
                        flag.store(true, Ordering::SeqCst);
                        Json(json!([{ "id": "s1", "title": "Guitar" }]))
                    }
                }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let client = fast_client(&format!("http://{}", addr), DataSource::Local);

        let started = Instant::now();
        let err = client.fetch_all_users_data().await.unwrap_err();

        assert!(matches!(err, FetchError::Status { status: 500, .. }));
        assert!(started.elapsed() < Duration::from_millis(400));
        assert!(!skills_done.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_millis(800)).await;
        assert!(skills_done.load(Ordering::SeqCst));
    }
}
