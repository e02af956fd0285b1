use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use ::common::config::{ExecutionConfig, PoolConfig};
use ::common::retry::RetryConfig;
use ::common::store::MemoryStore;
use reqwest::Client;
use serde_json::Value;

use server::config::{AppConfig, CorsConfig, DatabaseConfig, ServerConfig};
use server::state::AppState;
use worker::testing::ScriptedBackend;
use worker::{ExecutionBackend, ExecutionClient, EvaluationPool, PollSettings};

pub mod routes {
    pub const HEALTH: &str = "/health";
    pub const PROBLEMS: &str = "/api/problems";
    pub const SUBMISSIONS: &str = "/api/submissions";

    pub fn problem(slug: &str) -> String {
        format!("/api/problems/{slug}")
    }

    pub fn submission(id: i32) -> String {
        format!("/api/submissions/{id}")
    }

    pub fn user_submissions(user_id: i32) -> String {
        format!("/api/submissions?user_id={user_id}")
    }

    pub fn problem_submissions(slug: &str, user_id: i32) -> String {
        format!("/api/submissions/problem/{slug}?user_id={user_id}")
    }
}

/// Slug of the problem every test app starts with.
pub const SUM: &str = "sum";

/// A running test server backed by an in-memory store.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub store: Arc<MemoryStore>,
    pub pool: Arc<EvaluationPool>,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

impl TestApp {
    /// Every unscripted input is accepted.
    pub async fn spawn() -> Self {
        Self::spawn_with(Arc::new(ScriptedBackend::new()), PoolConfig::default()).await
    }

    pub async fn spawn_with(backend: Arc<dyn ExecutionBackend>, pool: PoolConfig) -> Self {
        let store = Arc::new(MemoryStore::new());
        let problem = store.add_problem("Sum", SUM, "Easy").await;
        store.add_test_case(problem.id, "1 2", "3", false).await;
        store.add_test_case(problem.id, "2 2", "4", false).await;
        store.add_test_case(problem.id, "40 2", "42", true).await;

        let config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec!["http://localhost:3000".to_string()],
                },
            },
            database: DatabaseConfig::default(),
            execution: ExecutionConfig::default(),
            retry: RetryConfig::disabled(),
            pool,
        };

        let client = ExecutionClient::new(
            backend,
            config.retry,
            PollSettings {
                max_attempts: 5,
                interval: Duration::from_millis(1),
            },
        );
        let state = AppState::new(store.clone(), client, config);
        let pool = state.pool.clone();

        let app = server::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            store,
            pool,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn post(&self, path: &str, body: &Value) -> TestResponse {
        let res = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to send POST request");

        TestResponse::from_response(res).await
    }

    /// Submit code for the given problem and return the new submission id.
    pub async fn submit(&self, user_id: i32, slug: &str, code: &str, language: &str) -> i32 {
        let res = self
            .post(
                routes::SUBMISSIONS,
                &serde_json::json!({
                    "user_id": user_id,
                    "problem_slug": slug,
                    "code": code,
                    "language": language,
                }),
            )
            .await;
        assert_eq!(res.status, 201, "submit failed: {}", res.text);
        res.body["submission_id"]
            .as_i64()
            .expect("response body should contain 'submission_id'") as i32
    }

    /// Poll the submission endpoint until the verdict is no longer `Pending`.
    pub async fn wait_for_verdict(&self, id: i32) -> Value {
        for _ in 0..200 {
            let res = self.get(&routes::submission(id)).await;
            assert_eq!(res.status, 200, "get submission failed: {}", res.text);
            if res.body["submission"]["verdict"] != "Pending" {
                return res.body["submission"].clone();
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("submission {id} still pending");
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}
