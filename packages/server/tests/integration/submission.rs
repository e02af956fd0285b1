use std::sync::Arc;

use ::common::config::PoolConfig;
use async_trait::async_trait;
use serde_json::json;
use worker::ExecutionBackend;
use worker::error::ExecutionError;
use worker::execution::{ExecutionResult, ExecutionStatus, ExecutionUnit};
use worker::testing::{Script, ScriptedBackend, accepted, result};

use crate::common::{SUM, TestApp, routes};

/// Dispatch never completes.
struct StalledBackend;

#[async_trait]
impl ExecutionBackend for StalledBackend {
    async fn dispatch(&self, _unit: &ExecutionUnit<'_>) -> Result<String, ExecutionError> {
        std::future::pending().await
    }

    async fn fetch_status(&self, _token: &str) -> Result<ExecutionResult, ExecutionError> {
        std::future::pending().await
    }
}

mod submission_creation {
    use super::*;

    #[tokio::test]
    async fn submission_starts_pending_and_gets_a_verdict() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::SUBMISSIONS,
                &json!({
                    "user_id": 1,
                    "problem_slug": SUM,
                    "code": "print(sum(map(int, input().split())))",
                    "language": "python",
                }),
            )
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["message"], "Submission created");
        let id = res.body["submission_id"].as_i64().unwrap() as i32;

        let submission = app.wait_for_verdict(id).await;
        assert_eq!(submission["verdict"], "Accepted");
        assert_eq!(submission["language"], "python");
        assert_eq!(submission["user_id"], 1);
        assert_eq!(submission["judge_token"], "tok-1");
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::SUBMISSIONS,
                &json!({ "user_id": 1, "problem_slug": SUM, "language": "c" }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
        assert_eq!(
            res.body["message"],
            "Problem, code, and language are required"
        );
    }

    #[tokio::test]
    async fn unsupported_language_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::SUBMISSIONS,
                &json!({
                    "user_id": 1,
                    "problem_slug": SUM,
                    "code": "main = print 3",
                    "language": "haskell",
                }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["message"], "Unsupported language");
    }

    #[tokio::test]
    async fn unknown_problem_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .post(
                routes::SUBMISSIONS,
                &json!({
                    "user_id": 1,
                    "problem_slug": "nope",
                    "code": "x",
                    "language": "cpp",
                }),
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "Problem not found");
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app
            .post(routes::SUBMISSIONS, &json!({ "problem_slug": SUM }))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn full_queue_is_service_unavailable() {
        let app = TestApp::spawn_with(
            Arc::new(StalledBackend),
            PoolConfig {
                concurrency: 1,
                queue_capacity: 1,
            },
        )
        .await;

        let mut statuses = Vec::new();
        for _ in 0..6 {
            let res = app
                .post(
                    routes::SUBMISSIONS,
                    &json!({
                        "user_id": 1,
                        "problem_slug": SUM,
                        "code": "while(1);",
                        "language": "c",
                    }),
                )
                .await;
            if res.status == 503 {
                assert_eq!(res.code(), "QUEUE_FULL");
            }
            statuses.push(res.status);
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }

        let created = statuses.iter().filter(|&&s| s == 201).count();
        assert!(created <= 3, "statuses: {statuses:?}");
        assert!(statuses.contains(&503), "statuses: {statuses:?}");

        // Refused submissions leave no record behind.
        let listed = app.get(&routes::user_submissions(1)).await;
        assert_eq!(
            listed.body["submissions"].as_array().unwrap().len(),
            created
        );
    }
}

mod verdicts {
    use super::*;

    #[tokio::test]
    async fn wrong_answer_stops_and_averages_evaluated_cases() {
        let mut wrong = result(ExecutionStatus::WRONG_ANSWER);
        wrong.status.description = Some("Wrong Answer".into());
        wrong.message = Some("expected 4".into());
        let backend = ScriptedBackend::new()
            .on_input("1 2", Script::finished(accepted(0.5, 1000)))
            .on_input("2 2", Script::finished(wrong));
        let backend = Arc::new(backend);
        let app = TestApp::spawn_with(backend.clone(), PoolConfig::default()).await;

        let id = app.submit(3, SUM, "print(3)", "python").await;
        let submission = app.wait_for_verdict(id).await;

        assert_eq!(submission["verdict"], "Wrong Answer");
        assert_eq!(submission["runtime_ms"], 250);
        assert_eq!(submission["memory_kb"], 500);
        assert_eq!(submission["error_message"], "expected 4");
        assert_eq!(backend.dispatched_inputs(), vec!["1 2", "2 2"]);
    }

    #[tokio::test]
    async fn compilation_error_carries_compiler_output() {
        let mut failed = result(ExecutionStatus::COMPILATION_ERROR);
        failed.compile_output = Some("error: expected ';' before '}'".into());
        let backend = ScriptedBackend::new().on_input("1 2", Script::finished(failed));
        let app = TestApp::spawn_with(Arc::new(backend), PoolConfig::default()).await;

        let id = app.submit(3, SUM, "int main() { return 0 }", "cpp").await;
        let submission = app.wait_for_verdict(id).await;

        assert_eq!(submission["verdict"], "Compilation Error");
        assert_eq!(submission["error_message"], "error: expected ';' before '}'");
    }

    #[tokio::test]
    async fn backend_timeout_is_runtime_error() {
        let backend = ScriptedBackend::new().on_input(
            "1 2",
            Script::polls(vec![Ok(result(ExecutionStatus::IN_QUEUE))]),
        );
        let app = TestApp::spawn_with(Arc::new(backend), PoolConfig::default()).await;

        let id = app.submit(3, SUM, "print(3)", "python").await;
        let submission = app.wait_for_verdict(id).await;

        assert_eq!(submission["verdict"], "Runtime Error");
        assert!(
            submission["error_message"]
                .as_str()
                .unwrap()
                .contains("Polling timeout")
        );
        assert!(submission["runtime_ms"].is_null());
    }

    #[tokio::test]
    async fn hidden_case_failure_is_reported() {
        let backend = ScriptedBackend::new().on_input(
            "40 2",
            Script::finished(result(ExecutionStatus::RUNTIME_ERROR_SIGSEGV)),
        );
        let app = TestApp::spawn_with(Arc::new(backend), PoolConfig::default()).await;

        let id = app.submit(3, SUM, "int main(){int*p=0;*p=1;}", "c").await;
        let submission = app.wait_for_verdict(id).await;

        assert_eq!(submission["verdict"], "Runtime Error (SIGSEGV)");
    }
}

mod listing {
    use super::*;

    #[tokio::test]
    async fn user_listing_is_newest_first() {
        let app = TestApp::spawn().await;
        let first = app.submit(5, SUM, "a", "java").await;
        let second = app.submit(5, SUM, "b", "java").await;
        app.submit(6, SUM, "c", "java").await;

        let res = app.get(&routes::user_submissions(5)).await;

        assert_eq!(res.status, 200);
        let ids: Vec<i64> = res.body["submissions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].as_i64().unwrap())
            .collect();
        assert_eq!(ids, vec![second as i64, first as i64]);
    }

    #[tokio::test]
    async fn limit_caps_the_listing() {
        let app = TestApp::spawn().await;
        for _ in 0..4 {
            app.submit(5, SUM, "x", "javascript").await;
        }

        let res = app
            .get(&format!("{}&limit=2", routes::user_submissions(5)))
            .await;

        assert_eq!(res.body["submissions"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn problem_listing_filters_by_problem() {
        let app = TestApp::spawn().await;
        let other = app.store.add_problem("Other", "other", "Medium").await;
        app.store.add_test_case(other.id, "x", "x", false).await;
        app.submit(5, SUM, "x", "c").await;
        app.submit(5, "other", "x", "c").await;

        let res = app.get(&routes::problem_submissions("other", 5)).await;

        let submissions = res.body["submissions"].as_array().unwrap();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0]["problem_id"], other.id);

        let missing = app.get(&routes::problem_submissions("nope", 5)).await;
        assert_eq!(missing.status, 404);
    }

    #[tokio::test]
    async fn listing_requires_user_id() {
        let app = TestApp::spawn().await;

        let res = app.get(routes::SUBMISSIONS).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn unknown_submission_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::submission(9999)).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["message"], "Submission not found");
    }
}
