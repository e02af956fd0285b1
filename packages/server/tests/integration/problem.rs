use crate::common::{SUM, TestApp, routes};

#[tokio::test]
async fn health_check() {
    let app = TestApp::spawn().await;

    let res = app.get(routes::HEALTH).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["status"], "ok");
}

#[tokio::test]
async fn lists_problems() {
    let app = TestApp::spawn().await;
    app.store.add_problem("Second", "second", "Hard").await;

    let res = app.get(routes::PROBLEMS).await;

    assert_eq!(res.status, 200);
    let problems = res.body["problems"].as_array().unwrap();
    assert_eq!(problems.len(), 2);
    assert_eq!(problems[0]["slug"], SUM);
    assert_eq!(problems[1]["difficulty"], "Hard");
}

#[tokio::test]
async fn problem_detail_shows_only_visible_cases() {
    let app = TestApp::spawn().await;

    let res = app.get(&routes::problem(SUM)).await;

    assert_eq!(res.status, 200);
    assert_eq!(res.body["problem"]["title"], "Sum");
    let cases = res.body["test_cases"].as_array().unwrap();
    assert_eq!(cases.len(), 2);
    assert_eq!(cases[0]["input"], "1 2");
    assert_eq!(cases[1]["expected_output"], "4");
    assert!(!res.text.contains("40 2"), "hidden case leaked: {}", res.text);
}

#[tokio::test]
async fn unknown_problem_is_not_found() {
    let app = TestApp::spawn().await;

    let res = app.get(&routes::problem("missing")).await;

    assert_eq!(res.status, 404);
    assert_eq!(res.code(), "NOT_FOUND");
    assert_eq!(res.body["message"], "Problem not found");
}
