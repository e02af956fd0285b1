use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A problem that submissions are judged against.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub id: i32,
    pub title: String,
    /// URL-friendly identifier clients use to address the problem.
    pub slug: String,
    /// Problem statement in Markdown.
    pub description: String,
    pub difficulty: String,
    pub created_at: DateTime<Utc>,
}

/// Input/expected-output pair belonging to one problem.
///
/// Test cases run in ascending `id` order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    pub id: i32,
    pub problem_id: i32,
    pub input: String,
    pub expected_output: String,
    /// Hidden cases are graded but never shown to clients.
    pub is_hidden: bool,
}

/// Test case as shown to clients. Only built from visible cases.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VisibleTestCase {
    pub id: i32,
    pub input: String,
    pub expected_output: String,
}

impl From<TestCase> for VisibleTestCase {
    fn from(tc: TestCase) -> Self {
        Self {
            id: tc.id,
            input: tc.input,
            expected_output: tc.expected_output,
        }
    }
}
