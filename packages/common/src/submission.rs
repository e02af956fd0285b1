use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Language, Verdict};

/// A persisted evaluation attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub id: i32,
    pub user_id: i32,
    pub problem_id: i32,
    pub language: Language,
    pub code: String,
    /// Backend token of the first dispatched test case.
    pub judge_token: Option<String>,
    pub verdict: Verdict,
    /// Average runtime in milliseconds.
    pub runtime_ms: Option<i32>,
    /// Average memory usage in kilobytes.
    pub memory_kb: Option<i32>,
    /// Compiler output, stderr capture or judge message.
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Fields needed to create a submission record in the `Pending` state.
#[derive(Clone, Debug)]
pub struct NewSubmission {
    pub user_id: i32,
    pub problem_id: i32,
    pub language: Language,
    pub code: String,
}

/// The single terminal write applied to a submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionOutcome {
    pub verdict: Verdict,
    pub runtime_ms: Option<i32>,
    pub memory_kb: Option<i32>,
    pub error_message: Option<String>,
}

impl SubmissionOutcome {
    /// Outcome with no metrics attached.
    pub fn bare(verdict: Verdict, error_message: Option<String>) -> Self {
        Self {
            verdict,
            runtime_ms: None,
            memory_kb: None,
            error_message,
        }
    }

    pub fn system_error(message: impl Into<String>) -> Self {
        Self::bare(Verdict::SystemError, Some(message.into()))
    }
}

impl Submission {
    /// Build a `Pending` submission from a creation request.
    pub fn pending(id: i32, new: NewSubmission, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            problem_id: new.problem_id,
            language: new.language,
            code: new.code,
            judge_token: None,
            verdict: Verdict::Pending,
            runtime_ms: None,
            memory_kb: None,
            error_message: None,
            created_at,
        }
    }

    /// Apply a terminal outcome to this record.
    pub fn apply(&mut self, outcome: SubmissionOutcome) {
        self.verdict = outcome.verdict;
        self.runtime_ms = outcome.runtime_ms;
        self.memory_kb = outcome.memory_kb;
        self.error_message = outcome.error_message;
    }
}
