use common::submission::Submission;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub struct CreateSubmissionResponse {
    pub message: &'static str,
    pub submission_id: i32,
}

#[derive(Serialize)]
pub struct SubmissionResponse {
    pub submission: Submission,
}

#[derive(Serialize)]
pub struct SubmissionListResponse {
    pub submissions: Vec<Submission>,
}

/// Query parameters for submission listings.
#[derive(Debug, Deserialize)]
pub struct ListSubmissionsQuery {
    pub user_id: i32,
    /// Missing or zero means the endpoint's default.
    pub limit: Option<u64>,
}

impl ListSubmissionsQuery {
    pub fn limit_or(&self, default: u64) -> u64 {
        self.limit.filter(|&n| n > 0).unwrap_or(default)
    }
}
