use common::problem::{Problem, VisibleTestCase};
use serde::Serialize;

#[derive(Serialize)]
pub struct ProblemListResponse {
    pub problems: Vec<Problem>,
}

/// A problem with the test cases its submitters may see.
#[derive(Serialize)]
pub struct ProblemDetailResponse {
    pub problem: Problem,
    pub test_cases: Vec<VisibleTestCase>,
}
