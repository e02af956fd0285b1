use std::sync::Arc;

use common::store::{ProblemSource, SubmissionStore, TestCaseSource};
use worker::{EvaluationPool, Evaluator, ExecutionClient, SubmissionService};

use crate::config::AppConfig;

#[derive(Clone)]
pub struct AppState {
    pub problems: Arc<dyn ProblemSource>,
    pub test_cases: Arc<dyn TestCaseSource>,
    pub submissions: Arc<dyn SubmissionStore>,
    pub intake: Arc<SubmissionService>,
    pub pool: Arc<EvaluationPool>,
    pub config: AppConfig,
}

impl AppState {
    /// Wire a store and an execution client into a running evaluation pool.
    /// Must be called inside a tokio runtime.
    pub fn new<S>(store: Arc<S>, client: ExecutionClient, config: AppConfig) -> Self
    where
        S: ProblemSource + TestCaseSource + SubmissionStore + 'static,
    {
        let evaluator = Arc::new(Evaluator::new(client, store.clone(), store.clone()));
        let pool = Arc::new(EvaluationPool::start(evaluator, config.pool));
        let intake = Arc::new(SubmissionService::new(
            store.clone(),
            store.clone(),
            pool.clone(),
        ));

        Self {
            problems: store.clone(),
            test_cases: store.clone(),
            submissions: store,
            intake,
            pool,
            config,
        }
    }
}
