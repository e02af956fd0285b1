pub mod error;
pub mod evaluator;
pub mod execution;
pub mod intake;
pub mod pool;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod verdict;

pub use error::{ExecutionError, IntakeError};
pub use evaluator::{EvaluationJob, Evaluator};
pub use execution::{ExecutionBackend, ExecutionClient, Judge0Backend, PollSettings};
pub use intake::{SubmissionService, SubmitRequest};
pub use pool::{EvaluationPool, PoolError};
