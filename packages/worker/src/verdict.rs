use common::{RuntimeErrorCause, Verdict};

use crate::execution::ExecutionStatus;

/// Translate a final backend status into a submission verdict.
///
/// Unknown status ids keep the backend's own description, falling back to
/// [`Verdict::UNKNOWN_ERROR`].
pub fn map_verdict(status: &ExecutionStatus) -> Verdict {
    match status.id {
        ExecutionStatus::ACCEPTED => Verdict::Accepted,
        ExecutionStatus::WRONG_ANSWER => Verdict::WrongAnswer,
        ExecutionStatus::TIME_LIMIT_EXCEEDED => Verdict::TimeLimitExceeded,
        ExecutionStatus::COMPILATION_ERROR => Verdict::CompilationError,
        ExecutionStatus::RUNTIME_ERROR_SIGSEGV => runtime(RuntimeErrorCause::Sigsegv),
        ExecutionStatus::RUNTIME_ERROR_SIGXFSZ => runtime(RuntimeErrorCause::Sigxfsz),
        ExecutionStatus::RUNTIME_ERROR_SIGFPE => runtime(RuntimeErrorCause::Sigfpe),
        ExecutionStatus::RUNTIME_ERROR_SIGABRT => runtime(RuntimeErrorCause::Sigabrt),
        ExecutionStatus::RUNTIME_ERROR_NZEC => runtime(RuntimeErrorCause::Nzec),
        ExecutionStatus::RUNTIME_ERROR_OTHER => runtime(RuntimeErrorCause::Other),
        ExecutionStatus::INTERNAL_ERROR => Verdict::InternalError,
        ExecutionStatus::EXEC_FORMAT_ERROR => Verdict::ExecFormatError,
        _ => Verdict::Unrecognized(
            status
                .description
                .as_deref()
                .filter(|d| !d.is_empty())
                .unwrap_or(Verdict::UNKNOWN_ERROR)
                .to_string(),
        ),
    }
}

fn runtime(cause: RuntimeErrorCause) -> Verdict {
    Verdict::RuntimeError(Some(cause))
}
