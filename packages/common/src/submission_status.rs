use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Cause attached to a runtime-error verdict reported by the execution backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuntimeErrorCause {
    Sigsegv,
    Sigxfsz,
    Sigfpe,
    Sigabrt,
    /// Non-zero exit code.
    Nzec,
    Other,
}

impl RuntimeErrorCause {
    pub const ALL: &'static [RuntimeErrorCause] = &[
        Self::Sigsegv,
        Self::Sigxfsz,
        Self::Sigfpe,
        Self::Sigabrt,
        Self::Nzec,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sigsegv => "SIGSEGV",
            Self::Sigxfsz => "SIGXFSZ",
            Self::Sigfpe => "SIGFPE",
            Self::Sigabrt => "SIGABRT",
            Self::Nzec => "NZEC",
            Self::Other => "Other",
        }
    }
}

/// Outcome of a submission.
///
/// Stored and returned to clients as its human-readable string, e.g.
/// `"Wrong Answer"` or `"Runtime Error (SIGSEGV)"`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Verdict {
    /// Evaluation has not finished yet.
    #[default]
    Pending,
    Accepted,
    WrongAnswer,
    TimeLimitExceeded,
    CompilationError,
    /// `None` is the generic verdict used when the evaluation itself broke
    /// down (backend unreachable, polling timeout).
    RuntimeError(Option<RuntimeErrorCause>),
    InternalError,
    ExecFormatError,
    /// The problem has no test cases to run against.
    NoTestCases,
    /// The evaluator failed outside of test case execution.
    SystemError,
    /// A backend status this judge does not know; carries the backend's
    /// description, or `"Unknown Error"`.
    Unrecognized(String),
}

impl Verdict {
    /// Label used when the backend gives no description for an unknown status.
    pub const UNKNOWN_ERROR: &'static str = "Unknown Error";

    /// Marks an unrecognized description that would otherwise read back as
    /// a different verdict.
    const UNRECOGNIZED_PREFIX: &'static str = "Unrecognized: ";

    fn fixed_label(&self) -> Option<&'static str> {
        Some(match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::WrongAnswer => "Wrong Answer",
            Self::TimeLimitExceeded => "Time Limit Exceeded",
            Self::CompilationError => "Compilation Error",
            Self::RuntimeError(None) => "Runtime Error",
            Self::InternalError => "Internal Error",
            Self::ExecFormatError => "Exec Format Error",
            Self::NoTestCases => "No Test Cases",
            Self::SystemError => "System Error",
            Self::RuntimeError(Some(_)) | Self::Unrecognized(_) => return None,
        })
    }

    /// Every verdict with a fixed label.
    pub fn known() -> impl Iterator<Item = Verdict> {
        [
            Self::Pending,
            Self::Accepted,
            Self::WrongAnswer,
            Self::TimeLimitExceeded,
            Self::CompilationError,
            Self::RuntimeError(None),
            Self::InternalError,
            Self::ExecFormatError,
            Self::NoTestCases,
            Self::SystemError,
        ]
        .into_iter()
        .chain(
            RuntimeErrorCause::ALL
                .iter()
                .map(|cause| Self::RuntimeError(Some(*cause))),
        )
    }

    fn find_known(label: &str) -> Option<Verdict> {
        Self::known().find(|v| v.to_string() == label)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RuntimeError(Some(cause)) => write!(f, "Runtime Error ({})", cause.as_str()),
            Self::Unrecognized(description) => {
                if description.starts_with(Self::UNRECOGNIZED_PREFIX)
                    || Self::find_known(description).is_some()
                {
                    f.write_str(Self::UNRECOGNIZED_PREFIX)?;
                }
                f.write_str(description)
            }
            other => f.write_str(other.fixed_label().unwrap_or_default()),
        }
    }
}

impl FromStr for Verdict {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(description) = s.strip_prefix(Self::UNRECOGNIZED_PREFIX) {
            return Ok(Self::Unrecognized(description.to_string()));
        }
        Ok(Self::find_known(s).unwrap_or_else(|| Self::Unrecognized(s.to_string())))
    }
}

impl From<String> for Verdict {
    fn from(s: String) -> Self {
        match s.parse() {
            Ok(verdict) => verdict,
            Err(never) => match never {},
        }
    }
}

impl From<Verdict> for String {
    fn from(v: Verdict) -> Self {
        v.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_roundtrip() {
        for verdict in Verdict::known() {
            let json = serde_json::to_string(&verdict).unwrap();
            let parsed: Verdict = serde_json::from_str(&json).unwrap();
            assert_eq!(verdict, parsed);
        }
    }

    #[test]
    fn test_labels_match_stored_strings() {
        assert_eq!(Verdict::WrongAnswer.to_string(), "Wrong Answer");
        assert_eq!(
            Verdict::RuntimeError(Some(RuntimeErrorCause::Nzec)).to_string(),
            "Runtime Error (NZEC)"
        );
        assert_eq!(Verdict::RuntimeError(None).to_string(), "Runtime Error");
        assert_eq!(Verdict::NoTestCases.to_string(), "No Test Cases");
    }

    #[test]
    fn test_from_str_keeps_unknown_labels() {
        assert_eq!(
            "Time Limit Exceeded".parse::<Verdict>().unwrap(),
            Verdict::TimeLimitExceeded
        );
        assert_eq!(
            Verdict::from("Memory Limit Exceeded".to_string()),
            Verdict::Unrecognized("Memory Limit Exceeded".into())
        );
    }

    #[test]
    fn test_unrecognized_survives_string_roundtrip() {
        for description in ["Pending", "Accepted", "Runtime Error (SIGSEGV)", "Unrecognized: x"] {
            let verdict = Verdict::Unrecognized(description.into());
            let stored = verdict.to_string();
            assert_ne!(stored, description);
            assert_eq!(Verdict::from(stored), verdict);
        }

        let plain = Verdict::Unrecognized("Memory Limit Exceeded".into());
        assert_eq!(plain.to_string(), "Memory Limit Exceeded");
        assert_eq!(Verdict::from(plain.to_string()), plain);
    }

    #[test]
    fn test_runtime_error_labels_use_cause() {
        for cause in RuntimeErrorCause::ALL {
            assert_eq!(
                Verdict::RuntimeError(Some(*cause)).to_string(),
                format!("Runtime Error ({})", cause.as_str())
            );
        }
    }
}
