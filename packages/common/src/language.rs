use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A programming language accepted for submissions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    JavaScript,
    Python,
    Java,
    Cpp,
    C,
}

/// Language name, backend language id.
const LANGUAGE_TABLE: &[(Language, &str, u32)] = &[
    (Language::JavaScript, "javascript", 63), // Node.js
    (Language::Python, "python", 71),         // Python 3
    (Language::Java, "java", 62),
    (Language::Cpp, "cpp", 54),
    (Language::C, "c", 50),
];

impl Language {
    pub const ALL: &'static [Language] = &[
        Self::JavaScript,
        Self::Python,
        Self::Java,
        Self::Cpp,
        Self::C,
    ];

    fn entry(&self) -> &'static (Language, &'static str, u32) {
        match self {
            Self::JavaScript => &LANGUAGE_TABLE[0],
            Self::Python => &LANGUAGE_TABLE[1],
            Self::Java => &LANGUAGE_TABLE[2],
            Self::Cpp => &LANGUAGE_TABLE[3],
            Self::C => &LANGUAGE_TABLE[4],
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.entry().1
    }

    /// Language id understood by the execution backend.
    pub fn judge0_id(&self) -> u32 {
        self.entry().2
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when a language name is not in the supported set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unsupported language '{0}'")]
pub struct UnsupportedLanguage(pub String);

impl FromStr for Language {
    type Err = UnsupportedLanguage;

    /// Case-insensitive lookup by name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LANGUAGE_TABLE
            .iter()
            .find(|(_, name, _)| name.eq_ignore_ascii_case(s.trim()))
            .map(|(lang, _, _)| *lang)
            .ok_or_else(|| UnsupportedLanguage(s.to_string()))
    }
}
