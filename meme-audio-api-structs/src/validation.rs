use std::fmt;

use serde::{Deserialize, Serialize};

/// The longest prompt, in characters, the server accepts.
pub const PROMPT_MAX_CHARS: usize = 500;

/// A single field that failed validation.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Issue {
    pub field: String,
    pub message: String,
}

impl Issue {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Every problem found while validating a request.
///
/// This is never constructed empty; a request with no issues is valid.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct ValidationErrors {
    pub issues: Vec<Issue>,
}

impl ValidationErrors {
    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            issues: vec![Issue::new(field, message)],
        }
    }
}

impl From<Issue> for ValidationErrors {
    fn from(issue: Issue) -> Self {
        Self {
            issues: vec![issue],
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let issues = self
            .issues
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{issues}")
    }
}

impl std::error::Error for ValidationErrors {}

/// A prompt known to be between 1 and [`PROMPT_MAX_CHARS`] characters long.
///
/// Length is counted in Unicode scalar values, not bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn parse(prompt: String) -> Result<Self, Issue> {
        match prompt.chars().count() {
            0 => Err(Issue::new("prompt", "Prompt cannot be empty")),
            n if n > PROMPT_MAX_CHARS => Err(Issue::new(
                "prompt",
                format!("Prompt must be {PROMPT_MAX_CHARS} characters or less"),
            )),
            _ => Ok(Self(prompt)),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn char_count(&self) -> usize {
        self.0.chars().count()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
