use std::fmt;

use serde::Serialize;

/// A single problem found while validating schema definitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaIssue {
    /// Dotted path to the offending definition, e.g. `beans[1].fields[0].type`.
    pub path: String,
    pub message: String,
}

impl SchemaIssue {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

/// Every issue found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    issues: Vec<SchemaIssue>,
}

impl ValidationError {
    pub fn new(issues: Vec<SchemaIssue>) -> Self {
        Self { issues }
    }

    pub fn issues(&self) -> &[SchemaIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<SchemaIssue> {
        self.issues
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema has {} issue(s)", self.issues.len())?;
        for issue in &self.issues {
            write!(f, "\n  - {issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
