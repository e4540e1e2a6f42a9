// Render and validation errors
// Fatal render conditions plus the non-fatal findings of the validator

use std::fmt;
use thiserror::Error;

/// Result type for render operations
pub type RenderResult<T> = Result<T, RenderError>;

/// Errors that abort a render call. No partial output is ever returned.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("duplicate job name '{name}' in stage '{stage}' (first defined in stage '{first_stage}')")]
    DuplicateJobName {
        name: String,
        first_stage: String,
        stage: String,
    },

    #[error("failed to encode '{label}': {source}")]
    Encoding {
        label: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("job '{job}' {kind} unknown job '{reference}'")]
    DanglingReference {
        job: String,
        reference: String,
        kind: ReferenceKind,
    },
}

impl RenderError {
    pub fn duplicate_job_name(
        name: impl Into<String>,
        first_stage: impl Into<String>,
        stage: impl Into<String>,
    ) -> Self {
        Self::DuplicateJobName {
            name: name.into(),
            first_stage: first_stage.into(),
            stage: stage.into(),
        }
    }

    pub fn dangling_reference(
        job: impl Into<String>,
        reference: impl Into<String>,
        kind: ReferenceKind,
    ) -> Self {
        Self::DanglingReference {
            job: job.into(),
            reference: reference.into(),
            kind,
        }
    }
}

/// Which job list a by-name reference was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    /// `needs:` entry
    Needs,
    /// `dependencies:` entry
    Dependency,
}

impl ReferenceKind {
    pub fn field(&self) -> &'static str {
        match self {
            ReferenceKind::Needs => "needs",
            ReferenceKind::Dependency => "dependencies",
        }
    }
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Needs => write!(f, "needs"),
            ReferenceKind::Dependency => write!(f, "depends on"),
        }
    }
}

/// Validation finding for semantic checks
#[derive(Debug, Clone)]
pub struct ValidationError {
    pub message: String,
    pub path: String,
    pub suggestion: Option<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: path.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "validation error at '{}': {}", self.path, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " ({})", suggestion)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}
