use crate::dispatch::BatchFailure;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorContext {
    /// Configuration key or parameter that caused the error (e.g., "batch_size", "gate.calls_per_sec")
    pub field_path: Option<String>,
    /// Additional context about the error (e.g., expected range, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "task_runner", "worker_pool")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self {
            field_path: None,
            details: None,
            source: None,
        }
    }

    pub fn with_field_path(mut self, path: impl Into<String>) -> Self {
        self.field_path = Some(path.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Unified error type for the crate.
///
/// Per-task failures are not represented here: they are data, captured inline
/// in result sequences as [`crate::runner::TaskError`]. This enum covers the
/// conditions that abort an operation as a whole.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("Runtime error: {message}{}", format_context(.context))]
    Runtime {
        message: String,
        context: ErrorContext,
    },

    /// The enclosing operation was cancelled. Pending tasks were abandoned
    /// and partial results discarded.
    #[error("operation cancelled")]
    Cancelled,

    /// Every batch in a dispatch failed. Carries all per-batch errors.
    #[error("all {} batches failed{}", .failures.len(), first_failure(.failures))]
    AllBatchesFailed { failures: Vec<BatchFailure> },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref field) = ctx.field_path {
        parts.push(format!("field: {}", field));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

fn first_failure(failures: &[BatchFailure]) -> String {
    match failures.first() {
        Some(f) => format!(" (first: {})", f),
        None => String::new(),
    }
}

impl Error {
    /// Create a configuration error without structured context
    pub fn configuration(msg: impl Into<String>) -> Self {
        Error::Configuration {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Create a runtime error without structured context
    pub fn runtime(msg: impl Into<String>) -> Self {
        Error::Runtime {
            message: msg.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a runtime error with structured context
    pub fn runtime_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Runtime {
            message: msg.into(),
            context,
        }
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Configuration { context, .. } | Error::Runtime { context, .. } => Some(context),
            _ => None,
        }
    }

    /// True when the enclosing operation should stop retrying entirely.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_context_builder() {
        let ctx = ErrorContext::new()
            .with_field_path("batch_size")
            .with_details("must be positive")
            .with_source("dispatcher");
        assert_eq!(ctx.field_path.as_deref(), Some("batch_size"));
        assert_eq!(ctx.details.as_deref(), Some("must be positive"));
        assert_eq!(ctx.source.as_deref(), Some("dispatcher"));
    }

    #[test]
    fn test_configuration_error_display_includes_context() {
        let err = Error::configuration_with_context(
            "batch_size must be positive",
            ErrorContext::new().with_field_path("batch_size"),
        );
        let msg = err.to_string();
        assert!(msg.contains("batch_size must be positive"));
        assert!(msg.contains("field: batch_size"));
    }

    #[test]
    fn test_plain_error_display_has_no_context_suffix() {
        let err = Error::runtime("worker pool is shut down");
        assert_eq!(err.to_string(), "Runtime error: worker pool is shut down");
    }

    #[test]
    fn test_all_batches_failed_display() {
        let failures = vec![BatchFailure::new(0, "boom"), BatchFailure::new(1, "bust")];
        let err = Error::AllBatchesFailed { failures };
        let msg = err.to_string();
        assert!(msg.starts_with("all 2 batches failed"));
        assert!(msg.contains("boom"));
    }

    #[test]
    fn test_cancelled_predicate() {
        assert!(Error::Cancelled.is_cancelled());
        assert!(!Error::runtime("x").is_cancelled());
    }
}
