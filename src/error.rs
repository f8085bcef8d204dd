use thiserror::Error;

/// A single problem found while validating configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Unified error type for torrent-tidy.
#[derive(Error, Debug, Clone)]
pub enum TidyError {
    /// Path vanished or never existed (ENOENT)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Access denied (EACCES)
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Any other I/O failure
    #[error("I/O error: {0}")]
    Io(String),

    /// Invalid argument (EINVAL)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration validation failed
    #[error("Validation error: {}", format_issues(.0))]
    ValidationError(Vec<ValidationIssue>),

    /// Parse/serialization error
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A path mapping rule that cannot be applied
    #[error("Invalid path mapping '{from}': {reason}")]
    InvalidPathMapping { from: String, reason: String },

    /// Rule predicate could not be evaluated against a torrent
    #[error("Evaluation error: {0}")]
    Evaluation(String),
}

fn format_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl TidyError {
    /// Errors caused by the filesystem moving underneath a scan.
    ///
    /// Callers log and skip these instead of propagating them.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TidyError::NotFound(_) | TidyError::PermissionDenied(_)
        )
    }

    /// Errors that must stop a run before any index is built.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            TidyError::ValidationError(_)
                | TidyError::InvalidPathMapping { .. }
                | TidyError::ParseError(_)
        )
    }
}

// === Conversion Implementations ===

macro_rules! impl_from_error {
    ($err_type:ty, $arm:pat => $body:expr) => {
        impl From<$err_type> for TidyError {
            fn from(err: $err_type) -> Self {
                match err {
                    $arm => $body,
                }
            }
        }
    };
}

impl_from_error!(std::io::Error, e => match e.kind() {
    std::io::ErrorKind::NotFound => TidyError::NotFound(e.to_string()),
    std::io::ErrorKind::PermissionDenied => TidyError::PermissionDenied(e.to_string()),
    std::io::ErrorKind::InvalidInput => TidyError::InvalidArgument(e.to_string()),
    _ => TidyError::Io(e.to_string()),
});

impl_from_error!(serde_json::Error, e => TidyError::ParseError(e.to_string()));
impl_from_error!(toml::de::Error, e => TidyError::ParseError(e.to_string()));

/// Result type alias for operations that can fail with TidyError.
pub type TidyResult<T> = Result<T, TidyError>;
