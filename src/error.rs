use std::fmt;

use crate::analyzer::AnalyzeError;

/// User-facing failure categories. Each maps to one fixed sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidApiKey,
    InsufficientPermission,
    ApiKeyGeneric,
    NetworkUnavailable,
    ServiceUnavailable,
    MalformedResult,
    Unknown,
}

impl ErrorKind {
    pub fn message(&self) -> &'static str {
        match self {
            ErrorKind::InvalidApiKey => {
                "The API key is not valid. Please check that your key is entered correctly and try again."
            }
            ErrorKind::InsufficientPermission => {
                "Permission denied. Your API key does not have access to the analysis model."
            }
            ErrorKind::ApiKeyGeneric => {
                "There is a problem with your API key configuration. Please verify it and try again."
            }
            ErrorKind::NetworkUnavailable => {
                "Could not reach the analysis service. Please check your internet connection."
            }
            ErrorKind::ServiceUnavailable => {
                "The analysis service is temporarily unavailable. Please try again in a few moments."
            }
            ErrorKind::MalformedResult | ErrorKind::Unknown => {
                "An unexpected error occurred during analysis. Please try again."
            }
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Classify raw error text by case-insensitive substring match. First rule wins.
pub fn classify(text: &str) -> ErrorKind {
    let text = text.to_lowercase();

    if text.contains("api key not valid") || (text.contains("400") && text.contains("api key")) {
        ErrorKind::InvalidApiKey
    } else if text.contains("permission denied") || text.contains("403") {
        ErrorKind::InsufficientPermission
    } else if text.contains("api key") {
        ErrorKind::ApiKeyGeneric
    } else if text.contains("failed to fetch") {
        ErrorKind::NetworkUnavailable
    } else if text.contains("503") || text.contains("unavailable") {
        ErrorKind::ServiceUnavailable
    } else {
        ErrorKind::Unknown
    }
}

/// Map a collaborator failure to its user-facing category.
pub fn classify_error(err: &AnalyzeError) -> ErrorKind {
    match err {
        AnalyzeError::MalformedResult(_) => ErrorKind::MalformedResult,
        other => classify(&other.to_string()),
    }
}
