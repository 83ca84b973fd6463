use thiserror::Error;

/// Failure at the fetch boundary.
///
/// An empty filter result is never reported through this type; it is a
/// normal outcome rendered as a placeholder.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataError {
    /// Transport failure, unreadable file, or non-success status.
    #[error("network error fetching {resource}: {reason}")]
    Network { resource: String, reason: String },

    /// Payload was not the expected JSON shape.
    #[error("parse error in {resource}: {reason}")]
    Parse { resource: String, reason: String },
}

impl DataError {
    pub fn network(resource: impl Into<String>, reason: impl ToString) -> Self {
        DataError::Network {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }

    pub fn parse(resource: impl Into<String>, reason: impl ToString) -> Self {
        DataError::Parse {
            resource: resource.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DataError::Network { .. } => "network",
            DataError::Parse { .. } => "parse",
        }
    }

    pub fn resource(&self) -> &str {
        match self {
            DataError::Network { resource, .. } | DataError::Parse { resource, .. } => resource,
        }
    }
}
