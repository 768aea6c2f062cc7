use std::fmt;

/// Classification of a sink or fetch failure, attached to the warn logs
/// emitted before a sink collapses the failure into its boolean/count result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkErrorKind {
    Timeout,
    Network,
    Authentication,
    RateLimit,
    Schema,
    Status,
    Decode,
    Unknown,
}

impl SinkErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Network => "network",
            Self::Authentication => "authentication",
            Self::RateLimit => "rate_limit",
            Self::Schema => "schema",
            Self::Status => "status",
            Self::Decode => "decode",
            Self::Unknown => "unknown",
        }
    }

    /// Classify a non-success HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Authentication,
            429 => Self::RateLimit,
            400 | 404 | 409 | 422 => Self::Schema,
            408 | 504 => Self::Timeout,
            _ => Self::Status,
        }
    }

    /// Whether retrying the same request later could succeed.
    pub fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::Network | Self::RateLimit | Self::Status
        )
    }
}

impl fmt::Display for SinkErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_classifies_common_codes() {
        assert_eq!(SinkErrorKind::from_status(401), SinkErrorKind::Authentication);
        assert_eq!(SinkErrorKind::from_status(403), SinkErrorKind::Authentication);
        assert_eq!(SinkErrorKind::from_status(429), SinkErrorKind::RateLimit);
        assert_eq!(SinkErrorKind::from_status(422), SinkErrorKind::Schema);
        assert_eq!(SinkErrorKind::from_status(504), SinkErrorKind::Timeout);
        assert_eq!(SinkErrorKind::from_status(502), SinkErrorKind::Status);
    }

    #[test]
    fn test_transient_kinds() {
        assert!(SinkErrorKind::RateLimit.is_transient());
        assert!(!SinkErrorKind::Authentication.is_transient());
        assert!(!SinkErrorKind::Schema.is_transient());
    }
}
