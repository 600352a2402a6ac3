use std::fmt;

/// Machine-readable error codes for callers that branch on failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    InvalidInput,
    SearchCancelled,
    EmbeddingUnavailable,
    InvalidEmbeddingResponse,
    EmbeddingBackendFailure,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::InvalidInput => "E1002",
            Self::SearchCancelled => "E2001",
            Self::EmbeddingUnavailable => "E3001",
            Self::InvalidEmbeddingResponse => "E3002",
            Self::EmbeddingBackendFailure => "E3003",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Invalid configuration",
            Self::InvalidInput => "Invalid input file",
            Self::SearchCancelled => "Search cancelled",
            Self::EmbeddingUnavailable => "No embedding backend configured",
            Self::InvalidEmbeddingResponse => "Invalid embedding response",
            Self::EmbeddingBackendFailure => "Embedding backend failed",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => {
                Some("Fix .glean/config.toml or the GLEAN_* environment variables and retry.")
            }
            Self::InvalidInput => {
                Some("Items must be a JSON array of {id, label, keywords?, description?}.")
            }
            Self::SearchCancelled => None,
            Self::EmbeddingUnavailable => Some(
                "Set [embedder] provider = \"hashing\" or \"ollama\", or export GLEAN_EMBEDDER.",
            ),
            Self::InvalidEmbeddingResponse => {
                Some("Check that the embedding model returns one vector per input text.")
            }
            Self::EmbeddingBackendFailure => {
                Some("Verify the embedding server is reachable and the model is pulled.")
            }
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
