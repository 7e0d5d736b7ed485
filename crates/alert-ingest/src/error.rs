use thiserror::Error;

/// Failure to obtain a snapshot, ledger listing or verdict.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FetchError {
    /// Network failure or non-success HTTP status.
    #[error("{detail}")]
    Transport { status: Option<u16>, detail: String },
    /// The response arrived but was not shaped as expected.
    #[error("{detail}")]
    Parse { detail: String },
    #[error("{detail}")]
    NotFound { detail: String },
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } => "transport",
            FetchError::Parse { .. } => "parse",
            FetchError::NotFound { .. } => "not_found",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Transport { status, .. } => *status,
            FetchError::NotFound { .. } => Some(404),
            FetchError::Parse { .. } => None,
        }
    }
}

/// Failure to resolve an incident. Never retried automatically.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// Missing local input; no request was sent.
    #[error("{detail}")]
    Precondition { detail: String },
    /// The backend refused the resolution.
    #[error("resolution rejected: {detail}")]
    Rejected { status: u16, detail: String },
    #[error("resolution request failed: {detail}")]
    Transport { detail: String },
}

impl ResolveError {
    pub fn kind(&self) -> &'static str {
        match self {
            ResolveError::Precondition { .. } => "precondition",
            ResolveError::Rejected { .. } => "rejected",
            ResolveError::Transport { .. } => "transport",
        }
    }
}

/// Invalid backend configuration detected before any request is made.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid backend url {url:?}: {detail}")]
    InvalidUrl { url: String, detail: String },
    #[error(transparent)]
    Client(#[from] reqwest::Error),
}
