use std::error::Error as StdError;

/// Failure of a Retailer API call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No bearer token could be obtained; the API was never contacted.
    #[error("authentication failed: {0}")]
    Auth(#[from] bolmcp_oauth::Error),
    /// The API answered with a non-2xx status.
    #[error("retailer API returned HTTP {status}: {body}")]
    Api { status: u16, body: String },
    #[error("retailer API unreachable: {0}")]
    Network(#[source] reqwest::Error),
    /// Rejected locally before any request was sent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("failed to decode retailer API response: {0}")]
    Decode(String),
    #[error(transparent)]
    UrlParse(#[from] url::ParseError),
    #[error("{context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },
}

impl Error {
    #[must_use]
    pub fn external<E>(context: impl Into<String>, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    /// HTTP status from the Retailer API or, for auth failures, the token
    /// endpoint.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Auth(e) => e.status(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Network(e) => e.is_timeout(),
            Self::Auth(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Short label for logs and metrics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Api { .. } => "api",
            Self::Network(_) => "network",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::Decode(_) => "decode",
            Self::UrlParse(_) | Self::External { .. } => "internal",
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Network(err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
