use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Discriminant of [`Error`], used wherever control flow depends on what went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TransportFailure,
    ServerError,
    ClientError,
    RateLimited,
    NameTaken,
    AlreadyExists,
    BothNamesExhausted,
    RemoteRejected,
    ParseFailure,
    TokenNotFound,
    Filesystem,
    InvalidArgument,
}

#[derive(Error, Debug)]
pub enum Error {
    #[error("request to `{url}` failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("`{url}` answered with server error {status}")]
    Server { url: String, status: u16 },
    #[error("`{url}` answered with client error {status}")]
    Client { url: String, status: u16 },
    #[error("`{url}` is rate limiting and gave no usable `Retry-After` ({value:?})")]
    InvalidRetryAfter { url: String, value: Option<String> },
    #[error("`{url}` still failed after waiting {wait:?} for the rate limit: {source}")]
    RateLimited {
        url: String,
        wait: Duration,
        #[source]
        source: Box<Error>,
    },
    #[error("emoji name `{0}` is taken by a built-in emoji")]
    NameTaken(String),
    #[error("emoji `{0}` already exists")]
    AlreadyExists(String),
    #[error("both `{name}` and `{taken_name}` are taken")]
    BothNamesExhausted { name: String, taken_name: String },
    #[error("`{url}` rejected the request: {reason}")]
    RemoteRejected { url: String, reason: String },
    #[error("couldn't parse the response of `{url}`: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("couldn't find an api token in the emoji customization page")]
    TokenNotFound,
    #[error("couldn't walk the emoji directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("couldn't read `{path}`: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("uploading `{path}` failed: {source}")]
    Upload {
        path: PathBuf,
        #[source]
        source: Box<Error>,
    },
    #[error("session cookie is not a valid header value")]
    InvalidCookie(#[from] reqwest::header::InvalidHeaderValue),
    #[error("couldn't set up the http request: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Transport { .. } => ErrorKind::TransportFailure,
            Error::Server { .. } => ErrorKind::ServerError,
            Error::Client { .. } => ErrorKind::ClientError,
            Error::InvalidRetryAfter { .. } | Error::RateLimited { .. } => ErrorKind::RateLimited,
            Error::NameTaken(_) => ErrorKind::NameTaken,
            Error::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Error::BothNamesExhausted { .. } => ErrorKind::BothNamesExhausted,
            Error::RemoteRejected { .. } => ErrorKind::RemoteRejected,
            Error::Parse { .. } => ErrorKind::ParseFailure,
            Error::TokenNotFound => ErrorKind::TokenNotFound,
            Error::Walk(_) | Error::Read { .. } => ErrorKind::Filesystem,
            Error::Upload { source, .. } => source.kind(),
            Error::InvalidCookie(_) | Error::HttpClient(_) | Error::InvalidArgument(_) => {
                ErrorKind::InvalidArgument
            }
        }
    }

    /// Whether the backoff loop may try the same request again.
    pub fn is_retryable(&self) -> bool {
        match self {
            // a missing header is treated like any other 4xx
            Error::InvalidRetryAfter { .. } => true,
            Error::Upload { .. } => false,
            _ => matches!(
                self.kind(),
                ErrorKind::TransportFailure
                    | ErrorKind::ServerError
                    | ErrorKind::ClientError
                    | ErrorKind::RemoteRejected
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_taken_is_permanent() {
        let err = Error::NameTaken("fire".into());
        assert_eq!(err.kind(), ErrorKind::NameTaken);
        assert!(!err.is_retryable());
    }

    #[test]
    fn status_errors_are_retryable() {
        let server = Error::Server {
            url: "https://x".into(),
            status: 502,
        };
        let client = Error::Client {
            url: "https://x".into(),
            status: 403,
        };
        assert!(server.is_retryable());
        assert!(client.is_retryable());
    }

    #[test]
    fn rate_limited_outcome_is_final() {
        let err = Error::RateLimited {
            url: "https://x".into(),
            wait: Duration::from_secs(2),
            source: Box::new(Error::Server {
                url: "https://x".into(),
                status: 500,
            }),
        };
        assert_eq!(err.kind(), ErrorKind::RateLimited);
        assert!(!err.is_retryable());
    }

    #[test]
    fn upload_wrapper_exposes_inner_kind() {
        let err = Error::Upload {
            path: PathBuf::from("emoji/fire.png"),
            source: Box::new(Error::BothNamesExhausted {
                name: "fire".into(),
                taken_name: "fire-alt".into(),
            }),
        };
        assert_eq!(err.kind(), ErrorKind::BothNamesExhausted);
    }

    #[test]
    fn parse_failures_are_not_retried() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = Error::Parse {
            url: "https://x".into(),
            source,
        };
        assert_eq!(err.kind(), ErrorKind::ParseFailure);
        assert!(!err.is_retryable());
    }
}
