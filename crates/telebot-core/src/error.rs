use std::fmt;
use thiserror::Error;

/// Why a network call failed before any HTTP response arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkCause {
    /// DNS resolution failed for the API host.
    HostNotFound,
    /// The host resolved but the connection could not be established.
    Connect,
    /// The client-side request timeout elapsed.
    Timeout,
    /// Anything else reported by the HTTP stack.
    Other,
}

impl fmt::Display for NetworkCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::HostNotFound => "host not found",
            Self::Connect => "connect failed",
            Self::Timeout => "timed out",
            Self::Other => "transport failure",
        };
        f.write_str(s)
    }
}

/// Top-level error type for telebot.
#[derive(Debug, Error)]
pub enum BotError {
    /// Transport-level failure, including DNS errors.
    #[error("network error ({cause}): {message}")]
    Network { cause: NetworkCause, message: String },

    /// A body that claimed to be JSON could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// The API answered 401: the bot token is not valid.
    #[error("invalid bot token (401 Unauthorized)")]
    InvalidToken,

    /// The API answered 409: another consumer is already polling this token.
    #[error("another instance is already consuming updates for this token (409 Conflict)")]
    DuplicateInstance,

    /// The API answered 502.
    #[error("upstream gateway error (502 Bad Gateway)")]
    Gateway,

    /// Local upload precondition failed; no request was made.
    #[error("invalid file type: expected {expected}, got {actual}")]
    InvalidFileType { expected: String, actual: String },

    /// The API answered `ok: false`, or with a body that is not an API reply.
    #[error("request rejected ({}): {description}", error_code.map_or_else(|| "no code".to_string(), |c| c.to_string()))]
    RemoteRejection {
        error_code: Option<i64>,
        description: String,
        response: serde_json::Value,
    },

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Local filesystem error while reading an upload or writing a download.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BotError {
    /// Build a network error from a cause and any displayable source.
    pub fn network(cause: NetworkCause, message: impl fmt::Display) -> Self {
        Self::Network {
            cause,
            message: message.to_string(),
        }
    }

    /// True for the one failure the retry policy treats as transient.
    pub fn is_host_not_found(&self) -> bool {
        matches!(
            self,
            Self::Network {
                cause: NetworkCause::HostNotFound,
                ..
            }
        )
    }

    /// True when a client-side timeout expired (a normal long-poll expiry).
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::Network {
                cause: NetworkCause::Timeout,
                ..
            }
        )
    }
}
