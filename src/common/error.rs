//! Error types for the application.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {name}")]
    MissingVar { name: &'static str },

    #[error("Invalid value for '{name}': {message}")]
    InvalidValue { name: &'static str, message: String },

    #[error("Config validation failed: {message}")]
    ValidationError { message: String },
}

/// Errors from the binary game-server query protocols.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("Failed to reach {host}:{port}: {source}")]
    ConnectFailed {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("Query timed out")]
    Timeout,

    #[error("Response too short: need {needed} more bytes")]
    Truncated { needed: usize },

    #[error("Malformed response: {message}")]
    Malformed { message: String },

    #[error("Unexpected response type: 0x{kind:02X}")]
    UnexpectedResponse { kind: u8 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the persistent stores (identities, response cache).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access store file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to serialize store data: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors surfaced by the stats gateway.
///
/// Every variant maps to a user-facing reply via [`StatsError::user_reply`];
/// the raw detail only ever goes to the log.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("Unknown game: {name}")]
    UnknownGame { name: String },

    #[error("{what} is not configured (set {hint})")]
    NotConfigured { what: &'static str, hint: &'static str },

    #[error("No {field} identifier registered")]
    MissingIdentifier { field: &'static str, command: &'static str },

    #[error("Server query failed: {0}")]
    Query(#[from] QueryError),

    #[error("API returned HTTP {status}")]
    Http { status: u16 },

    #[error("API request timed out")]
    Timeout,

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Malformed API response: {message}")]
    Malformed { message: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl StatsError {
    /// The reply shown in chat for this error. Never exposes raw error text.
    pub fn user_reply(&self) -> String {
        match self {
            Self::UnknownGame { name } => format!(
                "Unsupported game `{}`. Try `minecraft`, `ark`, `satisfactory`, `lethal`, \
                 `smite1`, `smite2`, `rocketleague`, `coc`, `brawl` or `royale`.",
                name
            ),
            Self::NotConfigured { what, hint } => {
                format!("{} is not configured on this bot (missing `{}`).", what, hint)
            }
            Self::MissingIdentifier { field, command } => format!(
                "No {field} identifier registered. Save one with `!id {field} <value>` \
                 or pass it as an argument: `{command}`.",
                field = field,
                command = command
            ),
            Self::Http { status: 401 } | Self::Http { status: 403 } => {
                "The stats API refused access (401/403). The bot's API key may be invalid."
                    .to_string()
            }
            Self::Http { status: 404 } => {
                "Profile not found. Check the identifier, or try `platform:name`.".to_string()
            }
            Self::Http { status: 429 } => {
                "The stats API is rate limiting us (429). Try again in a moment.".to_string()
            }
            Self::Query(_)
            | Self::Http { .. }
            | Self::Timeout
            | Self::Network { .. }
            | Self::Malformed { .. } => {
                "Stats are unavailable right now. Try again later.".to_string()
            }
            Self::Store(_) => "Internal error while reading saved identifiers.".to_string(),
        }
    }
}

impl From<reqwest::Error> for StatsError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else if let Some(status) = e.status() {
            Self::Http {
                status: status.as_u16(),
            }
        } else {
            Self::Network {
                message: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_errors_map_to_unavailable_reply() {
        for status in [500u16, 502, 503] {
            let reply = StatsError::Http { status }.user_reply();
            assert!(reply.contains("unavailable"), "got: {}", reply);
        }
    }

    #[test]
    fn test_timeout_maps_to_unavailable_reply() {
        let reply = StatsError::Timeout.user_reply();
        assert!(reply.contains("unavailable"));
    }

    #[test]
    fn test_user_reply_never_contains_raw_detail() {
        let err = StatsError::Network {
            message: "connection reset by peer (os error 104)".to_string(),
        };
        assert!(!err.user_reply().contains("os error"));
    }

    #[test]
    fn test_missing_identifier_mentions_id_command() {
        let err = StatsError::MissingIdentifier {
            field: "steam",
            command: "!stats smite2 <steam>",
        };
        let reply = err.user_reply();
        assert!(reply.contains("!id steam"));
        assert!(reply.contains("!stats smite2"));
    }
}
