//! Client error types.

/// Errors that can occur when using the Xolbor client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error the client has no dedicated variant for.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// Balance too low for the purchase.
    #[error("insufficient balance: balance={balance}, required={required}")]
    InsufficientBalance {
        /// Balance at the time of the attempt.
        balance: i64,
        /// Price of the item.
        required: i64,
    },

    /// The account already owns the item.
    #[error("item already owned: {message}")]
    AlreadyOwned {
        /// Server message.
        message: String,
    },

    /// The item is not in the catalog.
    #[error("item not found: {message}")]
    ItemNotFound {
        /// Server message.
        message: String,
    },

    /// The account does not exist.
    #[error("account not found: {message}")]
    AccountNotFound {
        /// Server message.
        message: String,
    },

    /// The idempotency key was used with a different amount.
    #[error("idempotency conflict: {message}")]
    IdempotencyConflict {
        /// Server message.
        message: String,
    },

    /// Login failed or the token was rejected.
    #[error("unauthorized: {message}")]
    Unauthorized {
        /// Server message.
        message: String,
    },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// Build the typed error for an API error envelope.
    pub(crate) fn from_api(
        code: &str,
        message: String,
        details: Option<&serde_json::Value>,
        status: u16,
    ) -> Self {
        let detail = |name: &str| {
            details
                .and_then(|d| d.get(name))
                .and_then(serde_json::Value::as_i64)
                .unwrap_or(0)
        };

        match code {
            "InsufficientBalance" => Self::InsufficientBalance {
                balance: detail("balance"),
                required: detail("required"),
            },
            "AlreadyOwned" => Self::AlreadyOwned { message },
            "ItemNotFound" => Self::ItemNotFound { message },
            "AccountNotFound" => Self::AccountNotFound { message },
            "IdempotencyConflict" => Self::IdempotencyConflict { message },
            "InvalidCredentials" | "Unauthorized" => Self::Unauthorized { message },
            _ => Self::Api {
                code: code.to_string(),
                message,
                status,
            },
        }
    }

    /// Whether retrying the same request later might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Api { status, .. } => *status == 503,
            _ => false,
        }
    }
}
