use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SettingsError {
    /// The setting has no global default, which means the caller asked for
    /// something that doesn't exist.
    #[error("unknown setting `{0}`")]
    UnknownSetting(String),
    /// Settings can only be changed inside a guild.
    #[error("guild id is not supplied")]
    MissingGuildId,
    #[error("setting `{name}` has an unexpected value: {source}")]
    InvalidValue {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl SettingsError {
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Backend(err) => err.is_retryable(),
            _ => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("backend didn't respond within {0:?}")]
    Timeout(Duration),
    #[error("setting `{name}` is not a list")]
    NotAList { name: String },
    #[error("couldn't decode guild document: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BackendError {
    /// Whether the same call could succeed later, connection trouble and
    /// timeouts mostly.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) => true,
            Self::Database(err) => matches!(
                err,
                sqlx::Error::Io(_)
                    | sqlx::Error::PoolTimedOut
                    | sqlx::Error::PoolClosed
                    | sqlx::Error::WorkerCrashed
            ),
            Self::NotAList { .. } | Self::Decode(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_test() {
        assert!(BackendError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(BackendError::Database(sqlx::Error::PoolTimedOut).is_retryable());
        assert!(!BackendError::Database(sqlx::Error::RowNotFound).is_retryable());
        assert!(!BackendError::NotAList {
            name: "muted_users".into()
        }
        .is_retryable());

        assert!(SettingsError::Backend(BackendError::Timeout(Duration::from_secs(1))).is_retryable());
        assert!(!SettingsError::MissingGuildId.is_retryable());
        assert!(!SettingsError::UnknownSetting("foo".into()).is_retryable());
    }
}
