use thiserror::Error;

/// Numeric status codes attached to errors for the HTTP layer.
pub mod status {
    pub const STATUS_ERROR_GENERIC: i32 = 1000;
    pub const STATUS_ERROR_ALREADY_EXIST: i32 = 1103;
    pub const STATUS_ERROR_BAD_NAME: i32 = 1104;
    pub const ILLEGAL_OPERATION: i32 = 1108;
    pub const ILLEGAL_PARAMETER: i32 = 1110;
    pub const NOT_FOUND: i32 = 1111;
    pub const AUTHENTICATION_FAILED: i32 = 1112;
}

/// Every failure the data layer surfaces to its callers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Generic(String),
    #[error("{0}")]
    BadName(String),
    #[error("{0}")]
    AlreadyExist(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    IllegalParameter(String),
    #[error("{0}")]
    IllegalOperation(String),
    #[error("{0}")]
    AuthenticationFailed(String),
    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error(transparent)]
    Crypto(#[from] crate::helpers::security::CryptoError),
}

pub type Result<T> = std::result::Result<T, ApiError>;

impl From<crate::connectors::docker::DockerError> for ApiError {
    fn from(err: crate::connectors::docker::DockerError) -> Self {
        use crate::connectors::docker::DockerError;
        match err {
            DockerError::Unauthorized(msg) => Self::AuthenticationFailed(msg),
            other => Self::Generic(other.to_string()),
        }
    }
}

impl ApiError {
    pub fn generic(msg: impl Into<String>) -> Self {
        Self::Generic(msg.into())
    }

    pub fn bad_name(msg: impl Into<String>) -> Self {
        Self::BadName(msg.into())
    }

    pub fn already_exist(msg: impl Into<String>) -> Self {
        Self::AlreadyExist(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn illegal_parameter(msg: impl Into<String>) -> Self {
        Self::IllegalParameter(msg.into())
    }

    pub fn illegal_operation(msg: impl Into<String>) -> Self {
        Self::IllegalOperation(msg.into())
    }

    pub fn authentication_failed(msg: impl Into<String>) -> Self {
        Self::AuthenticationFailed(msg.into())
    }

    pub fn status_code(&self) -> i32 {
        match self {
            Self::BadName(_) => status::STATUS_ERROR_BAD_NAME,
            Self::AlreadyExist(_) => status::STATUS_ERROR_ALREADY_EXIST,
            Self::NotFound(_) => status::NOT_FOUND,
            Self::IllegalParameter(_) => status::ILLEGAL_PARAMETER,
            Self::IllegalOperation(_) => status::ILLEGAL_OPERATION,
            Self::AuthenticationFailed(_) => status::AUTHENTICATION_FAILED,
            Self::Generic(_) | Self::Storage(_) | Self::Serialization(_) | Self::Crypto(_) => {
                status::STATUS_ERROR_GENERIC
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(ApiError::bad_name("x").status_code(), 1104);
        assert_eq!(ApiError::already_exist("x").status_code(), 1103);
        assert_eq!(ApiError::not_found("x").status_code(), 1111);
        assert_eq!(ApiError::illegal_parameter("x").status_code(), 1110);
        assert_eq!(ApiError::illegal_operation("x").status_code(), 1108);
        assert_eq!(ApiError::generic("x").status_code(), 1000);
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        assert_eq!(ApiError::from(io).status_code(), 1000);
    }

    #[test]
    fn test_message_is_kept() {
        let err = ApiError::illegal_operation("Cannot edit a self-hosted registry");
        assert_eq!(err.to_string(), "Cannot edit a self-hosted registry");
    }
}
