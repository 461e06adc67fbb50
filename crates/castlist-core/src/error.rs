use crate::{
    access::PlatformError, config::ConfigError, store::StoreError, token::MalformedToken,
    token::TokenEncodeError,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Subsystem errors convert into this type at module boundaries.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    /// The variant (if present) must correspond to `origin`.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    /// Construct an InternalError without structured detail.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    /// Construct a config-origin unsupported error.
    pub(crate) fn config_unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Config, message)
    }

    #[must_use]
    pub const fn is_malformed_token(&self) -> bool {
        matches!(self.detail, Some(ErrorDetail::MalformedToken(_)))
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

impl From<MalformedToken> for InternalError {
    fn from(err: MalformedToken) -> Self {
        Self {
            class: ErrorClass::Malformed,
            origin: ErrorOrigin::Token,
            message: err.to_string(),
            detail: Some(ErrorDetail::MalformedToken(err)),
        }
    }
}

impl From<TokenEncodeError> for InternalError {
    fn from(err: TokenEncodeError) -> Self {
        Self::new(ErrorClass::Unsupported, ErrorOrigin::Token, err.to_string())
    }
}

impl From<StoreError> for InternalError {
    fn from(err: StoreError) -> Self {
        Self {
            class: err.class(),
            origin: ErrorOrigin::Store,
            message: err.to_string(),
            detail: Some(ErrorDetail::Store(err)),
        }
    }
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::config_unsupported(err.to_string())
    }
}

impl From<PlatformError> for InternalError {
    fn from(err: PlatformError) -> Self {
        Self::new(ErrorClass::Internal, ErrorOrigin::Platform, err.to_string())
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    MalformedToken(MalformedToken),

    #[error("{0}")]
    Store(StoreError),
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorClass {
    Corruption,
    NotFound,
    Internal,
    Conflict,
    Unsupported,
    Malformed,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Corruption => "corruption",
            Self::NotFound => "not_found",
            Self::Internal => "internal",
            Self::Conflict => "conflict",
            Self::Unsupported => "unsupported",
            Self::Malformed => "malformed",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorOrigin {
    Token,
    Store,
    Platform,
    Config,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Token => "token",
            Self::Store => "store",
            Self::Platform => "platform",
            Self::Config => "config",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_token_keeps_structured_detail() {
        let err = InternalError::from(MalformedToken::EmptyRosterId);

        assert!(err.is_malformed_token());
        assert_eq!(err.class, ErrorClass::Malformed);
        assert_eq!(err.origin, ErrorOrigin::Token);
    }

    #[test]
    fn platform_errors_keep_platform_origin() {
        let err = InternalError::from(PlatformError::Timeout { after_ms: 10_000 });

        assert_eq!(err.class, ErrorClass::Internal);
        assert_eq!(err.origin, ErrorOrigin::Platform);
        assert_eq!(
            err.display_with_class(),
            "platform:internal: platform fetch timed out after 10000 ms"
        );
    }

    #[test]
    fn store_errors_classify_by_variant() {
        let corrupt = InternalError::from(StoreError::Corrupt {
            message: "bad json".to_string(),
        });
        assert_eq!(corrupt.class, ErrorClass::Corruption);

        let missing = InternalError::from(StoreError::NotFound {
            key: "roster_1_custom".to_string(),
        });
        assert!(missing.is_not_found());
        assert_eq!(
            missing.display_with_class(),
            "store:not_found: roster not found: roster_1_custom"
        );
    }
}
