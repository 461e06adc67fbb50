use castlist_core::{
    config::ConfigError,
    error::{ErrorClass, ErrorDetail, ErrorOrigin as CoreErrorOrigin, InternalError},
    store::StoreError,
    token::{MalformedToken, TokenEncodeError},
};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// Short, non-technical sentence safe to show an end user.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self.kind {
            ErrorKind::MalformedToken => "invalid navigation request, please re-open the roster",
            ErrorKind::EntityNotResolvable | ErrorKind::Store(StoreErrorKind::NotFound) => {
                "that roster could not be found"
            }
            ErrorKind::Store(_) => "roster data is unavailable right now, please try again",
            ErrorKind::Config => "castlist is not configured correctly",
            ErrorKind::Internal => "something went wrong, please try again",
        }
    }

    #[must_use]
    pub const fn is_malformed_token(&self) -> bool {
        matches!(self.kind, ErrorKind::MalformedToken)
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        let kind = match (&err.detail, err.origin) {
            (Some(ErrorDetail::MalformedToken(_)), _) => ErrorKind::MalformedToken,
            (_, CoreErrorOrigin::Store) => ErrorKind::Store(err.class.into()),
            (_, CoreErrorOrigin::Config) => ErrorKind::Config,
            _ => ErrorKind::Internal,
        };

        Self::new(kind, err.origin.into(), err.message)
    }
}

impl From<MalformedToken> for Error {
    fn from(err: MalformedToken) -> Self {
        InternalError::from(err).into()
    }
}

impl From<TokenEncodeError> for Error {
    fn from(err: TokenEncodeError) -> Self {
        InternalError::from(err).into()
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        InternalError::from(err).into()
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        InternalError::from(err).into()
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// Navigation token failed structural decoding.
    MalformedToken,

    /// Reserved for a strict resolution mode; resolution is currently total.
    EntityNotResolvable,

    Store(StoreErrorKind),

    Config,

    /// The caller cannot remediate this.
    Internal,
}

///
/// StoreErrorKind
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum StoreErrorKind {
    NotFound,
    Corrupted,
    Conflict,
    Invalid,
    Unavailable,
}

impl From<ErrorClass> for StoreErrorKind {
    fn from(class: ErrorClass) -> Self {
        match class {
            ErrorClass::NotFound => Self::NotFound,
            ErrorClass::Corruption => Self::Corrupted,
            ErrorClass::Conflict => Self::Conflict,
            ErrorClass::Unsupported | ErrorClass::Malformed => Self::Invalid,
            ErrorClass::Internal => Self::Unavailable,
        }
    }
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Token,
    Store,
    Platform,
    Config,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Token => Self::Token,
            CoreErrorOrigin::Store => Self::Store,
            CoreErrorOrigin::Platform => Self::Platform,
            CoreErrorOrigin::Config => Self::Config,
        }
    }
}

///
/// TESTS
///
