use std::error::Error as StdError;
use std::fmt;

use strum_macros::{Display, EnumIter, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumIter, EnumString)]
pub enum ErrorKind {
    /// the requested contract is not interface-shaped.
    InvalidContract,
    /// the dispatcher base behind the executor cannot be derived from.
    InvalidBase,
    /// the invocation record does not match any known method.
    MethodResolution,
    Client,
    Network,
    Other,
}

/// the error type shared by every javelin crate. Executor failures travel
/// through dispatch as plain `Error` values, so the kind and message a
/// caller observes are exactly what the executor produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    message: String,
}

impl Error {
    pub fn new<E: fmt::Display>(kind: ErrorKind, err: E) -> Error {
        Error {
            kind,
            message: err.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl StdError for Error {}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::new(ErrorKind::Other, s)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorKind::Other, err)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
