use backtrace::Backtrace;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

use parking_lot::RwLock;

/// Error kinds for polystore operations.
///
/// Each kind describes one category of failure, enabling precise error
/// handling. Range and state errors are programmer errors and propagate
/// immediately; commit conflicts are reported as a boolean from
/// `Transaction::commit` rather than through this taxonomy.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// A range was constructed with `lower` ordering after `upper`
    InvalidRange,
    /// An operation was attempted on a terminal (committed/aborted) transaction
    InvalidState,
    /// A query targeted an index that is not defined on the store
    UnknownIndex,
    /// An optimistic concurrency conflict was detected
    Conflict,
    /// Error from a storage backend, not further classified by the abstraction
    BackendError,
    /// Error encoding or decoding keys or values
    EncodingError,
    /// The store has already been closed
    StoreClosed,
    /// The operation is not valid in the current context
    InvalidOperation,
    /// Generic IO error
    IOError,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::InvalidRange => write!(f, "Invalid range"),
            ErrorKind::InvalidState => write!(f, "Invalid state"),
            ErrorKind::UnknownIndex => write!(f, "Unknown index"),
            ErrorKind::Conflict => write!(f, "Conflict"),
            ErrorKind::BackendError => write!(f, "Backend error"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::StoreClosed => write!(f, "Store closed"),
            ErrorKind::InvalidOperation => write!(f, "Invalid operation"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Custom polystore error type.
///
/// `KvError` encapsulates the error message, kind, and optional cause. It
/// supports error chaining and captures a backtrace at construction time for
/// debugging.
///
/// # Type alias
///
/// The `KvResult<T>` type alias is equivalent to `Result<T, KvError>` and is
/// used throughout the codebase for operations that can fail.
#[derive(Clone)]
pub struct KvError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<KvError>>,
    backtrace: Arc<RwLock<Backtrace>>,
}

impl KvError {
    /// Creates a new `KvError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        KvError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(RwLock::new(Backtrace::new())),
        }
    }

    /// Creates a new `KvError` with a cause error.
    ///
    /// This creates an error chain where the cause error is preserved for
    /// debugging.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: KvError) -> Self {
        KvError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(RwLock::new(Backtrace::new())),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&Box<KvError>> {
        self.cause.as_ref()
    }
}

impl Display for KvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for KvError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{}\nCaused by: {:?}", self.message, cause),
            None => write!(f, "{}\n{:?}", self.message, self.backtrace.read()),
        }
    }
}

impl Error for KvError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for polystore operations.
///
/// `KvResult<T>` is shorthand for `Result<T, KvError>`. All fallible
/// operations in this crate return this type.
pub type KvResult<T> = Result<T, KvError>;

// From trait implementations for automatic error conversion
impl From<std::io::Error> for KvError {
    fn from(err: std::io::Error) -> Self {
        KvError::new(&format!("IO error: {}", err), ErrorKind::IOError)
    }
}

impl From<std::string::FromUtf8Error> for KvError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        KvError::new(
            &format!("UTF-8 encoding error: {}", err),
            ErrorKind::EncodingError,
        )
    }
}

impl From<String> for KvError {
    fn from(msg: String) -> Self {
        KvError::new(&msg, ErrorKind::InternalError)
    }
}

impl From<&str> for KvError {
    fn from(msg: &str) -> Self {
        KvError::new(msg, ErrorKind::InternalError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_error_new_creates_error() {
        let error = KvError::new("An error occurred", ErrorKind::BackendError);
        assert_eq!(error.message(), "An error occurred");
        assert_eq!(error.kind(), &ErrorKind::BackendError);
        assert!(error.cause().is_none());
    }

    #[test]
    fn kv_error_new_with_cause_creates_error() {
        let cause = KvError::new("Disk failed", ErrorKind::IOError);
        let error = KvError::new_with_cause("Commit failed", ErrorKind::BackendError, cause);
        assert_eq!(error.message(), "Commit failed");
        assert_eq!(error.kind(), &ErrorKind::BackendError);
        assert!(error.cause().is_some());
    }

    #[test]
    fn kv_error_display_formats_correctly() {
        let error = KvError::new("An error occurred", ErrorKind::IOError);
        assert_eq!(format!("{}", error), "An error occurred");
    }

    #[test]
    fn kv_error_debug_formats_with_cause() {
        let cause = KvError::new("root", ErrorKind::IOError);
        let error = KvError::new_with_cause("outer", ErrorKind::BackendError, cause);
        let formatted = format!("{:?}", error);
        assert!(formatted.contains("outer"));
        assert!(formatted.contains("Caused by:"));
    }

    #[test]
    fn kv_error_source_returns_cause() {
        let cause = KvError::new("root", ErrorKind::IOError);
        let error = KvError::new_with_cause("outer", ErrorKind::BackendError, cause);
        assert!(error.source().is_some());

        let error = KvError::new("no cause", ErrorKind::IOError);
        assert!(error.source().is_none());
    }

    #[test]
    fn test_range_and_state_errors() {
        let invalid_range = KvError::new("lower after upper", ErrorKind::InvalidRange);
        assert_eq!(invalid_range.kind(), &ErrorKind::InvalidRange);

        let invalid_state = KvError::new("transaction is terminal", ErrorKind::InvalidState);
        assert_eq!(invalid_state.kind(), &ErrorKind::InvalidState);
    }

    #[test]
    fn test_index_and_conflict_errors() {
        let unknown = KvError::new("no such index", ErrorKind::UnknownIndex);
        assert_eq!(unknown.kind(), &ErrorKind::UnknownIndex);

        let conflict = KvError::new("write-write conflict", ErrorKind::Conflict);
        assert_eq!(conflict.kind(), &ErrorKind::Conflict);
    }

    #[test]
    fn test_backend_and_store_errors() {
        let backend = KvError::new("engine failure", ErrorKind::BackendError);
        assert_eq!(backend.kind(), &ErrorKind::BackendError);

        let closed = KvError::new("store already closed", ErrorKind::StoreClosed);
        assert_eq!(closed.kind(), &ErrorKind::StoreClosed);

        let encoding = KvError::new("bad key bytes", ErrorKind::EncodingError);
        assert_eq!(encoding.kind(), &ErrorKind::EncodingError);
    }

    #[test]
    fn test_error_chain_with_different_kinds() {
        let root_cause = KvError::new("disk gone", ErrorKind::IOError);
        let mid_level = KvError::new_with_cause("flush failed", ErrorKind::BackendError, root_cause);
        let top_level =
            KvError::new_with_cause("commit aborted", ErrorKind::InternalError, mid_level);

        assert_eq!(top_level.kind(), &ErrorKind::InternalError);
        if let Some(cause) = top_level.cause() {
            assert_eq!(cause.kind(), &ErrorKind::BackendError);
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::other("unknown io error");
        let kv_err: KvError = io_err.into();
        assert_eq!(kv_err.kind(), &ErrorKind::IOError);
        assert!(kv_err.message().contains("IO error"));
    }

    #[test]
    fn test_from_utf8_error() {
        let utf8_err = String::from_utf8(vec![0xFF, 0xFE]).unwrap_err();
        let kv_err: KvError = utf8_err.into();
        assert_eq!(kv_err.kind(), &ErrorKind::EncodingError);
    }

    #[test]
    fn test_from_string_and_str() {
        let err: KvError = String::from("string error").into();
        assert_eq!(err.kind(), &ErrorKind::InternalError);
        assert_eq!(err.message(), "string error");

        let err: KvError = "str error".into();
        assert_eq!(err.kind(), &ErrorKind::InternalError);
    }

    #[test]
    fn test_question_mark_operator_with_from() {
        fn read_op() -> KvResult<String> {
            let bytes = vec![0xFF];
            let s = String::from_utf8(bytes)?;
            Ok(s)
        }

        let result = read_op();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), &ErrorKind::EncodingError);
    }

    #[test]
    fn test_error_kind_display() {
        assert_eq!(format!("{}", ErrorKind::InvalidRange), "Invalid range");
        assert_eq!(format!("{}", ErrorKind::UnknownIndex), "Unknown index");
        assert_eq!(format!("{}", ErrorKind::Conflict), "Conflict");
    }
}
