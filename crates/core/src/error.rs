//! Unified purchase error model.

use thiserror::Error;

/// Result type for the synchronous, deterministic half of the API.
pub type IapResult<T> = Result<T, IapError>;

/// Deterministic, caller-local failure.
///
/// These are the precondition violations that fail fast at the call site.
/// Anything that depends on completion of backend work is reported through
/// the asynchronous failure events as a [`PurchaseError`] instead, never
/// as an `IapError`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IapError {
    /// Malformed caller input (empty id list, blank product id,
    /// non-positive quantity).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation attempted out of sequence (unknown product id,
    /// initializing an empty registry, payments disabled).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The platform/OS has no in-app-purchase capability at all.
    #[error("in-app purchases are not supported on this platform")]
    Unsupported,
}

impl IapError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }
}

/// Classification of a backend-sourced failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PurchaseErrorKind {
    /// Generic store failure (catalog fetch, payment, restore).
    Failed,
    /// The user explicitly cancelled the payment.
    Cancelled,
}

/// Failure reported by a store backend.
///
/// Wraps any error the store surfaces during catalog fetch, payment or
/// restore. Always carries the backend-native code (`0` when none
/// applies) and optionally the lower-level cause. Immutable once built;
/// delivered only through the `*Failed` events, never thrown.
#[derive(Debug, Error)]
#[error("{message} (code {code})")]
pub struct PurchaseError {
    message: String,
    code: i64,
    kind: PurchaseErrorKind,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl PurchaseError {
    /// Backend code meaning "unknown / local failure".
    pub const UNKNOWN_CODE: i64 = 0;

    pub fn new(message: impl Into<String>, code: i64) -> Self {
        Self {
            message: message.into(),
            code,
            kind: PurchaseErrorKind::Failed,
            source: None,
        }
    }

    /// A purely local failure with no backend code.
    pub fn local(message: impl Into<String>) -> Self {
        Self::new(message, Self::UNKNOWN_CODE)
    }

    /// A user-cancellation failure, carrying the platform's reserved
    /// cancellation code.
    pub fn cancelled(message: impl Into<String>, code: i64) -> Self {
        Self {
            message: message.into(),
            code,
            kind: PurchaseErrorKind::Cancelled,
            source: None,
        }
    }

    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> i64 {
        self.code
    }

    pub fn kind(&self) -> PurchaseErrorKind {
        self.kind
    }

    pub fn is_cancelled(&self) -> bool {
        self.kind == PurchaseErrorKind::Cancelled
    }
}

impl Clone for PurchaseError {
    fn clone(&self) -> Self {
        // The boxed cause is not clonable; keep its text instead.
        Self {
            message: self.message.clone(),
            code: self.code,
            kind: self.kind,
            source: self
                .source
                .as_ref()
                .map(|s| Box::new(SourceText(s.to_string())) as _),
        }
    }
}

#[derive(Debug, Error)]
#[error("{0}")]
struct SourceText(String);
