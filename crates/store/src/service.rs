//! Native store collaborator boundary.
//!
//! Everything behind [`StoreService`] is opaque to this crate: SDK
//! calls, network traffic, receipt validation and UI prompts all live
//! on the other side. The trait captures the minimum surface the
//! adapter needs.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use iapbridge_core::PurchaseError;

/// Store-assigned identity of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionRef(Uuid);

impl TransactionRef {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TransactionRef {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for TransactionRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Lifecycle state of a store transaction.
///
/// `Pending` and `Deferred` are not terminal; the observer ignores
/// them. The other three resolve the transaction exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
    Pending,
    Purchased,
    Restored,
    Failed,
    Deferred,
}

/// The payment a transaction settles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub product_id: String,
    pub quantity: u32,
}

/// Store-reported failure attached to a `Failed` transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionFault {
    pub code: i64,
    pub message: String,
}

/// Ephemeral record of a payment's progress, observed but never stored
/// by this layer.
///
/// `original` is set for restored/renewal-style transactions where the
/// wrapper transaction differs from the purchase it re-delivers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub reference: TransactionRef,
    pub state: TransactionState,
    pub payment: Payment,
    pub original: Option<Box<Transaction>>,
    pub fault: Option<TransactionFault>,
    pub occurred_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(state: TransactionState, product_id: impl Into<String>, quantity: u32) -> Self {
        Self {
            reference: TransactionRef::new(),
            state,
            payment: Payment {
                product_id: product_id.into(),
                quantity,
            },
            original: None,
            fault: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_original(mut self, original: Transaction) -> Self {
        self.original = Some(Box::new(original));
        self
    }

    pub fn with_fault(mut self, code: i64, message: impl Into<String>) -> Self {
        self.fault = Some(TransactionFault {
            code,
            message: message.into(),
        });
        self
    }
}

/// Notification pushed from the store to the registered observer.
#[derive(Debug, Clone)]
pub enum TransactionNotice {
    /// A batch of transaction updates, in store-delivery order.
    Updated(Vec<Transaction>),
    /// The whole restore session finished.
    RestoreCompleted,
    /// The whole restore session failed.
    RestoreFailed(PurchaseError),
}

/// Observer callback the adapter registers with the store.
pub type NoticeCallback = Arc<dyn Fn(TransactionNotice) + Send + Sync + 'static>;

/// Token proving an observer registration; held by the adapter so it
/// registers exactly once.
#[derive(Debug)]
pub struct ObserverHandle(u64);

impl ObserverHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Backend-native catalog row, before normalization into `ProductInfo`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreProduct {
    pub product_id: String,
    pub title: String,
    pub description: String,
    pub price: f64,
    pub localized_price: String,
    pub downloadable: bool,
    pub download_content_version: String,
}

/// Result of a catalog query at the native boundary.
#[derive(Debug, Clone, Default)]
pub struct StoreCatalog {
    pub products: Vec<StoreProduct>,
    pub invalid_ids: Vec<String>,
}

pub type QueryCallback = Box<dyn FnOnce(Result<StoreCatalog, PurchaseError>) + Send + 'static>;

/// Minimum operations a native store backend must provide.
pub trait StoreService: Send + Sync {
    /// Static capability of the OS/runtime.
    fn is_iap_supported(&self) -> bool;

    /// Dynamic capability; may depend on device configuration.
    fn can_make_payments(&self) -> bool;

    /// The error code this store reports for a user-cancelled payment.
    fn user_cancelled_code(&self) -> i64 {
        2
    }

    /// Query live catalog metadata for a set of product ids.
    fn query_products(&self, product_ids: BTreeSet<String>, completion: QueryCallback);

    /// Enqueue a payment request with the store's transaction queue.
    fn add_payment(&self, product_id: &str, quantity: u32);

    /// Replay previously completed transactions through the observer.
    fn restore_completed_transactions(&self);

    /// Register the transaction observer. Called at most once per
    /// adapter.
    fn register_transaction_observer(&self, callback: NoticeCallback) -> ObserverHandle;

    /// Acknowledge a resolved transaction. An unacknowledged
    /// transaction is resubmitted by the store on next launch.
    fn finish_transaction(&self, reference: TransactionRef);
}
